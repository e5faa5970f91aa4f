//! Billing webhook domain: event shapes, signature verification, error
//! taxonomy, and the bounded-retry policy consumed by the reconciler.

mod errors;
mod event;
mod retry;
mod verifier;

pub use errors::WebhookError;
pub use event::{
    BillingEvent, BillingEventData, BillingEventType, EventMetadata, SubscriptionEventObject,
};
pub use retry::{run_with_retry, RetryPolicy};
pub use verifier::{SignatureHeader, WebhookVerifier};

#[cfg(test)]
pub use verifier::compute_test_signature;
