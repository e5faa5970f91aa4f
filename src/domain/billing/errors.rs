//! Webhook error types for billing event reconciliation.
//!
//! Every failure in the pipeline maps to exactly one HTTP status so the
//! sender's retry machinery sees a consistent contract: 400 for anything
//! wrong with the signature, 404 for a customer we cannot resolve, 422 for
//! a payload we will never be able to process, 5xx only where a retry can
//! actually help.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::StoreError;

/// Errors that occur during webhook reconciliation.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Request carried no signature header at all.
    #[error("Missing signature header")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// The signature header itself could not be parsed.
    #[error("Malformed signature header: {0}")]
    MalformedSignatureHeader(String),

    /// Webhook timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Failed to parse the signed payload after verification succeeded.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Verified payload is well-formed but missing a required field.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No profile matches the event's billing customer id.
    #[error("Unknown billing customer: {0}")]
    UnknownCustomer(String),

    /// Profile lookup failed before the upsert was attempted.
    #[error("Customer lookup failed: {0}")]
    Lookup(#[source] StoreError),

    /// Subscription upsert still failing after the retry budget ran out.
    #[error("Persistence failed after {attempts} attempts: {source}")]
    Persistence {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    /// Webhook secret or data provider not configured on this deployment.
    #[error("Billing reconciliation is not configured")]
    Unconfigured,
}

impl WebhookError {
    /// Returns true if the sender should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Lookup(_) | WebhookError::Persistence { .. }
        )
    }

    /// Maps the error to the HTTP status the webhook endpoint returns.
    ///
    /// The status drives the sender's retry behavior: 4xx acknowledges the
    /// delivery as permanently failed, 5xx invites a redelivery.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Signature gate: missing, unparseable, stale, or wrong
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::MalformedSignatureHeader(_)
            | WebhookError::TimestampOutOfRange => StatusCode::BAD_REQUEST,

            // The payload will never parse or validate on redelivery
            WebhookError::ParseError(_) | WebhookError::MissingField(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            WebhookError::UnknownCustomer(_) => StatusCode::NOT_FOUND,

            // Transient store failures, redelivery can succeed
            WebhookError::Lookup(_) | WebhookError::Persistence { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            WebhookError::Unconfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}
