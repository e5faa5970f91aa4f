mod reconcile_webhook;

pub use reconcile_webhook::{build_subscription_record, Outcome, ReconcileWebhookHandler};
