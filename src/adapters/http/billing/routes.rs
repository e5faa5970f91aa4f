//! Webhook routes.
//!
//! Mounted under `/api/webhooks`. No session auth: the payload signature is
//! the only credential.

use axum::routing::post;
use axum::Router;

use super::handlers::handle_billing_webhook;
use crate::adapters::http::AppState;

/// - `POST /billing` - billing provider event delivery
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/billing", post(handle_billing_webhook))
}
