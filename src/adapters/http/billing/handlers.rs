//! Billing webhook handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::{AppState, ErrorResponse};
use crate::domain::billing::WebhookError;

/// POST /api/webhooks/billing
///
/// The body must reach the verifier byte for byte as sent, so it is taken
/// as raw `Bytes`, never as `Json`.
pub async fn handle_billing_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(reconciler) = state.reconciler.as_ref() else {
        return webhook_error(WebhookError::Unconfigured);
    };

    let signature = headers.get("Signature").and_then(|v| v.to_str().ok());

    match reconciler.handle(&body, signature).await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({ "received": true })),
        )
            .into_response(),
        Err(err) => webhook_error(err),
    }
}

fn webhook_error(err: WebhookError) -> Response {
    let code = match &err {
        WebhookError::MissingSignature
        | WebhookError::InvalidSignature
        | WebhookError::MalformedSignatureHeader(_)
        | WebhookError::TimestampOutOfRange => "INVALID_SIGNATURE",
        WebhookError::ParseError(_) | WebhookError::MissingField(_) => "MALFORMED_EVENT",
        WebhookError::UnknownCustomer(_) => "UNKNOWN_CUSTOMER",
        WebhookError::Lookup(_) | WebhookError::Persistence { .. } => "RECONCILIATION_FAILED",
        WebhookError::Unconfigured => "WEBHOOK_UNCONFIGURED",
    };
    (err.status_code(), Json(ErrorResponse::new(code, err.to_string()))).into_response()
}
