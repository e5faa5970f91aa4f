//! HTTP surface: health, auth session routes, and the billing webhook.
//!
//! Handlers are thin: extract, delegate to a command handler or port, map
//! the outcome to a status code. No business rules live here.

pub mod auth;
pub mod billing;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::application::handlers::auth::RefreshSessionHandler;
use crate::application::handlers::billing::ReconcileWebhookHandler;
use crate::config::ServerConfig;
use crate::domain::auth::TokenService;
use crate::ports::DataProvider;

/// Shared application state, cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn DataProvider>,
    pub tokens: Arc<TokenService>,
    /// Absent when the webhook secret is not configured; the webhook route
    /// then answers 503 instead of failing at startup.
    pub reconciler: Option<Arc<ReconcileWebhookHandler>>,
    pub refresh: Arc<RefreshSessionHandler>,
}

/// Wire shape for every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Assemble the complete application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::auth_routes())
        .nest("/api/webhooks", billing::webhook_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
        .with_state(state)
}

/// Build the CORS layer from the configured origins.
///
/// With no origins configured the layer stays permissive for local
/// development; once origins are set, only those origins are allowed.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// GET /health
async fn health(State(_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}
