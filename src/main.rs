//! Process bootstrap: load config, wire the provider and handlers, serve.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agenthub::adapters::build_provider;
use agenthub::adapters::http::{router, AppState};
use agenthub::application::handlers::auth::RefreshSessionHandler;
use agenthub::application::handlers::billing::ReconcileWebhookHandler;
use agenthub::config::AppConfig;
use agenthub::domain::auth::TokenService;
use agenthub::domain::billing::RetryPolicy;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    let tokens = Arc::new(TokenService::new(&config.auth));
    let provider = build_provider(&config, tokens.clone()).await?;

    let reconciler = Arc::new(ReconcileWebhookHandler::new(
        config.billing.webhook_secret.expose_secret().clone(),
        provider.profiles(),
        provider.subscriptions(),
        RetryPolicy::default(),
    ));
    let refresh = Arc::new(RefreshSessionHandler::new(
        tokens.clone(),
        provider.profiles(),
    ));

    let state = AppState {
        provider,
        tokens,
        reconciler: Some(reconciler),
        refresh,
    };

    let addr = config.server.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "agenthub listening");
    axum::serve(listener, router(state, &config.server)).await?;

    Ok(())
}
