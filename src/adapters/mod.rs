//! Adapters - persistence providers and the HTTP surface.

pub mod document;
pub mod http;
pub mod relational;

use std::sync::Arc;

use tracing::info;

use crate::config::{AppConfig, ConfigError, StoreBackend};
use crate::domain::auth::TokenService;
use crate::ports::DataProvider;

use document::DocumentProvider;
use relational::RelationalProvider;

/// Build the persistence provider named by configuration.
///
/// Called exactly once at startup; every failure mode surfaces here, never
/// at first use.
pub async fn build_provider(
    config: &AppConfig,
    tokens: Arc<TokenService>,
) -> Result<Arc<dyn DataProvider>, ConfigError> {
    match config.store.backend {
        StoreBackend::Relational => {
            let section = config.store.relational.as_ref().ok_or_else(|| {
                ConfigError::StoreInitFailed("relational store section missing".to_string())
            })?;
            info!(backend = "relational", "initializing persistence provider");
            Ok(Arc::new(RelationalProvider::new(section)))
        }
        StoreBackend::Document => {
            let section = config.store.document.as_ref().ok_or_else(|| {
                ConfigError::StoreInitFailed("document store section missing".to_string())
            })?;
            info!(backend = "document", "initializing persistence provider");
            let provider = DocumentProvider::connect(section, tokens)
                .await
                .map_err(|e| ConfigError::StoreInitFailed(e.to_string()))?;
            Ok(Arc::new(provider))
        }
    }
}
