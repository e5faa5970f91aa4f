//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Store initialization failed: {0}")]
    StoreInitFailed(String),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid bind host (must be an IP address)")]
    InvalidHost,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid store endpoint URL format")]
    InvalidStoreEndpoint,

    #[error("Invalid document store URI format")]
    InvalidDocumentUri,

    #[error("Store endpoint must use HTTPS in production")]
    EndpointMustBeHttps,

    #[error("Token signing secret too short (minimum 32 bytes)")]
    SigningSecretTooShort,

    #[error("Access and refresh secrets must differ")]
    SigningSecretsIdentical,

    #[error("Token lifetime must be non-zero")]
    InvalidTokenLifetime,

    #[error("Invalid webhook secret format")]
    InvalidWebhookSecret,
}
