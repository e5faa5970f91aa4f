//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `AGENTHUB_` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use agenthub::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {}", config.server.socket_addr());
//! ```

mod auth;
mod billing;
mod error;
mod server;
mod store;

pub use auth::AuthConfig;
pub use billing::BillingConfig;
pub use error::{ConfigError, ValidationError};
pub use server::{Environment, ServerConfig};
pub use store::{DocumentStoreConfig, RelationalStoreConfig, StoreBackend, StoreConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Contains all configuration sections for the AgentHub backend.
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment)
    #[serde(default)]
    pub server: ServerConfig,

    /// Backing store configuration (provider selection + connection parameters)
    pub store: StoreConfig,

    /// Token service configuration (signing secrets, lifetimes)
    pub auth: AuthConfig,

    /// Billing webhook configuration
    pub billing: BillingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `AGENTHUB` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `AGENTHUB__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `AGENTHUB__STORE__BACKEND=relational` -> `store.backend = Relational`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("AGENTHUB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// Misconfiguration must fail here, at initialization, never at first use.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.store.validate()?;
        self.auth.validate()?;
        self.billing.validate()?;

        // Plaintext store traffic is a development-only concession
        if self.is_production() {
            if let Some(relational) = &self.store.relational {
                if relational.endpoint.starts_with("http://") {
                    return Err(ValidationError::EndpointMustBeHttps);
                }
            }
        }
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
