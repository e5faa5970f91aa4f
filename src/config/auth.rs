//! Token service configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Minimum acceptable signing secret length, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Token service configuration.
///
/// Access and refresh tokens are signed with two distinct secrets so that
/// leaking one never compromises the other.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Signing secret for access tokens
    pub access_secret: Secret<String>,

    /// Signing secret for refresh tokens
    pub refresh_secret: Secret<String>,

    /// Access token lifetime in seconds (default 7 days)
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,

    /// Refresh token lifetime in seconds (default 30 days)
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
}

impl AuthConfig {
    /// Get access token lifetime as Duration
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    /// Get refresh token lifetime as Duration
    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    /// Validate token service configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_ACCESS_SECRET"));
        }
        if self.refresh_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH_REFRESH_SECRET"));
        }
        if self.access_secret.expose_secret().len() < MIN_SECRET_LEN
            || self.refresh_secret.expose_secret().len() < MIN_SECRET_LEN
        {
            return Err(ValidationError::SigningSecretTooShort);
        }
        if self.access_secret.expose_secret() == self.refresh_secret.expose_secret() {
            return Err(ValidationError::SigningSecretsIdentical);
        }
        if self.access_ttl_secs == 0 || self.refresh_ttl_secs == 0 {
            return Err(ValidationError::InvalidTokenLifetime);
        }
        Ok(())
    }
}

fn default_access_ttl() -> u64 {
    7 * 24 * 3600
}

fn default_refresh_ttl() -> u64 {
    30 * 24 * 3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(access: &str, refresh: &str) -> AuthConfig {
        AuthConfig {
            access_secret: Secret::new(access.to_string()),
            refresh_secret: Secret::new(refresh.to_string()),
            access_ttl_secs: default_access_ttl(),
            refresh_ttl_secs: default_refresh_ttl(),
        }
    }

    #[test]
    fn test_defaults() {
        let config = config(
            "access-secret-at-least-32-bytes!",
            "refresh-secret-at-least-32-byte!",
        );
        assert_eq!(config.access_ttl(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.refresh_ttl(), Duration::from_secs(30 * 24 * 3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = config("short", "refresh-secret-at-least-32-byte!");
        assert!(matches!(
            config.validate(),
            Err(ValidationError::SigningSecretTooShort)
        ));
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let config = config(
            "one-secret-reused-for-both-token-classes",
            "one-secret-reused-for-both-token-classes",
        );
        assert!(matches!(
            config.validate(),
            Err(ValidationError::SigningSecretsIdentical)
        ));
    }

    #[test]
    fn test_zero_lifetime_rejected() {
        let mut config = config(
            "access-secret-at-least-32-bytes!",
            "refresh-secret-at-least-32-byte!",
        );
        config.access_ttl_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidTokenLifetime)
        ));
    }
}
