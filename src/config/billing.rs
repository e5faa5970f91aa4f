//! Billing webhook configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Billing webhook configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingConfig {
    /// Shared secret used to verify inbound webhook signatures
    pub webhook_secret: Secret<String>,
}

impl BillingConfig {
    /// Validate billing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let secret = self.webhook_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("BILLING_WEBHOOK_SECRET"));
        }
        // Provider-issued webhook secrets carry a whsec_ prefix
        if !secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidWebhookSecret);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_secret() {
        let config = BillingConfig {
            webhook_secret: Secret::new("whsec_xxx".to_string()),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let config = BillingConfig {
            webhook_secret: Secret::new(String::new()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let config = BillingConfig {
            webhook_secret: Secret::new("sk_test_xxx".to_string()),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidWebhookSecret)
        ));
    }
}
