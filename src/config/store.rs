//! Backing store configuration
//!
//! One environment-level switch selects the active provider; each provider
//! carries its own connection parameters. The selection happens exactly once
//! at process start and is never swapped mid-process.

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Which persistence provider to activate at startup.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Hosted relational store accessed through its REST surface
    Relational,
    /// Document store accessed through the native driver
    Document,
}

/// Backing store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Active provider
    pub backend: StoreBackend,

    /// Relational provider connection parameters
    pub relational: Option<RelationalStoreConfig>,

    /// Document provider connection parameters
    pub document: Option<DocumentStoreConfig>,
}

/// Connection parameters for the relational provider.
#[derive(Debug, Clone, Deserialize)]
pub struct RelationalStoreConfig {
    /// Base endpoint of the hosted store (e.g. `https://xyz.supabase.co`)
    pub endpoint: String,

    /// Privileged service-role credential. Must never cross into a
    /// client-trusted context.
    pub service_role_key: Secret<String>,
}

/// Connection parameters for the document provider.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentStoreConfig {
    /// Connection URI (e.g. `mongodb://localhost:27017`)
    pub uri: Secret<String>,

    /// Database name
    pub database: String,
}

impl StoreConfig {
    /// Validate store configuration.
    ///
    /// The section matching the selected backend must be present and
    /// well-formed; the other section is ignored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.backend {
            StoreBackend::Relational => {
                let relational = self
                    .relational
                    .as_ref()
                    .ok_or(ValidationError::MissingRequired("STORE_RELATIONAL"))?;
                relational.validate()
            }
            StoreBackend::Document => {
                let document = self
                    .document
                    .as_ref()
                    .ok_or(ValidationError::MissingRequired("STORE_DOCUMENT"))?;
                document.validate()
            }
        }
    }
}

impl RelationalStoreConfig {
    /// Validate relational connection parameters
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.endpoint.is_empty() {
            return Err(ValidationError::MissingRequired("STORE_RELATIONAL_ENDPOINT"));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ValidationError::InvalidStoreEndpoint);
        }
        if self.service_role_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired(
                "STORE_RELATIONAL_SERVICE_ROLE_KEY",
            ));
        }
        Ok(())
    }
}

impl DocumentStoreConfig {
    /// Validate document connection parameters
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.uri.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STORE_DOCUMENT_URI"));
        }
        if !self.uri.expose_secret().starts_with("mongodb://")
            && !self.uri.expose_secret().starts_with("mongodb+srv://")
        {
            return Err(ValidationError::InvalidDocumentUri);
        }
        if self.database.is_empty() {
            return Err(ValidationError::MissingRequired("STORE_DOCUMENT_DATABASE"));
        }
        Ok(())
    }
}
