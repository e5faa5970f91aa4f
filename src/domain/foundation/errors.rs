//! Error types for the store boundary.
//!
//! Every provider operation returns [`StoreResult`]. Not-found is `Ok(None)`,
//! never an error; the error slot is reserved for genuine failures. Providers
//! catch their backend's raw errors and normalize them into [`StoreError`]
//! before they cross the port boundary.

use thiserror::Error;

/// Result alias used by every store operation.
pub type StoreResult<T> = Result<T, StoreError>;

/// Normalized store failure, independent of the backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Connectivity loss, timeouts, or an unexpected backend response.
    #[error("store connection failure: {0}")]
    Connection(String),

    /// Unique/foreign key constraint violation.
    #[error("store constraint violation: {0}")]
    Constraint(String),

    /// The backing store rejected our credential.
    #[error("store authentication rejected: {0}")]
    Auth(String),

    /// A row or document could not be decoded into its domain shape.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// A write targeted a record that does not exist (e.g. delete of nothing).
    #[error("no record matched: {0}")]
    Missing(String),
}

impl StoreError {
    /// Connectivity failure from any backend error that renders as text.
    pub fn connection(err: impl std::fmt::Display) -> Self {
        StoreError::Connection(err.to_string())
    }

    /// Decoding failure from any backend error that renders as text.
    pub fn malformed(err: impl std::fmt::Display) -> Self {
        StoreError::Malformed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_displays_reason() {
        let err = StoreError::connection("socket closed");
        assert_eq!(format!("{}", err), "store connection failure: socket closed");
    }

    #[test]
    fn missing_displays_target() {
        let err = StoreError::Missing("profiles: p-1".to_string());
        assert_eq!(format!("{}", err), "no record matched: profiles: p-1");
    }
}
