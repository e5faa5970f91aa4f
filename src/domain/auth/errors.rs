//! Token error types.
//!
//! Every verification failure collapses to one of two opaque errors. The
//! caller never learns whether the signature, the expiry, or the embedded
//! strategy was at fault; anything more specific is an oracle on the token
//! format.

use thiserror::Error;

/// Opaque token verification failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// An access token failed verification, for any reason.
    #[error("Invalid token")]
    InvalidToken,

    /// A refresh token failed verification, for any reason.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,
}
