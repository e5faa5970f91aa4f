//! Stateless token service: mint, verify, refresh.

mod errors;
mod tokens;

pub use errors::TokenError;
pub use tokens::{role_allowed, AccessClaims, RefreshClaims, TokenService, TokenStrategy};
