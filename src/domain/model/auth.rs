//! Request-scoped auth types.
//!
//! `AuthUser` and `AuthSession` are ephemeral: they live for the duration of
//! a request and are never persisted by this core.

use serde::{Deserialize, Serialize};

use super::profile::Role;

/// The identity-provider view of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// A freshly minted or refreshed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub refresh_token: Option<String>,
}
