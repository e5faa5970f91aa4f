//! Identity gateway port.

use async_trait::async_trait;

use crate::domain::foundation::StoreResult;
use crate::domain::model::{AuthSession, AuthUser, Role};

/// Sign-up input. The gateway assigns the user id; the matching profile is
/// created with that id in the same operation.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
}

/// Session lifecycle against the identity provider.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Registers a user, creates their profile, and opens a session.
    async fn sign_up(&self, input: SignUp) -> StoreResult<AuthSession>;

    /// Opens a session for an existing user.
    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthSession>;

    /// Invalidates the session behind `access_token`.
    async fn sign_out(&self, access_token: &str) -> StoreResult<()>;

    /// Resolves the user behind `access_token`; `Ok(None)` for a token the
    /// provider no longer recognizes.
    async fn current_user(&self, access_token: &str) -> StoreResult<Option<AuthUser>>;
}
