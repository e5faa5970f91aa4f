//! Session refresh.
//!
//! A refresh token alone is not enough to mint a new session: the profile is
//! reloaded so that a role change (or a deleted account) takes effect at the
//! next refresh rather than at token expiry.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::auth::{TokenError, TokenService, TokenStrategy};
use crate::domain::foundation::StoreError;
use crate::domain::model::{AuthSession, AuthUser};
use crate::ports::ProfileStore;

#[derive(Debug, Error)]
pub enum RefreshError {
    /// The refresh token failed verification. Deliberately opaque.
    #[error(transparent)]
    InvalidToken(#[from] TokenError),

    /// The token verified but its subject no longer has a profile.
    #[error("Unknown user")]
    UnknownUser,

    /// The profile store was unreachable.
    #[error("Profile lookup failed: {0}")]
    Lookup(#[from] StoreError),
}

pub struct RefreshSessionHandler {
    tokens: Arc<TokenService>,
    profiles: Arc<dyn ProfileStore>,
}

impl RefreshSessionHandler {
    pub fn new(tokens: Arc<TokenService>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { tokens, profiles }
    }

    /// Exchange a refresh token for a fresh access/refresh pair.
    pub async fn handle(&self, refresh_token: &str) -> Result<AuthSession, RefreshError> {
        let claims = self.tokens.verify_refresh(refresh_token)?;

        let profile = self.profiles.get_by_id(&claims.sub).await?;
        let Some(profile) = profile else {
            warn!(user_id = %claims.sub, "refresh token subject has no profile");
            return Err(RefreshError::UnknownUser);
        };

        let user = AuthUser {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
        };
        debug!(user_id = %user.id, "session refreshed");
        Ok(self.tokens.mint_session(&user, TokenStrategy::Bearer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use secrecy::Secret;

    use crate::config::AuthConfig;
    use crate::domain::foundation::StoreResult;
    use crate::domain::model::{NewProfile, Profile, ProfileUpdate, Role};

    struct MockProfileStore {
        profile: Option<Profile>,
    }

    #[async_trait]
    impl ProfileStore for MockProfileStore {
        async fn get_all(&self) -> StoreResult<Vec<Profile>> {
            Ok(self.profile.clone().into_iter().collect())
        }
        async fn get_by_id(&self, id: &str) -> StoreResult<Option<Profile>> {
            Ok(self.profile.clone().filter(|p| p.id == id))
        }
        async fn get_by_stripe_customer_id(&self, _id: &str) -> StoreResult<Option<Profile>> {
            Ok(None)
        }
        async fn create(&self, _input: NewProfile) -> StoreResult<Profile> {
            unimplemented!("not exercised")
        }
        async fn update(&self, _id: &str, _u: ProfileUpdate) -> StoreResult<Option<Profile>> {
            unimplemented!("not exercised")
        }
        async fn delete(&self, _id: &str) -> StoreResult<()> {
            unimplemented!("not exercised")
        }
    }

    fn tokens() -> Arc<TokenService> {
        Arc::new(TokenService::new(&AuthConfig {
            access_secret: Secret::new("test-access-secret-32-bytes-long!!".to_string()),
            refresh_secret: Secret::new("test-refresh-secret-32-bytes-lng!!".to_string()),
            access_ttl_secs: 3600,
            refresh_ttl_secs: 86_400,
        }))
    }

    fn profile(id: &str) -> Profile {
        Profile {
            id: id.to_string(),
            full_name: "Test Recruiter".to_string(),
            role: Role::Recruiter,
            email: "recruiter@example.com".to_string(),
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            stripe_customer_id: None,
        }
    }

    fn user(id: &str) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            email: "recruiter@example.com".to_string(),
            full_name: "Test Recruiter".to_string(),
            role: Role::Recruiter,
        }
    }

    #[tokio::test]
    async fn refresh_mints_a_fresh_pair() {
        let tokens = tokens();
        let session = tokens.mint_session(&user("user-9"), TokenStrategy::Bearer);
        let handler = RefreshSessionHandler::new(
            tokens.clone(),
            Arc::new(MockProfileStore {
                profile: Some(profile("user-9")),
            }),
        );

        let refreshed = handler
            .handle(session.refresh_token.as_deref().unwrap())
            .await
            .unwrap();

        assert_eq!(refreshed.user.id, "user-9");
        assert!(refreshed.refresh_token.is_some());
        let claims = tokens
            .verify_access(&refreshed.access_token, TokenStrategy::Bearer)
            .unwrap();
        assert_eq!(claims.role, Role::Recruiter);
    }

    #[tokio::test]
    async fn deleted_profile_cannot_refresh() {
        let tokens = tokens();
        let session = tokens.mint_session(&user("user-9"), TokenStrategy::Bearer);
        let handler =
            RefreshSessionHandler::new(tokens, Arc::new(MockProfileStore { profile: None }));

        let result = handler
            .handle(session.refresh_token.as_deref().unwrap())
            .await;

        assert!(matches!(result, Err(RefreshError::UnknownUser)));
    }

    #[tokio::test]
    async fn access_token_is_rejected_as_refresh_input() {
        let tokens = tokens();
        let session = tokens.mint_session(&user("user-9"), TokenStrategy::Bearer);
        let handler = RefreshSessionHandler::new(
            tokens,
            Arc::new(MockProfileStore {
                profile: Some(profile("user-9")),
            }),
        );

        let result = handler.handle(&session.access_token).await;

        assert!(matches!(
            result,
            Err(RefreshError::InvalidToken(TokenError::InvalidRefreshToken))
        ));
    }
}
