//! Identity gateway against the hosted store's auth endpoints.
//!
//! Sessions are minted by the identity provider itself; this gateway is
//! glue. The one invariant it owns: sign-up creates the matching profile
//! row with the identity provider's user id, never a generated one.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::domain::foundation::{StoreError, StoreResult};
use crate::domain::model::{AuthSession, AuthUser, NewProfile, Role};
use crate::ports::{AuthGateway, SignUp};

use super::client::RestClient;
use super::rows;

/// Session payload the identity provider returns on signup and login.
#[derive(Debug, Deserialize)]
struct ProviderSession {
    access_token: String,
    refresh_token: Option<String>,
    user: ProviderUser,
}

#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: ProviderUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderUserMetadata {
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl ProviderUser {
    fn into_auth_user(self) -> AuthUser {
        AuthUser {
            id: self.id,
            email: self.email.unwrap_or_default(),
            full_name: self.user_metadata.full_name.unwrap_or_default(),
            role: role_from_metadata(self.user_metadata.role.as_deref()),
        }
    }
}

/// Metadata roles are free-form strings; anything unrecognized is a builder.
fn role_from_metadata(role: Option<&str>) -> Role {
    match role {
        Some("recruiter") => Role::Recruiter,
        Some("admin") => Role::Admin,
        _ => Role::Builder,
    }
}

pub struct RelationalAuthGateway {
    client: Arc<RestClient>,
}

impl RelationalAuthGateway {
    pub fn new(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    async fn decode_session(response: reqwest::Response) -> StoreResult<ProviderSession> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(StoreError::malformed);
        }
        let body = response.text().await.unwrap_or_default();
        Err(normalize_auth_status(status, body))
    }
}

/// Identity endpoints fail with 400 for bad credentials; everything in the
/// 4xx range is an auth rejection, the rest is connectivity.
fn normalize_auth_status(status: StatusCode, detail: String) -> StoreError {
    if status.is_client_error() {
        StoreError::Auth(detail)
    } else {
        StoreError::Connection(format!("{status}: {detail}"))
    }
}

#[async_trait]
impl AuthGateway for RelationalAuthGateway {
    async fn sign_up(&self, input: SignUp) -> StoreResult<AuthSession> {
        let response = self
            .client
            .authorize(self.client.http().post(self.client.auth_url("signup")).json(&json!({
                "email": &input.email,
                "password": &input.password,
                "data": {
                    "full_name": &input.full_name,
                    "role": input.role,
                },
            })))
            .send()
            .await
            .map_err(StoreError::connection)?;
        let session = Self::decode_session(response).await?;

        // Profile id is the identity provider's user id, verbatim.
        let profile_row = rows::new_profile_row(&NewProfile {
            id: session.user.id.clone(),
            full_name: input.full_name,
            role: input.role,
            email: input.email,
            avatar_url: None,
        });
        let _: rows::ProfileRow = self.client.insert("profiles", &profile_row).await?;
        info!(user_id = %session.user.id, "signed up new user");

        Ok(AuthSession {
            user: session.user.into_auth_user(),
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthSession> {
        let response = self
            .client
            .authorize(
                self.client
                    .http()
                    .post(self.client.auth_url("token"))
                    .query(&[("grant_type", "password")])
                    .json(&json!({ "email": email, "password": password })),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        let session = Self::decode_session(response).await?;

        Ok(AuthSession {
            user: session.user.into_auth_user(),
            access_token: session.access_token,
            refresh_token: session.refresh_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> StoreResult<()> {
        let response = self
            .client
            .authorize_as_user(
                self.client.http().post(self.client.auth_url("logout")),
                access_token,
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(normalize_auth_status(status, body))
    }

    async fn current_user(&self, access_token: &str) -> StoreResult<Option<AuthUser>> {
        let response = self
            .client
            .authorize_as_user(
                self.client.http().get(self.client.auth_url("user")),
                access_token,
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            // Expired or revoked token: no user, not an error.
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(normalize_auth_status(status, body));
        }
        let user: ProviderUser = response.json().await.map_err(StoreError::malformed)?;
        Ok(Some(user.into_auth_user()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_role_parses_known_values() {
        assert_eq!(role_from_metadata(Some("recruiter")), Role::Recruiter);
        assert_eq!(role_from_metadata(Some("admin")), Role::Admin);
    }

    #[test]
    fn metadata_role_defaults_to_builder() {
        assert_eq!(role_from_metadata(Some("superuser")), Role::Builder);
        assert_eq!(role_from_metadata(None), Role::Builder);
    }

    #[test]
    fn provider_user_maps_to_auth_user() {
        let user = ProviderUser {
            id: "u-1".to_string(),
            email: Some("x@example.com".to_string()),
            user_metadata: ProviderUserMetadata {
                full_name: Some("X Ample".to_string()),
                role: Some("recruiter".to_string()),
            },
        };
        let auth_user = user.into_auth_user();
        assert_eq!(auth_user.id, "u-1");
        assert_eq!(auth_user.role, Role::Recruiter);
    }

    #[test]
    fn client_error_normalizes_to_auth() {
        assert!(matches!(
            normalize_auth_status(StatusCode::BAD_REQUEST, "invalid login".to_string()),
            StoreError::Auth(_)
        ));
    }

    #[test]
    fn server_error_normalizes_to_connection() {
        assert!(matches!(
            normalize_auth_status(StatusCode::BAD_GATEWAY, "down".to_string()),
            StoreError::Connection(_)
        ));
    }
}
