//! Credential-store identity gateway for the document provider.
//!
//! There is no hosted identity service in a document deployment, so this
//! gateway owns an `auth_users` collection with argon2 password hashes and
//! mints sessions through the stateless token service. Credential failures
//! collapse to one message so the gateway never discloses whether the email
//! or the password was wrong.

use std::sync::Arc;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::Collection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::auth::{TokenService, TokenStrategy};
use crate::domain::foundation::{StoreError, StoreResult};
use crate::domain::model::{AuthSession, AuthUser, NewProfile, Role};
use crate::ports::{AuthGateway, SignUp};

use super::docs::{self, ProfileDoc};
use super::provider::normalize;

const BAD_CREDENTIALS: &str = "invalid email or password";

/// A stored credential record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct AuthUserDoc {
    #[serde(rename = "_id")]
    id: ObjectId,
    email: String,
    password_hash: String,
    full_name: String,
    role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl AuthUserDoc {
    fn to_auth_user(&self) -> AuthUser {
        AuthUser {
            id: self.id.to_hex(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            role: self.role,
        }
    }
}

pub struct DocumentAuthGateway {
    users: Collection<AuthUserDoc>,
    profiles: Collection<ProfileDoc>,
    tokens: Arc<TokenService>,
}

impl DocumentAuthGateway {
    pub(super) fn new(
        users: Collection<AuthUserDoc>,
        profiles: Collection<ProfileDoc>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            users,
            profiles,
            tokens,
        }
    }

    fn hash_password(password: &str) -> StoreResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| StoreError::Connection(format!("password hashing failed: {e}")))
    }

    fn verify_password(password: &str, stored_hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[async_trait]
impl AuthGateway for DocumentAuthGateway {
    async fn sign_up(&self, input: SignUp) -> StoreResult<AuthSession> {
        let existing = self
            .users
            .find_one(doc! { "email": &input.email }, None)
            .await
            .map_err(normalize)?;
        if existing.is_some() {
            return Err(StoreError::Constraint(format!(
                "email already registered: {}",
                input.email
            )));
        }

        let user_doc = AuthUserDoc {
            id: ObjectId::new(),
            email: input.email.clone(),
            password_hash: Self::hash_password(&input.password)?,
            full_name: input.full_name.clone(),
            role: input.role,
            created_at: Utc::now(),
        };
        self.users
            .insert_one(&user_doc, None)
            .await
            .map_err(normalize)?;

        // Profile _id mirrors the auth user's id, preserving the invariant
        // that a profile id is always the identity provider's user id.
        let profile = docs::ProfileDoc::from_new(
            &NewProfile {
                id: user_doc.id.to_hex(),
                full_name: input.full_name,
                role: input.role,
                email: input.email,
                avatar_url: None,
            },
            user_doc.id,
            Utc::now(),
        );
        self.profiles
            .insert_one(&profile, None)
            .await
            .map_err(normalize)?;
        info!(user_id = %user_doc.id.to_hex(), "signed up new user");

        let user = user_doc.to_auth_user();
        Ok(self.tokens.mint_session(&user, TokenStrategy::Bearer))
    }

    async fn sign_in(&self, email: &str, password: &str) -> StoreResult<AuthSession> {
        let found = self
            .users
            .find_one(doc! { "email": email }, None)
            .await
            .map_err(normalize)?;
        let Some(user_doc) = found else {
            return Err(StoreError::Auth(BAD_CREDENTIALS.to_string()));
        };
        if !Self::verify_password(password, &user_doc.password_hash) {
            return Err(StoreError::Auth(BAD_CREDENTIALS.to_string()));
        }

        let user = user_doc.to_auth_user();
        Ok(self.tokens.mint_session(&user, TokenStrategy::Bearer))
    }

    async fn sign_out(&self, _access_token: &str) -> StoreResult<()> {
        // Tokens are stateless; there is no session registry to clear.
        Ok(())
    }

    async fn current_user(&self, access_token: &str) -> StoreResult<Option<AuthUser>> {
        let Ok(claims) = self.tokens.verify_access(access_token, TokenStrategy::Bearer) else {
            return Ok(None);
        };
        let Some(oid) = docs::parse_object_id(&claims.sub) else {
            return Ok(None);
        };
        let found = self
            .users
            .find_one(doc! { "_id": oid }, None)
            .await
            .map_err(normalize)?;
        Ok(found.map(|user_doc| user_doc.to_auth_user()))
    }
}
