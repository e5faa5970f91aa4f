//! JWT mint/verify/refresh.
//!
//! Access and refresh tokens are signed with two distinct secrets so that
//! leaking one never compromises the other. Each token embeds the strategy
//! it was minted for; verification demands an exact strategy match, which
//! blocks cross-channel replay (a cookie token presented as a bearer token,
//! or an access token presented where a refresh token is expected).

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AuthConfig;
use crate::domain::model::{AuthSession, AuthUser, Role};

use super::errors::TokenError;

/// The delivery channel a token is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenStrategy {
    /// Authorization header.
    Bearer,
    /// HTTP-only cookie.
    Cookie,
    /// Refresh tokens form their own class.
    Refresh,
}

/// Claims embedded in an access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub strategy: TokenStrategy,
    pub iat: i64,
    pub exp: i64,
}

/// Claims embedded in a refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    /// User id.
    pub sub: String,
    /// Always [`TokenStrategy::Refresh`]; checked on verification.
    pub strategy: TokenStrategy,
    pub iat: i64,
    pub exp: i64,
}

/// Pure role predicate: does `role` appear in the allowed set?
pub fn role_allowed(allowed: &[Role], role: Role) -> bool {
    allowed.contains(&role)
}

/// Stateless token service.
///
/// Verification is synchronous and CPU-bound; it never touches I/O.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    /// Build the service from validated configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let access = config.access_secret.expose_secret().as_bytes();
        let refresh = config.refresh_secret.expose_secret().as_bytes();
        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
        }
    }

    /// Mint an access/refresh pair for the given user and delivery strategy.
    ///
    /// `strategy` names the channel the access token will travel on and must
    /// not be [`TokenStrategy::Refresh`].
    pub fn mint_session(&self, user: &AuthUser, strategy: TokenStrategy) -> AuthSession {
        debug_assert!(strategy != TokenStrategy::Refresh);
        let now = Utc::now().timestamp();

        let access_claims = AccessClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            strategy,
            iat: now,
            exp: now + self.access_ttl.as_secs() as i64,
        };
        let refresh_claims = RefreshClaims {
            sub: user.id.clone(),
            strategy: TokenStrategy::Refresh,
            iat: now,
            exp: now + self.refresh_ttl.as_secs() as i64,
        };

        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding)
            .expect("HS256 signing cannot fail");
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
            .expect("HS256 signing cannot fail");

        AuthSession {
            user: user.clone(),
            access_token,
            refresh_token: Some(refresh_token),
        }
    }

    /// Verify an access token against the strategy the caller demands.
    ///
    /// Signature failure, expiry, and strategy mismatch all collapse to the
    /// same opaque [`TokenError::InvalidToken`].
    pub fn verify_access(
        &self,
        token: &str,
        strategy: TokenStrategy,
    ) -> Result<AccessClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.access_decoding, &strict_validation())
            .map_err(|_| TokenError::InvalidToken)?
            .claims;
        if claims.strategy != strategy {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Verify a refresh token.
    ///
    /// All failures collapse to the opaque [`TokenError::InvalidRefreshToken`].
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let claims = decode::<RefreshClaims>(token, &self.refresh_decoding, &strict_validation())
            .map_err(|_| TokenError::InvalidRefreshToken)?
            .claims;
        if claims.strategy != TokenStrategy::Refresh {
            return Err(TokenError::InvalidRefreshToken);
        }
        Ok(claims)
    }
}

fn strict_validation() -> Validation {
    let mut validation = Validation::default();
    validation.leeway = 0;
    validation
}
