//! HTTP handlers for the auth session routes.

use axum::extract::{Json, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::adapters::http::{AppState, ErrorResponse};
use crate::application::handlers::auth::RefreshError;
use crate::domain::foundation::StoreError;
use crate::ports::SignUp;

use super::dto::{LoginRequest, RefreshRequest, SessionResponse, SignupRequest};

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let session = state
        .provider
        .auth()
        .sign_up(SignUp {
            email: request.email,
            password: request.password,
            full_name: request.full_name,
            role: request.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let session = state
        .provider
        .auth()
        .sign_in(&request.email, &request.password)
        .await?;

    Ok(Json(SessionResponse::from(session)))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<impl IntoResponse, AuthApiError> {
    let session = state.refresh.handle(&request.refresh_token).await?;
    Ok(Json(SessionResponse::from(session)))
}

/// POST /api/auth/logout
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthApiError> {
    let token = bearer_token(&headers).ok_or(AuthApiError::MissingBearer)?;
    state.provider.auth().sign_out(token).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Converts store and refresh failures to HTTP responses.
pub enum AuthApiError {
    MissingBearer,
    Store(StoreError),
    Refresh(RefreshError),
}

impl From<StoreError> for AuthApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<RefreshError> for AuthApiError {
    fn from(err: RefreshError) -> Self {
        Self::Refresh(err)
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            AuthApiError::MissingBearer => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_REQUIRED",
                "Authentication is required".to_string(),
            ),
            AuthApiError::Store(err) => match err {
                StoreError::Auth(message) => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS", message)
                }
                StoreError::Constraint(message) => (StatusCode::CONFLICT, "CONFLICT", message),
                StoreError::Missing(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
                other => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    other.to_string(),
                ),
            },
            // Token failures and an unknown subject answer identically so the
            // endpoint is not an account-existence oracle.
            AuthApiError::Refresh(RefreshError::InvalidToken(_))
            | AuthApiError::Refresh(RefreshError::UnknownUser) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_REFRESH_TOKEN",
                "Invalid refresh token".to_string(),
            ),
            AuthApiError::Refresh(RefreshError::Lookup(err)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}
