//! Auth session routes, mounted under `/api/auth`.

use axum::routing::post;
use axum::Router;

use super::handlers::{login, logout, refresh, signup};
use crate::adapters::http::AppState;

/// - `POST /signup` - register and open a session
/// - `POST /login` - open a session
/// - `POST /refresh` - exchange a refresh token for a fresh pair
/// - `POST /logout` - close the session behind the bearer token
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
}
