//! REST client for the hosted relational store.
//!
//! Speaks the PostgREST dialect: query-string filters, `Prefer` headers for
//! write semantics, and the object representation for single-row fetches.
//! Authenticated with the privileged service-role key on every request; the
//! key lives in [`Secret`] and is attached at send time only.

use reqwest::{header, Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RelationalStoreConfig;
use crate::domain::foundation::{StoreError, StoreResult};

/// Media type that makes PostgREST return a bare object instead of an array.
const OBJECT_JSON: &str = "application/vnd.pgrst.object+json";

/// PostgREST's "zero rows where one was demanded" error code. At the port
/// boundary this is `Ok(None)`, never an error.
const NO_ROWS_CODE: &str = "PGRST116";

/// Error body the store returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct RestErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Shared HTTP client over the store's REST surface.
pub struct RestClient {
    http: Client,
    base_url: String,
    service_role_key: Secret<String>,
}

impl RestClient {
    pub fn new(config: &RelationalStoreConfig) -> Self {
        Self {
            http: Client::new(),
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// URL of an identity-provider endpoint under `/auth/v1`.
    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Attaches the service-role credential.
    pub(crate) fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.service_role_key.expose_secret();
        builder
            .header("apikey", key.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {key}"))
    }

    /// Attaches the public api key plus a user's own bearer token, for
    /// identity-provider calls made on the user's behalf.
    pub(crate) fn authorize_as_user(
        &self,
        builder: RequestBuilder,
        access_token: &str,
    ) -> RequestBuilder {
        builder
            .header("apikey", self.service_role_key.expose_secret().as_str())
            .header(header::AUTHORIZATION, format!("Bearer {access_token}"))
    }

    /// Fetches all rows matching `query`.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .authorize(self.http.get(self.rest_url(table)).query(query))
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode(response).await
    }

    /// Fetches at most one row matching `query`, as `Ok(None)` when the
    /// store reports zero rows.
    pub async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Option<T>> {
        let response = self
            .authorize(
                self.http
                    .get(self.rest_url(table))
                    .query(query)
                    .header(header::ACCEPT, OBJECT_JSON),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode_optional(response).await
    }

    /// Inserts one row and returns its stored representation.
    pub async fn insert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
    ) -> StoreResult<T> {
        let response = self
            .authorize(
                self.http
                    .post(self.rest_url(table))
                    .header("Prefer", "return=representation")
                    .header(header::ACCEPT, OBJECT_JSON)
                    .json(body),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode(response).await
    }

    /// Insert-or-update keyed on `on_conflict`, returning the stored row.
    pub async fn upsert<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &B,
    ) -> StoreResult<T> {
        let response = self
            .authorize(
                self.http
                    .post(self.rest_url(table))
                    .query(&[("on_conflict", on_conflict)])
                    .header("Prefer", "resolution=merge-duplicates,return=representation")
                    .header(header::ACCEPT, OBJECT_JSON)
                    .json(body),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode(response).await
    }

    /// Patches rows matching `query`; `Ok(None)` when nothing matched.
    pub async fn update<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> StoreResult<Option<T>> {
        let response = self
            .authorize(
                self.http
                    .patch(self.rest_url(table))
                    .query(query)
                    .header("Prefer", "return=representation")
                    .header(header::ACCEPT, OBJECT_JSON)
                    .json(body),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode_optional(response).await
    }

    /// Deletes rows matching `query` and returns what was deleted, so the
    /// caller can tell a delete-of-nothing apart from success.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .authorize(
                self.http
                    .delete(self.rest_url(table))
                    .query(query)
                    .header("Prefer", "return=representation"),
            )
            .send()
            .await
            .map_err(StoreError::connection)?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> StoreResult<T> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(StoreError::malformed);
        }
        Err(Self::normalize_failure(status, response).await)
    }

    async fn decode_optional<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> StoreResult<Option<T>> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map(Some).map_err(StoreError::malformed);
        }

        let body = response.text().await.unwrap_or_default();
        if let Ok(parsed) = serde_json::from_str::<RestErrorBody>(&body) {
            if parsed.code.as_deref() == Some(NO_ROWS_CODE) {
                return Ok(None);
            }
            return Err(normalize_status(status, describe(&parsed)));
        }
        Err(normalize_status(status, body))
    }

    async fn normalize_failure(status: StatusCode, response: reqwest::Response) -> StoreError {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<RestErrorBody>(&body)
            .map(|parsed| describe(&parsed))
            .unwrap_or(body);
        normalize_status(status, detail)
    }
}

fn describe(body: &RestErrorBody) -> String {
    match (&body.code, &body.message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.clone(),
        (None, Some(message)) => message.clone(),
        (None, None) => "unspecified store error".to_string(),
    }
}

/// Maps an HTTP failure status to the normalized store error.
fn normalize_status(status: StatusCode, detail: String) -> StoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Auth(detail),
        StatusCode::CONFLICT => StoreError::Constraint(detail),
        _ => StoreError::Connection(format!("{status}: {detail}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = RestClient::new(&RelationalStoreConfig {
            endpoint: "https://db.example.co/".to_string(),
            service_role_key: Secret::new("srk_test".to_string()),
        });
        assert_eq!(client.rest_url("profiles"), "https://db.example.co/rest/v1/profiles");
        assert_eq!(client.auth_url("signup"), "https://db.example.co/auth/v1/signup");
    }

    #[test]
    fn auth_statuses_normalize_to_auth_error() {
        assert!(matches!(
            normalize_status(StatusCode::UNAUTHORIZED, "bad key".to_string()),
            StoreError::Auth(_)
        ));
        assert!(matches!(
            normalize_status(StatusCode::FORBIDDEN, "rls".to_string()),
            StoreError::Auth(_)
        ));
    }

    #[test]
    fn conflict_normalizes_to_constraint() {
        assert!(matches!(
            normalize_status(StatusCode::CONFLICT, "duplicate key".to_string()),
            StoreError::Constraint(_)
        ));
    }

    #[test]
    fn other_failures_normalize_to_connection() {
        assert!(matches!(
            normalize_status(StatusCode::BAD_GATEWAY, "upstream".to_string()),
            StoreError::Connection(_)
        ));
    }

    #[test]
    fn error_body_description_prefers_code_and_message() {
        let body = RestErrorBody {
            code: Some("PGRST301".to_string()),
            message: Some("JWT expired".to_string()),
        };
        assert_eq!(describe(&body), "PGRST301: JWT expired");
    }
}
