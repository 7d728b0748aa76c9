//! JSON HTTP client for the parley backend.
//!
//! This crate provides the typed client the web app uses to talk to the
//! invitation-code API. It works both in the browser (reqwest's fetch
//! backend under wasm32) and natively, which keeps the request/response
//! mapping unit-testable with plain `cargo test`.

use reqwest::header::CONTENT_TYPE;
use reqwest::Response;
use thiserror::Error;

mod codes;
mod types;

pub use codes::{filter_valid, sort_codes, CodeStatus, SortField, SortState};
pub use types::{AgentIdResponse, InvitationCode, InvitationData, SignedUrlResponse, TokenResponse};

/// Error type for API calls.
///
/// `Rejected` carries the human-readable reason the server declined the
/// request (the JSON `detail` field), which the launch flow inspects to
/// decide whether a held invitation code is still usable.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Please enter an invitation code")]
    EmptyCode,
    #[error("{0}")]
    Rejected(String),
    #[error("request failed: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

/// Extract the `detail` message from an error response body, falling back
/// to a generic message when the body is not JSON or has no such field.
fn detail_message(body: &str, fallback: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or_else(|| fallback.to_string())
}

/// Map a non-2xx response to `ApiError::Rejected`, consuming the body.
async fn rejection(response: Response, fallback: &str) -> ApiError {
    let body = response.text().await.unwrap_or_default();
    ApiError::Rejected(detail_message(&body, fallback))
}

/// Client for the parley HTTP API.
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    /// Create a new client for the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Validate an invitation code.
    ///
    /// The code is trimmed first; an empty code is rejected locally without
    /// touching the network. A single attempt is made, no retry.
    pub async fn validate_code(&self, code: &str) -> Result<InvitationData, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::EmptyCode);
        }

        let response = self
            .http
            .post(self.url("/api/validate-code"))
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Invalid invitation code").await);
        }

        Ok(response.json().await?)
    }

    /// Increment the usage counter for a previously validated code.
    ///
    /// The response body is ignored beyond the success status.
    pub async fn increment_code(&self, code: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url("/api/increment-code"))
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to increment code usage").await);
        }

        Ok(())
    }

    /// Log in as an admin, returning the issued tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let body = serde_urlencoded::to_string([("username", username), ("password", password)])
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        let response = self
            .http
            .post(self.url("/token"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Incorrect username or password").await);
        }

        Ok(response.json().await?)
    }

    /// List all invitation codes. Requires an admin bearer token.
    pub async fn list_codes(&self, token: &str) -> Result<Vec<InvitationCode>, ApiError> {
        let response = self
            .http
            .get(self.url("/api/codes"))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to load invitation codes").await);
        }

        Ok(response.json().await?)
    }

    /// Fetch a signed connection URL for the voice-agent session.
    pub async fn signed_url(&self) -> Result<String, ApiError> {
        let response = self.http.get(self.url("/api/signed-url")).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to get signed URL").await);
        }

        let data: SignedUrlResponse = response.json().await?;
        Ok(data.signed_url)
    }

    /// Fetch the public agent id.
    ///
    /// Part of the API surface, though the launch flow connects through the
    /// signed URL instead.
    pub async fn agent_id(&self) -> Result<String, ApiError> {
        let response = self.http.get(self.url("/api/getAgentId")).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response, "Failed to get agent id").await);
        }

        let data: AgentIdResponse = response.json().await?;
        Ok(data.agent_id)
    }
}
