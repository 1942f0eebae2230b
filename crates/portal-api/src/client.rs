//! JSON-over-HTTP authentication client.
//!
//! Thin wrapper over three endpoints below a configurable base URL. Response
//! handling lives in pure functions so it can be tested without a server.

use serde::Deserialize;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

use crate::error::ApiError;
use crate::types::{AuthResponse, Credentials, User};
use crate::{AuthApi, Result};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const REQUEST_ID_HEADER: &str = "x-request-id";
const UNAUTHORIZED_FALLBACK: &str = "invalid credentials";

pub struct HttpAuthClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeouts(
            base_url,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
        )
    }

    pub fn with_timeouts(base_url: &str, request: Duration, connect: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        let http = reqwest::Client::builder()
            .timeout(request)
            .connect_timeout(connect)
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait::async_trait]
impl AuthApi for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse> {
        credentials.validate()?;

        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, email = %credentials.email, "POST auth/login");

        let response = self
            .http
            .post(self.endpoint("auth/login"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(&LoginRequest {
                email: credentials.email.trim(),
                password: &credentials.password,
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_login_response(status, &body)
    }

    async fn check_auth(&self, token: &str) -> Result<User> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, "GET auth/me");

        let response = self
            .http
            .get(self.endpoint("auth/me"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_me_response(status, &body)
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, "POST auth/logout");

        let response = self
            .http
            .post(self.endpoint("auth/logout"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status().as_u16();
        if is_success(status) {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &body))
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(serde::Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

// =============================================================================
// PARSING
// =============================================================================

fn normalize_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid API base URL {raw}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidRequest(format!(
            "Unsupported API base URL scheme: {}",
            parsed.scheme()
        )));
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_login_response(status: u16, body: &str) -> Result<AuthResponse> {
    if !is_success(status) {
        return Err(error_for_status(status, body));
    }

    let response: AuthResponse =
        serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;

    if response.token.is_empty() {
        return Err(ApiError::Parse("login response carried an empty token".to_string()));
    }

    Ok(response)
}

fn parse_me_response(status: u16, body: &str) -> Result<User> {
    if !is_success(status) {
        return Err(error_for_status(status, body));
    }

    match serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))? {
        MeResponse::Wrapped { user } | MeResponse::Bare(user) => Ok(user),
    }
}

fn error_for_status(status: u16, body: &str) -> ApiError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty());

    match status {
        401 | 403 => {
            ApiError::Unauthorized(message.unwrap_or_else(|| UNAUTHORIZED_FALLBACK.to_string()))
        }
        _ => ApiError::Status {
            status,
            message: message.unwrap_or_else(|| format!("HTTP {status}")),
        },
    }
}
