//! Portal Authentication API
//!
//! Remote procedure boundary for the session layer:
//! - `login(credentials) -> {token, user}`
//! - `check_auth(token) -> user`
//! - `logout(token)`
//!
//! [`AuthApi`] is the seam; [`HttpAuthClient`] is the JSON-over-HTTP
//! implementation used in production.

mod client;
mod error;
mod types;

pub use client::{HttpAuthClient, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
pub use types::{AuthResponse, Credentials, User};

pub type Result<T> = std::result::Result<T, ApiError>;

/// Authentication service as seen by the session container.
///
/// Implementations perform no retries of their own unless documented.
#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchange credentials for a token and the user's profile.
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse>;

    /// Validate `token` and fetch the profile it belongs to.
    async fn check_auth(&self, token: &str) -> Result<User>;

    /// Invalidate `token` server-side.
    async fn logout(&self, token: &str) -> Result<()>;
}
