//! API error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    InvalidRequest(String),

    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// Wrong credentials, or an expired/revoked token.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// Whether repeating the same request could plausibly succeed.
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Status { status: 429 | 500..=599, .. }
        )
    }

    /// Authentication failures mean the credential itself is bad.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ApiError::Network("timeout".to_string()).retryable());
        assert!(ApiError::Status {
            status: 503,
            message: "unavailable".to_string()
        }
        .retryable());
        assert!(ApiError::Status {
            status: 429,
            message: "slow down".to_string()
        }
        .retryable());

        assert!(!ApiError::Unauthorized("invalid credentials".to_string()).retryable());
        assert!(!ApiError::Status {
            status: 404,
            message: "not found".to_string()
        }
        .retryable());
        assert!(!ApiError::Parse("eof".to_string()).retryable());
    }

    #[test]
    fn test_unauthorized_displays_server_message() {
        let err = ApiError::Unauthorized("invalid credentials".to_string());
        assert_eq!(err.to_string(), "invalid credentials");
        assert!(err.is_unauthorized());
    }
}
