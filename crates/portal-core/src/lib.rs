//! Portal Core
//!
//! Application root for the site client. Owns configuration, client
//! storage, the auth API client and the one session container, and wires
//! them together with an explicit start/shutdown lifecycle.

mod config;
mod error;
mod portal;

pub use config::Config;
pub use error::CoreError;
pub use portal::Portal;

// Re-export core components
pub use portal_api::{ApiError, AuthApi, AuthResponse, Credentials, HttpAuthClient, User};
pub use portal_session::{Session, SessionError, SessionManager};
pub use portal_storage::{ClientStorage, Database, MemoryStorage, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A host application may already have installed a subscriber
    if let Err(e) = fmt().with_env_filter(filter).with_target(true).try_init() {
        tracing::debug!(error = %e, "Logging subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
        tracing::info!("Logging initialized");
    }
}
