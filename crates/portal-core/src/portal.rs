//! Application root
//!
//! The one place that constructs the session container. Consumers get it by
//! reference from here rather than from any global.

use std::sync::Arc;
use std::time::Duration;

use portal_api::{AuthApi, Credentials, HttpAuthClient, User};
use portal_session::{Session, SessionManager};
use portal_storage::{ClientStorage, Database};

use crate::config::Config;
use crate::Result;

pub struct Portal {
    /// Configuration
    config: Config,
    /// Session container shared with consumers
    session_manager: SessionManager,
}

impl Portal {
    /// Open client storage and build the HTTP auth client from `config`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        // Ensure data directory exists
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        let api = HttpAuthClient::with_timeouts(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )?;

        tracing::info!(
            database = %config.database_path.display(),
            api = %api.base_url(),
            "Portal client created"
        );

        Ok(Self::from_parts(config, Arc::new(db), Arc::new(api)))
    }

    /// Assemble from already-built collaborators
    pub fn from_parts(
        config: Config,
        storage: Arc<dyn ClientStorage>,
        api: Arc<dyn AuthApi>,
    ) -> Self {
        let session_manager = SessionManager::with_token_key(api, storage, config.token_key.clone());

        Self {
            config,
            session_manager,
        }
    }

    /// Restore the persisted session and verify it with the server
    pub async fn start(&self) -> Session {
        self.session_manager.initialize();
        self.session_manager.check_auth().await;

        let session = self.session_manager.state();
        tracing::info!(
            authenticated = session.is_authenticated,
            "Portal client started"
        );
        session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_manager(&self) -> &SessionManager {
        &self.session_manager
    }

    // === Session operations ===

    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        Ok(self.session_manager.login(credentials).await?)
    }

    pub async fn logout(&self) {
        self.session_manager.logout().await;
    }

    /// Tear down: anything still in flight is discarded when it completes
    pub fn shutdown(self) {
        self.session_manager.cancel_pending();
        tracing::info!("Portal client shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_api::{ApiError, AuthResponse};
    use portal_storage::MemoryStorage;

    struct SingleUserApi;

    #[async_trait::async_trait]
    impl AuthApi for SingleUserApi {
        async fn login(&self, credentials: &Credentials) -> portal_api::Result<AuthResponse> {
            if credentials.email == "a@b.com" && credentials.password == "pw" {
                Ok(AuthResponse {
                    token: "T1".to_string(),
                    user: User::new(1, "A"),
                })
            } else {
                Err(ApiError::Unauthorized("invalid credentials".to_string()))
            }
        }

        async fn check_auth(&self, token: &str) -> portal_api::Result<User> {
            if token == "T1" {
                Ok(User::new(1, "A"))
            } else {
                Err(ApiError::Unauthorized("token expired".to_string()))
            }
        }

        async fn logout(&self, _token: &str) -> portal_api::Result<()> {
            Ok(())
        }
    }

    fn portal_with(storage: MemoryStorage) -> Portal {
        Portal::from_parts(
            Config::new(std::path::PathBuf::from("/unused")),
            Arc::new(storage),
            Arc::new(SingleUserApi),
        )
    }

    #[tokio::test]
    async fn test_start_without_persisted_token() {
        let portal = portal_with(MemoryStorage::new());

        let session = portal.start().await;
        assert!(!session.is_authenticated);
        assert!(!session.loading);
        assert!(session.error.is_none());
    }

    #[tokio::test]
    async fn test_start_restores_and_verifies() {
        let storage = MemoryStorage::new();
        storage.set_item("auth_token", "T1").unwrap();
        let portal = portal_with(storage);

        let session = portal.start().await;
        assert!(session.is_authenticated);
        assert_eq!(session.user.map(|u| u.name), Some("A".to_string()));
    }

    #[tokio::test]
    async fn test_login_logout_round() {
        let storage = MemoryStorage::new();
        let portal = portal_with(storage.clone());
        portal.start().await;

        let err = portal
            .login(&Credentials::new("a@b.com", "nope"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Session error: invalid credentials");

        portal
            .login(&Credentials::new("a@b.com", "pw"))
            .await
            .unwrap();
        assert!(portal.session_manager().is_authenticated());

        portal.logout().await;
        assert!(!portal.session_manager().is_authenticated());
        assert!(storage.is_empty());

        portal.shutdown();
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        // Portal::new creates the missing data directory
        let config = Config::new(dir.path().join("data"));
        let first = Portal::new(config.clone()).unwrap();
        assert!(config.database_path.exists());
        first.shutdown();

        let db = Database::open(&config.database_path).unwrap();
        db.set_item(&config.token_key, "T1").unwrap();
        drop(db);

        let storage = Database::open(&config.database_path).unwrap();
        let restarted = Portal::from_parts(config, Arc::new(storage), Arc::new(SingleUserApi));
        let session = restarted.start().await;
        assert!(session.is_authenticated);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(dir.path().to_path_buf());
        config.api_base_url = "not a url".to_string();

        assert!(matches!(
            Portal::new(config),
            Err(crate::CoreError::Config(_))
        ));
    }
}
