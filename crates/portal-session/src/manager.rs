//! Session Manager
//!
//! Owns the session record and runs the four state-changing operations
//! against the auth API and client storage.
//!
//! Every remote operation takes a sequence id when it starts. A completion
//! is applied only while its id is still the latest, so a slow response can
//! never overwrite state set by a call initiated after it.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

use portal_api::{AuthApi, AuthResponse, Credentials, User};
use portal_storage::ClientStorage;

use crate::error::SessionError;
use crate::session::Session;
use crate::Result;

/// Storage key the token is persisted under unless configured otherwise
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";

struct Inner {
    session: Session,
    /// Id of the most recently initiated remote operation
    latest_seq: u64,
    initialized: bool,
}

pub struct SessionManager {
    inner: Arc<Mutex<Inner>>,
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn ClientStorage>,
    token_key: String,
    notifier: Arc<watch::Sender<Session>>,
}

impl SessionManager {
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn ClientStorage>) -> Self {
        Self::with_token_key(api, storage, DEFAULT_TOKEN_KEY)
    }

    pub fn with_token_key(
        api: Arc<dyn AuthApi>,
        storage: Arc<dyn ClientStorage>,
        token_key: impl Into<String>,
    ) -> Self {
        let session = Session::new();
        let (notifier, _) = watch::channel(session.clone());

        Self {
            inner: Arc::new(Mutex::new(Inner {
                session,
                latest_seq: 0,
                initialized: false,
            })),
            api,
            storage,
            token_key: token_key.into(),
            notifier: Arc::new(notifier),
        }
    }

    // === Reads ===

    /// Copy of the current session
    pub fn state(&self) -> Session {
        self.inner.lock().session.clone()
    }

    /// Receiver that observes every subsequent mutation
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.notifier.subscribe()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.lock().session.token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.lock().session.user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.lock().session.is_authenticated
    }

    pub fn authorization_header(&self) -> Option<String> {
        self.inner.lock().session.authorization_header()
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    // === Operations ===

    /// Restore a persisted token into memory.
    ///
    /// Runs once; later calls are no-ops. The token is not validated here,
    /// see [`SessionManager::check_auth`].
    pub fn initialize(&self) {
        let mut inner = self.inner.lock();
        if inner.initialized {
            tracing::debug!("Session already initialized");
            return;
        }
        inner.initialized = true;

        if inner.session.token.is_some() {
            tracing::debug!("Token already in memory, skipping restore");
            return;
        }

        match self.storage.get_item(&self.token_key) {
            Ok(Some(token)) if !token.is_empty() => {
                inner.session.restore_token(token);
                tracing::info!("Restored persisted session token");
            }
            Ok(_) => {
                tracing::debug!("No persisted session token");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read persisted session token");
                inner.session.fail(e.to_string());
            }
        }

        self.publish(&inner);
    }

    /// Validate the current token and load its user.
    ///
    /// Failures clear the session and land in `error`; nothing is returned
    /// to the caller. Without a token this does nothing.
    pub async fn check_auth(&self) {
        let (seq, token) = {
            let mut inner = self.inner.lock();
            let Some(token) = inner.session.token.clone() else {
                tracing::debug!("No token to check");
                return;
            };
            (self.start(&mut inner, "check_auth"), token)
        };

        match self.api.check_auth(&token).await {
            Ok(user) => {
                let applied = self.complete(seq, |session| {
                    session.set_user(user);
                    session.finish(None);
                });
                if applied.is_some() {
                    tracing::info!(seq, "Session token verified");
                }
            }
            Err(e) => {
                if e.is_unauthorized() {
                    tracing::info!(seq, error = %e, "Session token rejected");
                } else {
                    tracing::warn!(seq, error = %e, "Session check failed");
                }
                self.complete(seq, |session| {
                    session.sign_out();
                    if let Err(storage_error) = self.forget_token() {
                        tracing::warn!(error = %storage_error, "Failed to remove persisted session token");
                    }
                    session.finish(Some(e.to_string()));
                });
            }
        }
    }

    /// Sign in with credentials.
    ///
    /// Malformed credentials are rejected before any request. On failure the
    /// previous token and user stay as they were and the error is both
    /// recorded and returned. A login overtaken by a later operation returns
    /// [`SessionError::Superseded`] and applies nothing.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        credentials
            .validate()
            .map_err(|e| SessionError::Validation(e.to_string()))?;

        let seq = {
            let mut inner = self.inner.lock();
            self.start(&mut inner, "login")
        };

        match self.api.login(credentials).await {
            Ok(AuthResponse { token, user }) => {
                let applied = self.complete(seq, |session| {
                    if let Err(e) = self.storage.set_item(&self.token_key, &token) {
                        tracing::warn!(error = %e, "Failed to persist session token");
                    }
                    session.sign_in(token, user.clone());
                    session.finish(None);
                });

                match applied {
                    Some(()) => {
                        tracing::info!(seq, user_id = user.id, "Logged in");
                        Ok(user)
                    }
                    None => Err(SessionError::Superseded),
                }
            }
            Err(e) => {
                tracing::warn!(seq, error = %e, "Login failed");
                let message = e.to_string();
                self.complete(seq, |session| session.finish(Some(message)));
                Err(e.into())
            }
        }
    }

    /// Sign out.
    ///
    /// Local state and the persisted token are cleared up front, so the
    /// session ends unauthenticated whether or not the server-side
    /// invalidation succeeds. A server failure is recorded in `error`.
    pub async fn logout(&self) {
        let (seq, token) = {
            let mut inner = self.inner.lock();
            let seq = self.start(&mut inner, "logout");
            let token = inner.session.sign_out();
            if let Err(e) = self.forget_token() {
                tracing::warn!(error = %e, "Failed to remove persisted session token");
                inner.session.fail(e.to_string());
            }
            self.publish(&inner);
            (seq, token)
        };

        let server_error = match token {
            Some(token) => self.api.logout(&token).await.err(),
            None => None,
        };

        if let Some(e) = &server_error {
            tracing::warn!(seq, error = %e, "Server-side logout failed");
        }

        let message = server_error.map(|e| e.to_string());
        if self.complete(seq, |session| session.finish(message)).is_some() {
            tracing::info!(seq, "Logged out");
        }
    }

    pub fn clear_error(&self) {
        let mut inner = self.inner.lock();
        if inner.session.error.is_some() {
            inner.session.clear_error();
            self.publish(&inner);
        }
    }

    /// Supersede whatever is in flight; late completions are discarded.
    pub fn cancel_pending(&self) {
        let mut inner = self.inner.lock();
        inner.latest_seq += 1;
        if inner.session.loading {
            inner.session.finish(None);
            self.publish(&inner);
        }
        tracing::debug!(seq = inner.latest_seq, "Cancelled pending session operations");
    }

    // === Internals ===

    fn start(&self, inner: &mut Inner, op: &'static str) -> u64 {
        inner.latest_seq += 1;
        inner.session.begin();
        self.publish(inner);
        tracing::debug!(seq = inner.latest_seq, op, "Session operation started");
        inner.latest_seq
    }

    /// Apply `f` if `seq` is still the latest operation
    fn complete<R>(&self, seq: u64, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut inner = self.inner.lock();
        if inner.latest_seq != seq {
            tracing::debug!(seq, latest = inner.latest_seq, "Discarding stale completion");
            return None;
        }

        let result = f(&mut inner.session);
        self.publish(&inner);
        Some(result)
    }

    fn forget_token(&self) -> std::result::Result<(), portal_storage::StorageError> {
        self.storage.remove_item(&self.token_key)
    }

    fn publish(&self, inner: &Inner) {
        self.notifier.send_replace(inner.session.clone());
    }
}

impl Clone for SessionManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            api: Arc::clone(&self.api),
            storage: Arc::clone(&self.storage),
            token_key: self.token_key.clone(),
            notifier: Arc::clone(&self.notifier),
        }
    }
}
