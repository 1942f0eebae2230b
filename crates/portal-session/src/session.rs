//! Session data structure

use chrono::{DateTime, Utc};
use portal_api::User;
use serde::{Deserialize, Serialize};

/// Snapshot of the client's authentication status.
///
/// `is_authenticated` is kept equal to `token.is_some() && user.is_some()`
/// by every mutation below; snapshots handed out are copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    /// Opaque credential issued by the auth service
    pub token: Option<String>,
    /// Profile of the signed-in user
    pub user: Option<User>,
    pub is_authenticated: bool,
    /// A remote call is in flight
    pub loading: bool,
    /// Last failure message, cleared when the next operation starts
    pub error: Option<String>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            updated_at: Utc::now(),
            ..Self::default()
        }
    }

    /// `Bearer` header value for authorized API calls
    pub fn authorization_header(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    pub(crate) fn begin(&mut self) {
        self.loading = true;
        self.error = None;
        self.touch();
    }

    /// Errors were cleared by `begin`, so `None` leaves an earlier one in place.
    pub(crate) fn finish(&mut self, error: Option<String>) {
        self.loading = false;
        if error.is_some() {
            self.error = error;
        }
        self.touch();
    }

    pub(crate) fn fail(&mut self, error: String) {
        self.error = Some(error);
        self.touch();
    }

    pub(crate) fn sign_in(&mut self, token: String, user: User) {
        self.token = Some(token);
        self.user = Some(user);
        self.touch();
    }

    /// Token without a verified user: restored but not yet checked
    pub(crate) fn restore_token(&mut self, token: String) {
        self.token = Some(token);
        self.user = None;
        self.touch();
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.user = Some(user);
        self.touch();
    }

    /// Drop token and user together, returning the token
    pub(crate) fn sign_out(&mut self) -> Option<String> {
        let token = self.token.take();
        self.user = None;
        self.touch();
        token
    }

    pub(crate) fn clear_error(&mut self) {
        self.error = None;
        self.touch();
    }

    fn touch(&mut self) {
        self.is_authenticated = self.token.is_some() && self.user.is_some();
        self.updated_at = Utc::now();
    }
}
