//! Portal Session Management
//!
//! The client-side authentication session:
//! - One [`SessionManager`] per application, constructed at the root
//! - Token and user profile only change through `initialize`, `check_auth`,
//!   `login` and `logout`
//! - The token is persisted in durable client storage across restarts
//! - Consumers read snapshots or subscribe to changes; they never mutate

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{SessionManager, DEFAULT_TOKEN_KEY};
pub use session::Session;

pub type Result<T> = std::result::Result<T, SessionError>;
