//! Portal Storage Layer
//!
//! Durable client storage: a small key-value store that survives restarts.
//! The SQLite-backed [`Database`] is the production store; [`MemoryStorage`]
//! keeps everything in process for tests and ephemeral clients.

mod database;
mod error;
mod memory;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStorage;

pub type Result<T> = std::result::Result<T, StorageError>;

/// Key-value persistence scoped to one client.
///
/// Implementations must be safe to share between threads; the session
/// container holds one behind an `Arc`.
pub trait ClientStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}
