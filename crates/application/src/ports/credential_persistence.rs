//! Credential persistence port
//!
//! Defines the interface for durable storage of the session token.

use async_trait::async_trait;

/// Errors that can occur while persisting the credential.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored record could not be read back.
    #[error("corrupt credential record: {0}")]
    Corrupt(String),

    /// Could not determine config directory.
    #[error("could not determine config directory")]
    NoConfigDir,
}

/// Repository trait for the stored credential token.
///
/// Values are stored exactly as handed in; normalization happens before
/// this port is called. Durability and atomicity are the implementation's
/// responsibility.
#[async_trait]
pub trait CredentialPersistence: Send + Sync {
    /// Loads the stored token, or `None` if nothing is stored.
    async fn load(&self) -> Result<Option<String>, PersistenceError>;

    /// Replaces the stored token.
    ///
    /// # Errors
    /// Returns an error if the token cannot be written.
    async fn store(&self, token: &str) -> Result<(), PersistenceError>;

    /// Removes the stored token. Removing a missing token succeeds.
    ///
    /// # Errors
    /// Returns an error if the record exists but cannot be removed.
    async fn clear(&self) -> Result<(), PersistenceError>;
}
