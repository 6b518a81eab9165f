//! Application error types

use thiserror::Error;

use crate::ports::PersistenceError;

/// Application-level errors.
///
/// Request outcomes never surface here; they are classified into
/// [`anistream_domain::ApiResult`]. These cover the local side of the
/// pipeline: credential storage.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// The credential could not be persisted or restored.
    #[error("credential storage error: {0}")]
    Persistence(#[from] PersistenceError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
