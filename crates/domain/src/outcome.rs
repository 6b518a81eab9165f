//! Typed call results.

use serde::Serialize;
use thiserror::Error;

use crate::error_kind::{ErrorKind, MessageId};

/// A classified request failure.
///
/// The message identifier is always derived from the kind, so two failures
/// of the same kind are indistinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Error)]
#[error("{kind} ({message_id})")]
pub struct ApiFailure {
    /// Failure category.
    pub kind: ErrorKind,
    /// User-facing message identifier.
    pub message_id: MessageId,
}

impl ApiFailure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message_id: kind.message_id(),
        }
    }

    /// Returns true if blindly retrying may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        self.kind.is_recoverable()
    }
}

impl From<ErrorKind> for ApiFailure {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Outcome of a single classified call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum ApiResult<T> {
    /// The call succeeded and its payload was decoded.
    Success(T),
    /// The call failed.
    Failure(ApiFailure),
}

impl<T> ApiResult<T> {
    /// Creates a failure of the given kind.
    pub const fn failure(kind: ErrorKind) -> Self {
        Self::Failure(ApiFailure::new(kind))
    }

    /// Returns true if the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns true if the call failed.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind),
        }
    }

    /// Returns the success payload, discarding any failure.
    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }

    /// Borrows the payload.
    pub const fn as_ref(&self) -> ApiResult<&T> {
        match self {
            Self::Success(value) => ApiResult::Success(value),
            Self::Failure(failure) => ApiResult::Failure(*failure),
        }
    }

    /// Maps the success payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResult<U> {
        match self {
            Self::Success(value) => ApiResult::Success(f(value)),
            Self::Failure(failure) => ApiResult::Failure(failure),
        }
    }

    /// Converts into a standard `Result` so `?` can be used.
    ///
    /// # Errors
    ///
    /// Returns the contained [`ApiFailure`] if the call failed.
    pub fn into_result(self) -> Result<T, ApiFailure> {
        self.into()
    }
}

impl<T> From<ApiResult<T>> for Result<T, ApiFailure> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            ApiResult::Success(value) => Ok(value),
            ApiResult::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Result<T, ApiFailure>> for ApiResult<T> {
    fn from(result: Result<T, ApiFailure>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(failure) => Self::Failure(failure),
        }
    }
}
