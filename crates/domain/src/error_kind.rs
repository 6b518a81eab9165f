//! Closed error taxonomy for request outcomes.
//!
//! Every failed call is classified into exactly one [`ErrorKind`]. Each kind
//! maps 1:1 to a [`MessageId`] that the presentation layer resolves into a
//! localized string, and belongs to either the terminal or the recoverable
//! class.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a user-facing message in the presentation layer's string table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(&'static str);

impl MessageId {
    /// Returns the message key.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Categories of request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The login endpoint rejected the username/password pair.
    IncorrectCredentials,

    /// The session is missing, expired, or not allowed to access the resource.
    Unauthorized,

    /// Required credentials were not supplied.
    NoCredentialsSupplied,

    /// The request timed out.
    RequestTimeout,

    /// The request conflicts with the current server state.
    Conflict,

    /// The request payload was rejected as too large.
    PayloadTooLarge,

    /// The client is being rate limited.
    TooManyRequests,

    /// The server failed to process the request.
    ServerError,

    /// The server could not be reached.
    NoConnectivity,

    /// The response payload could not be decoded.
    SerializationFailure,

    /// Unknown or unexpected error.
    Unknown,
}

impl ErrorKind {
    /// Every error kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::IncorrectCredentials,
        Self::Unauthorized,
        Self::NoCredentialsSupplied,
        Self::RequestTimeout,
        Self::Conflict,
        Self::PayloadTooLarge,
        Self::TooManyRequests,
        Self::ServerError,
        Self::NoConnectivity,
        Self::SerializationFailure,
        Self::Unknown,
    ];

    /// Classifies an error-coded HTTP status.
    ///
    /// The table is fixed; any status it does not list is [`ErrorKind::Unknown`].
    /// A 401 is always read as [`ErrorKind::Unauthorized`] here, login call-sites
    /// reinterpret it themselves.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            422 => Self::NoCredentialsSupplied,
            408 => Self::RequestTimeout,
            409 => Self::Conflict,
            413 => Self::PayloadTooLarge,
            429 => Self::TooManyRequests,
            500 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Returns the message identifier shown to the user for this kind.
    #[must_use]
    pub const fn message_id(&self) -> MessageId {
        MessageId(match self {
            Self::IncorrectCredentials => "error.incorrect_credentials",
            Self::Unauthorized => "error.unauthorized",
            Self::NoCredentialsSupplied => "error.no_credentials_supplied",
            Self::RequestTimeout => "error.request_timeout",
            Self::Conflict => "error.conflict",
            Self::PayloadTooLarge => "error.payload_too_large",
            Self::TooManyRequests => "error.too_many_requests",
            Self::ServerError => "error.server_error",
            Self::NoConnectivity => "error.no_connectivity",
            Self::SerializationFailure => "error.serialization_failure",
            Self::Unknown => "error.unknown",
        })
    }

    /// Returns true if blindly retrying the identical request may succeed.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if the user must change their input before a retry is meaningful.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::IncorrectCredentials | Self::NoCredentialsSupplied | Self::Unauthorized
        )
    }

    /// Returns a human-readable title for this error type.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::IncorrectCredentials => "Incorrect username or password",
            Self::Unauthorized => "Session expired",
            Self::NoCredentialsSupplied => "Credentials required",
            Self::RequestTimeout => "Request timed out",
            Self::Conflict => "Conflict",
            Self::PayloadTooLarge => "Payload too large",
            Self::TooManyRequests => "Too many requests",
            Self::ServerError => "Server error",
            Self::NoConnectivity => "No connection",
            Self::SerializationFailure => "Unreadable response",
            Self::Unknown => "Unknown error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}
