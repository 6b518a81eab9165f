//! Transport port

use std::future::Future;

use anistream_domain::{ApiRequest, StatusCode};
use thiserror::Error;

/// Raw outcome of a call that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawResponse<T> {
    /// The server answered with a success status.
    Success {
        /// Response status (2xx).
        status: StatusCode,
        /// Undecoded payload.
        payload: T,
    },
    /// The server answered with an error status.
    Error {
        /// Response status.
        status: StatusCode,
    },
}

impl<T> RawResponse<T> {
    /// Builds a response from a status, picking the variant from its class.
    pub fn from_status(status: impl Into<StatusCode>, payload: T) -> Self {
        let status = status.into();
        if status.is_success() {
            Self::Success { status, payload }
        } else {
            Self::Error { status }
        }
    }

    /// Returns the response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Success { status, .. } | Self::Error { status } => *status,
        }
    }
}

/// Faults raised before any response was received.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFault {
    /// DNS resolution failed.
    #[error("DNS resolution failed for {host}: {message}")]
    DnsError {
        /// The hostname that failed to resolve.
        host: String,
        /// Error message from the resolver.
        message: String,
    },

    /// Connection was refused by the server.
    #[error("connection refused by {host}:{port}")]
    ConnectionRefused {
        /// Target host.
        host: String,
        /// Target port.
        port: u16,
    },

    /// Connection could not be established or was dropped.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout that was exceeded.
        timeout_ms: u64,
    },

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

impl TransportFault {
    /// Returns true for name-resolution and connection faults.
    #[must_use]
    pub const fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::DnsError { .. } | Self::ConnectionRefused { .. } | Self::ConnectionFailed(_)
        )
    }
}

/// Port for sending requests to the streaming backend.
///
/// Implementations resolve the request against their base URL, attach the
/// normalized credential as an opaque `Authorization` value, and report
/// either a status-coded response or a [`TransportFault`]. Dropping the
/// returned future must abort the underlying network operation.
pub trait Transport: Send + Sync {
    /// Sends a request and returns the raw, undecoded outcome.
    ///
    /// # Errors
    ///
    /// Returns a fault if no response was received.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<RawResponse<Vec<u8>>, TransportFault>> + Send;
}
