//! Result classification for transport calls.
//!
//! Every repository call goes through [`safe_call`] (or [`safe_login_call`]
//! on the login endpoint). The wrapped call either raises a
//! [`TransportFault`] or returns a status-coded [`RawResponse`]; both are
//! turned into a typed [`ApiResult`] here, and nothing above this layer ever
//! sees a raw fault.

use std::fmt::Display;
use std::future::Future;

use anistream_domain::{ApiResult, ErrorKind, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::ports::{RawResponse, TransportFault};

/// How the call-site reads an ambiguous status.
///
/// A 401 means "bad session" on authenticated endpoints but "bad password"
/// on the login endpoint, where no token is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallSite {
    /// Any endpoint called with the session token.
    #[default]
    Authenticated,
    /// The username/password login endpoint.
    Login,
}

impl CallSite {
    /// Classifies an error-coded status for this call-site.
    #[must_use]
    pub const fn classify_status(self, status: StatusCode) -> ErrorKind {
        match (self, status.as_u16()) {
            (Self::Login, 401) => ErrorKind::IncorrectCredentials,
            (_, code) => ErrorKind::from_status(code),
        }
    }
}

/// Classifies a fault raised before any response arrived.
#[must_use]
pub const fn classify_fault(fault: &TransportFault) -> ErrorKind {
    match fault {
        TransportFault::DnsError { .. }
        | TransportFault::ConnectionRefused { .. }
        | TransportFault::ConnectionFailed(_) => ErrorKind::NoConnectivity,
        TransportFault::Timeout { .. } => ErrorKind::RequestTimeout,
        TransportFault::InvalidRequest(_) | TransportFault::Other(_) => ErrorKind::Unknown,
    }
}

/// Classifies an already-awaited call outcome.
///
/// `map` runs only for a success status; if it fails the result is
/// [`ErrorKind::SerializationFailure`].
pub fn classify<P, R, E, M>(
    site: CallSite,
    outcome: Result<RawResponse<P>, TransportFault>,
    map: M,
) -> ApiResult<R>
where
    M: FnOnce(P) -> Result<R, E>,
    E: Display,
{
    match outcome {
        Err(fault) => {
            let kind = classify_fault(&fault);
            debug!(?kind, %fault, "transport fault");
            ApiResult::failure(kind)
        }
        Ok(RawResponse::Success { payload, .. }) => match map(payload) {
            Ok(value) => ApiResult::Success(value),
            Err(error) => {
                warn!(%error, "response payload could not be mapped");
                ApiResult::failure(ErrorKind::SerializationFailure)
            }
        },
        Ok(RawResponse::Error { status }) => {
            let kind = site.classify_status(status);
            debug!(?kind, status = status.as_u16(), ?site, "error status");
            ApiResult::failure(kind)
        }
    }
}

/// Runs a call from an authenticated call-site and classifies its outcome.
pub async fn safe_call<P, R, E, F, Fut, M>(call: F, map: M) -> ApiResult<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<RawResponse<P>, TransportFault>>,
    M: FnOnce(P) -> Result<R, E>,
    E: Display,
{
    classify(CallSite::Authenticated, call().await, map)
}

/// Runs a call against the login endpoint, where 401 means incorrect credentials.
pub async fn safe_login_call<P, R, E, F, Fut, M>(call: F, map: M) -> ApiResult<R>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<RawResponse<P>, TransportFault>>,
    M: FnOnce(P) -> Result<R, E>,
    E: Display,
{
    classify(CallSite::Login, call().await, map)
}

/// Decodes a JSON payload; the usual `map` for backend responses.
///
/// # Errors
///
/// Returns the decode error if the payload does not match `T`.
pub fn decode_json<T: DeserializeOwned>(payload: Vec<u8>) -> Result<T, serde_json::Error> {
    serde_json::from_slice(&payload)
}
