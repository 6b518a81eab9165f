//! Transport implementation using reqwest.
//!
//! This adapter implements the `Transport` port: it resolves an
//! [`ApiRequest`] against the configured base URL, sends it and hands back
//! the raw status and payload. Classification happens in the application
//! layer; this adapter only distinguishes "got a response" from the faults
//! raised before one arrived.

use std::error::Error as _;
use std::time::Duration;

use anistream_application::ports::{RawResponse, Transport, TransportFault};
use anistream_domain::{ApiRequest, ClientSettings, HttpMethod, StatusCode};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

/// Backend transport built on `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
    timeout_ms: u64,
}

impl ReqwestTransport {
    /// Creates a transport from client settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportFault::InvalidRequest`] if the settings are invalid,
    /// or [`TransportFault::Other`] if the HTTP client cannot be created.
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportFault> {
        settings
            .validate()
            .map_err(|e| TransportFault::InvalidRequest(e.to_string()))?;
        let base_url = settings
            .base_url()
            .map_err(|e| TransportFault::InvalidRequest(e.to_string()))?;

        let client = Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| TransportFault::Other(e.to_string()))?;

        Ok(Self::with_client(client, base_url, settings.request_timeout_ms))
    }

    /// Creates a transport with a custom reqwest client.
    #[must_use]
    pub const fn with_client(client: Client, base_url: Url, timeout_ms: u64) -> Self {
        Self {
            client,
            base_url,
            timeout_ms,
        }
    }

    /// Base URL paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        }
    }

    /// Maps reqwest errors to transport faults.
    ///
    /// Connect errors are told apart by their cause chain, since reqwest
    /// only reports "error sending request" at the top level.
    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> TransportFault {
        if error.is_timeout() {
            return TransportFault::Timeout { timeout_ms };
        }

        let message = Self::describe(error);
        if error.is_connect() {
            let host = error
                .url()
                .and_then(|u| u.host_str())
                .unwrap_or("unknown")
                .to_string();
            let lowered = message.to_lowercase();

            if lowered.contains("dns") || lowered.contains("resolve") {
                return TransportFault::DnsError { host, message };
            }
            if lowered.contains("refused") {
                return TransportFault::ConnectionRefused {
                    host,
                    port: error
                        .url()
                        .and_then(Url::port_or_known_default)
                        .unwrap_or(80),
                };
            }
            return TransportFault::ConnectionFailed(message);
        }

        if error.is_builder() {
            return TransportFault::InvalidRequest(message);
        }

        TransportFault::Other(message)
    }

    fn describe(error: &reqwest::Error) -> String {
        let mut message = error.to_string();
        let mut source = error.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}

impl Transport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<RawResponse<Vec<u8>>, TransportFault> {
        let url = request
            .resolve_url(&self.base_url)
            .map_err(|e| TransportFault::InvalidRequest(e.to_string()))?;
        debug!(method = %request.method, %url, "sending");

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url)
            .timeout(Duration::from_millis(self.timeout_ms))
            .header(ACCEPT, "application/json");

        if let Some(token) = &request.authorization {
            builder = builder.header(AUTHORIZATION, token.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?;

        let status = StatusCode::new(response.status().as_u16());
        if !status.is_success() {
            debug!(%status, "error status");
            return Ok(RawResponse::Error { status });
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, self.timeout_ms))?
            .to_vec();

        Ok(RawResponse::Success { status, payload })
    }
}
