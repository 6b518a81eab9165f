//! Client Settings Domain Model
//!
//! Defines how the client reaches the streaming backend.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Largest page the backend accepts.
pub const MAX_PAGE_SIZE: usize = 100;

/// Connection and paging settings for the backend client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// Base URL every API path is resolved against.
    pub base_url: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Number of items requested per page.
    pub page_size: usize,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.anistream.app/v1".to_string(),
            request_timeout_ms: 30_000,
            page_size: 20,
            user_agent: "Anistream/0.1.0".to_string(),
        }
    }
}

impl ClientSettings {
    /// Parses the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is malformed or not http(s).
    pub fn base_url(&self) -> DomainResult<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DomainError::InvalidUrl(format!(
                "unsupported scheme `{other}`: {}",
                self.base_url
            ))),
        }
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> DomainResult<()> {
        self.base_url()?;

        if self.request_timeout_ms == 0 {
            return Err(DomainError::InvalidSetting {
                name: "request_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(DomainError::InvalidSetting {
                name: "page_size",
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}"),
            });
        }

        Ok(())
    }
}
