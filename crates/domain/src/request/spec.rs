//! API request specification type

use serde_json::Value;
use url::Url;

use super::HttpMethod;
use crate::auth::CredentialToken;
use crate::error::{DomainError, DomainResult};

/// Transport-agnostic description of a call to the streaming backend.
///
/// Paths are relative to the configured base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g. `anime` or `/episodes/12/stream`)
    pub path: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Optional JSON body
    pub body: Option<Value>,
    /// Normalized credential sent as the `Authorization` header
    pub authorization: Option<CredentialToken>,
}

impl ApiRequest {
    /// Creates a request with no query, body or credential.
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authorization: None,
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Creates a POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Appends a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((name.into(), value.to_string()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attaches the credential token.
    #[must_use]
    pub fn with_authorization(mut self, token: CredentialToken) -> Self {
        self.authorization = Some(token);
        self
    }

    /// Resolves the absolute URL against the given base, including the query string.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidUrl`] if the path cannot be joined onto the base.
    pub fn resolve_url(&self, base: &Url) -> DomainResult<Url> {
        let mut base = base.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let mut url = base
            .join(self.path.trim_start_matches('/'))
            .map_err(|e| DomainError::InvalidUrl(format!("{e}: {}", self.path)))?;

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(
                self.query
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            );
        }

        Ok(url)
    }
}
