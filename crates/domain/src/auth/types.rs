//! Credential token and session state types

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Authorization scheme prepended to every stored token.
pub const AUTH_SCHEME: &str = "Bearer";

/// An opaque credential proving an authenticated session.
///
/// Always held in its normalized, scheme-prefixed form so it can be sent as
/// an `Authorization` header value as-is. Cloning is cheap: readers share one
/// immutable allocation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct CredentialToken(Arc<str>);

impl CredentialToken {
    /// Normalizes a raw token issued by the login endpoint.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self(Arc::from(format!("{AUTH_SCHEME} {raw}")))
    }

    /// Wraps a value that was already normalized (e.g. read back from storage).
    #[must_use]
    pub fn from_normalized(value: impl Into<String>) -> Self {
        Self(Arc::from(value.into()))
    }

    /// Returns the normalized header value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the token carries no credential beyond the scheme label.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        let value = self.0.trim();
        value
            .strip_prefix(AUTH_SCHEME)
            .unwrap_or(value)
            .trim()
            .is_empty()
    }
}

impl fmt::Debug for CredentialToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CredentialToken").field(&"<redacted>").finish()
    }
}

/// Whether a usable credential is currently stored.
///
/// Never stored on its own; always projected from the current token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No token, or a blank one.
    #[default]
    LoggedOut,
    /// A non-blank token is stored.
    LoggedIn,
}

impl AuthState {
    /// Projects the session state from the current token.
    #[must_use]
    pub fn from_token(token: Option<&CredentialToken>) -> Self {
        match token {
            Some(token) if !token.is_blank() => Self::LoggedIn,
            _ => Self::LoggedOut,
        }
    }

    /// Returns true if logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        matches!(self, Self::LoggedIn)
    }
}

/// Username and password entered on the login form.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    /// Account name or e-mail.
    pub username: String,
    /// Plain password, only ever sent to the login endpoint.
    pub password: String,
}

impl LoginCredentials {
    /// Creates a credential pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Returns true if both fields are non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.trim().is_empty()
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
