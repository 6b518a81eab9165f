//! Authentication domain types

mod types;

pub use types::{AUTH_SCHEME, AuthState, CredentialToken, LoginCredentials};
