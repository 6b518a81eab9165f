//! Authentication module for the Anistream client.
//!
//! This module provides:
//! - The credential store facade: one observable token slot backed by a
//!   persistence port
//! - Session state projection for the presentation layer

mod credential_store;

pub use credential_store::CredentialStore;
