//! Anistream Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer.

pub mod adapters;
pub mod persistence;
pub mod serialization;

pub use adapters::ReqwestTransport;
pub use persistence::{
    ENV_BASE_URL, ENV_PAGE_SIZE, ENV_TIMEOUT_MS, FileCredentialPersistence, SettingsError,
    SettingsRepository, apply_overrides,
};
pub use serialization::{SerializationError, from_json_bytes, to_json_pretty, to_json_pretty_bytes};
