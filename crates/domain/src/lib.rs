//! Anistream Domain - Core request pipeline types
//!
//! This crate defines the domain model shared by every repository of the
//! Anistream client: the closed error taxonomy, the typed call result,
//! credential and paging types, and client settings.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod catalog;
pub mod error;
pub mod error_kind;
pub mod outcome;
pub mod paging;
pub mod request;
pub mod response;
pub mod settings;

pub use auth::{AUTH_SCHEME, AuthState, CredentialToken, LoginCredentials};
pub use catalog::{AnimeSummary, CatalogFilter, EpisodeId, StreamSource, UserProfile};
pub use error::{DomainError, DomainResult};
pub use error_kind::{ErrorKind, MessageId};
pub use outcome::{ApiFailure, ApiResult};
pub use paging::{PageRequest, PageResponse, PagingState};
pub use request::{ApiRequest, HttpMethod};
pub use response::StatusCode;
pub use settings::ClientSettings;
