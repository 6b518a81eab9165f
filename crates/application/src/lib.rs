//! Anistream Application - Request pipeline
//!
//! Classifies every backend call into a typed result, keeps the session
//! token in one observable slot, restarts authenticated streams when it
//! changes, pages list endpoints on demand and turns failures into
//! user-facing effects with optional retries.

pub mod api;
pub mod auth;
pub mod classifier;
pub mod error;
pub mod paging;
pub mod ports;
pub mod reactive;
pub mod retry;
pub mod use_cases;

#[cfg(test)]
mod testing;

pub use api::ApiClient;
pub use auth::CredentialStore;
pub use classifier::{CallSite, classify, classify_fault, decode_json, safe_call, safe_login_call};
pub use error::{ApplicationError, ApplicationResult};
pub use paging::{
    Demand, FnPageSource, Page, PageOutcome, PageSource, Pager, credential_reactive_pages,
    page_source_fn, paged,
};
pub use ports::{CredentialPersistence, PersistenceError, RawResponse, Transport, TransportFault};
pub use reactive::{
    Subscribable, SwitchToLatest, SwitchToLatestExt, credential_reactive, reactive_call,
    switch_to_latest,
};
pub use retry::{PendingRetry, RetryAction, RetryCoordinator, UiEffect};
