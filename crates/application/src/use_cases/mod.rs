//! Application use cases (business logic orchestration).

mod catalog;
mod login;
mod logout;
mod profile;
mod resolve_stream;

pub use catalog::{BrowseCatalog, CatalogSource};
pub use login::{Login, LoginResponse};
pub use logout::Logout;
pub use profile::WatchProfile;
pub use resolve_stream::ResolveStream;
