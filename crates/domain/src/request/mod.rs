//! Outgoing API request description

mod method;
mod spec;

pub use method::HttpMethod;
pub use spec::ApiRequest;
