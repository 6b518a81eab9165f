//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the request pipeline and external systems.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod credential_persistence;
mod transport;

pub use credential_persistence::{CredentialPersistence, PersistenceError};
pub use transport::{RawResponse, Transport, TransportFault};
