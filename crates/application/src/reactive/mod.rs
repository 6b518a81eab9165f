//! Reactive combinators.
//!
//! [`switch_to_latest`] is the building block: whenever the upstream emits,
//! the active inner stream is dropped (cancelling whatever it was awaiting)
//! and a fresh one is built from the new value. Credential-reactive streams
//! are switch-to-latest over the credential token.

mod authenticated;
mod switch;

pub use authenticated::{credential_reactive, reactive_call};
pub use switch::{Subscribable, SwitchToLatest, SwitchToLatestExt, switch_to_latest};
