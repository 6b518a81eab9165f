//! Turning failures into user-facing effects.

mod action;
mod coordinator;

pub use action::RetryAction;
pub use coordinator::{PendingRetry, RetryCoordinator, UiEffect};
