//! Retryable calls.
//!
//! A [`RetryAction`] pairs a call with its parameters so a failed call can
//! be inspected and issued again unchanged.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

type Operation<P, O> = dyn Fn(P) -> BoxFuture<'static, O> + Send + Sync;

/// A re-invocable call together with the exact parameters it was issued with.
///
/// Invoking it any number of times re-issues the call with the same
/// parameters; it never changes them.
pub struct RetryAction<P, O> {
    params: P,
    op: Arc<Operation<P, O>>,
}

impl<P, O> RetryAction<P, O> {
    /// Captures `params` and the operation to run them through.
    pub fn new<F, Fut>(params: P, op: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        Self {
            params,
            op: Arc::new(move |params| op(params).boxed()),
        }
    }

    /// Parameters the call will be re-issued with.
    pub const fn params(&self) -> &P {
        &self.params
    }
}

impl<P: Clone, O> RetryAction<P, O> {
    /// Re-issues the call.
    pub fn invoke(&self) -> BoxFuture<'static, O> {
        (self.op)(self.params.clone())
    }
}

impl<P: Clone, O> Clone for RetryAction<P, O> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            op: Arc::clone(&self.op),
        }
    }
}

impl<P: fmt::Debug, O> fmt::Debug for RetryAction<P, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAction")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
