//! Switch-to-latest stream combinator.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

/// A source of values that can be observed from its current value onwards.
pub trait Subscribable<T>: Send + Sync {
    /// Starts a new subscription. The first item is the current value.
    fn subscribe(&self) -> BoxStream<'static, T>;
}

impl<T> Subscribable<T> for watch::Receiver<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn subscribe(&self) -> BoxStream<'static, T> {
        WatchStream::new(self.clone()).boxed()
    }
}

/// Stream returned by [`switch_to_latest`].
#[must_use = "streams do nothing unless polled"]
pub struct SwitchToLatest<U, F, S> {
    upstream: Option<Pin<Box<U>>>,
    inner: Option<Pin<Box<S>>>,
    project: F,
}

// `project` is never pinned; both streams are boxed.
impl<U, F, S> Unpin for SwitchToLatest<U, F, S> {}

/// Maps every upstream value to an inner stream and forwards only the items
/// of the most recent one.
///
/// A new upstream value drops the previous inner stream before the next one
/// is built. Upstream is always drained before the inner stream is polled,
/// so an inner item is never delivered once a newer upstream value is ready.
/// The stream ends when upstream has ended and the last inner stream is done.
pub fn switch_to_latest<U, F, S>(upstream: U, project: F) -> SwitchToLatest<U, F, S>
where
    U: Stream,
    F: FnMut(U::Item) -> S,
    S: Stream,
{
    SwitchToLatest {
        upstream: Some(Box::pin(upstream)),
        inner: None,
        project,
    }
}

/// Method form of [`switch_to_latest`].
pub trait SwitchToLatestExt: Stream + Sized {
    /// See [`switch_to_latest`].
    fn switch_map<F, S>(self, project: F) -> SwitchToLatest<Self, F, S>
    where
        F: FnMut(Self::Item) -> S,
        S: Stream,
    {
        switch_to_latest(self, project)
    }
}

impl<U: Stream> SwitchToLatestExt for U {}

impl<U, F, S> Stream for SwitchToLatest<U, F, S>
where
    U: Stream,
    F: FnMut(U::Item) -> S,
    S: Stream,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        while let Some(upstream) = this.upstream.as_mut() {
            match upstream.as_mut().poll_next(cx) {
                Poll::Ready(Some(value)) => {
                    drop(this.inner.take());
                    this.inner = Some(Box::pin((this.project)(value)));
                }
                Poll::Ready(None) => this.upstream = None,
                Poll::Pending => break,
            }
        }

        if let Some(inner) = this.inner.as_mut() {
            match inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(item)) => return Poll::Ready(Some(item)),
                Poll::Ready(None) => this.inner = None,
                Poll::Pending => return Poll::Pending,
            }
        }

        if this.upstream.is_none() {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
