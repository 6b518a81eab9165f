//! On-demand paging over offset/limit list endpoints.

mod feed;
mod pager;

pub use feed::{Demand, credential_reactive_pages, paged};
pub use pager::{Page, PageOutcome, Pager};

use std::future::Future;
use std::sync::Arc;

use anistream_domain::{ApiResult, PageRequest, PageResponse};

/// A list endpoint that can be loaded one page at a time.
pub trait PageSource<C, T>: Send + Sync {
    /// Loads the page described by `request`.
    fn load(
        &self,
        request: PageRequest<C>,
    ) -> impl Future<Output = ApiResult<PageResponse<T>>> + Send;
}

impl<C, T, S: PageSource<C, T>> PageSource<C, T> for Arc<S> {
    fn load(
        &self,
        request: PageRequest<C>,
    ) -> impl Future<Output = ApiResult<PageResponse<T>>> + Send {
        (**self).load(request)
    }
}

/// Page source backed by a closure. Built with [`page_source_fn`].
#[derive(Debug, Clone)]
pub struct FnPageSource<F>(F);

/// Wraps a closure returning a page future as a [`PageSource`].
pub const fn page_source_fn<F>(load: F) -> FnPageSource<F> {
    FnPageSource(load)
}

impl<C, T, F, Fut> PageSource<C, T> for FnPageSource<F>
where
    F: Fn(PageRequest<C>) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult<PageResponse<T>>> + Send,
{
    fn load(
        &self,
        request: PageRequest<C>,
    ) -> impl Future<Output = ApiResult<PageResponse<T>>> + Send {
        (self.0)(request)
    }
}
