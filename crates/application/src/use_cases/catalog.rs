//! Catalog browsing.

use std::future::Future;

use anistream_domain::{
    AnimeSummary, ApiRequest, ApiResult, CatalogFilter, CredentialToken, PageRequest, PageResponse,
};
use futures::stream::BoxStream;

use crate::api::ApiClient;
use crate::auth::CredentialStore;
use crate::paging::{Demand, PageOutcome, PageSource, credential_reactive_pages};
use crate::ports::Transport;
use crate::reactive::Subscribable;

/// The `GET /anime` list endpoint, bound to one credential token.
pub struct CatalogSource<T> {
    client: ApiClient<T>,
    token: Option<CredentialToken>,
}

impl<T: Transport> CatalogSource<T> {
    /// Creates a source issuing requests with `token`.
    #[must_use]
    pub const fn new(client: ApiClient<T>, token: Option<CredentialToken>) -> Self {
        Self { client, token }
    }

    /// Builds the list request for a page.
    #[must_use]
    pub fn request(page: &PageRequest<CatalogFilter>) -> ApiRequest {
        let mut request = ApiRequest::get("anime")
            .with_query("offset", page.offset)
            .with_query("limit", page.limit);
        if !page.criteria.query.is_empty() {
            request = request.with_query("search", &page.criteria.query);
        }
        for genre in &page.criteria.genres {
            request = request.with_query("genre", genre);
        }
        request
    }
}

impl<T: Transport> PageSource<CatalogFilter, AnimeSummary> for CatalogSource<T> {
    fn load(
        &self,
        request: PageRequest<CatalogFilter>,
    ) -> impl Future<Output = ApiResult<PageResponse<AnimeSummary>>> + Send {
        self.client
            .fetch_authenticated(Self::request(&request), self.token.clone())
    }
}

/// Use case streaming catalog pages for the current session and filter.
pub struct BrowseCatalog<T> {
    client: ApiClient<T>,
    store: CredentialStore,
    page_size: usize,
}

impl<T: Transport + 'static> BrowseCatalog<T> {
    /// Creates a new `BrowseCatalog` use case.
    #[must_use]
    pub const fn new(client: ApiClient<T>, store: CredentialStore, page_size: usize) -> Self {
        Self {
            client,
            store,
            page_size,
        }
    }

    /// Streams pages for the filters published by `filters`, one more per
    /// demand signal.
    ///
    /// Paging restarts at offset 0 on login, logout and every filter change.
    pub fn pages(
        &self,
        filters: impl Subscribable<CatalogFilter> + 'static,
        demand: &Demand,
    ) -> BoxStream<'static, PageOutcome<CatalogFilter, AnimeSummary>> {
        let client = self.client.clone();
        credential_reactive_pages(&self.store, filters, demand, self.page_size, move |token| {
            CatalogSource::new(client.clone(), token)
        })
    }
}
