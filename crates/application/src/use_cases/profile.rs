//! Account profile.

use anistream_domain::{ApiRequest, ApiResult, UserProfile};
use futures::stream::BoxStream;

use crate::api::ApiClient;
use crate::auth::CredentialStore;
use crate::ports::Transport;
use crate::reactive::reactive_call;

/// Use case observing the profile of whoever is logged in.
pub struct WatchProfile<T> {
    client: ApiClient<T>,
    store: CredentialStore,
}

impl<T: Transport + 'static> WatchProfile<T> {
    /// Creates a new `WatchProfile` use case.
    #[must_use]
    pub const fn new(client: ApiClient<T>, store: CredentialStore) -> Self {
        Self { client, store }
    }

    /// Fetches `GET /me` now and again after every login or logout.
    ///
    /// While logged out the stream yields a single `Unauthorized` failure.
    pub fn stream(&self) -> BoxStream<'static, ApiResult<UserProfile>> {
        let client = self.client.clone();
        reactive_call(&self.store, move |token| {
            let client = client.clone();
            async move {
                client
                    .fetch_authenticated(ApiRequest::get("me"), Some(token))
                    .await
            }
        })
    }
}
