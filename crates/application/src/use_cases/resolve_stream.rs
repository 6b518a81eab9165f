//! Episode playback resolution.

use anistream_domain::{ApiRequest, ApiResult, EpisodeId, StreamSource};

use crate::api::ApiClient;
use crate::auth::CredentialStore;
use crate::ports::Transport;
use crate::retry::{RetryAction, RetryCoordinator};

/// Use case resolving an episode to a playable media location.
///
/// Failures are reported through the retry coordinator.
pub struct ResolveStream<T> {
    client: ApiClient<T>,
    store: CredentialStore,
    coordinator: RetryCoordinator,
}

impl<T: Transport + 'static> ResolveStream<T> {
    /// Creates a new `ResolveStream` use case.
    #[must_use]
    pub const fn new(
        client: ApiClient<T>,
        store: CredentialStore,
        coordinator: RetryCoordinator,
    ) -> Self {
        Self {
            client,
            store,
            coordinator,
        }
    }

    /// The retryable call for `episode`.
    ///
    /// Each invocation uses the token current at that time.
    pub fn action(&self, episode: EpisodeId) -> RetryAction<EpisodeId, ApiResult<StreamSource>> {
        let client = self.client.clone();
        let store = self.store.clone();
        RetryAction::new(episode, move |episode| {
            let client = client.clone();
            let token = store.snapshot();
            async move {
                let request = ApiRequest::get(format!("episodes/{episode}/stream"));
                client.fetch_authenticated(request, token).await
            }
        })
    }

    /// Resolves `episode`.
    pub async fn execute(&self, episode: EpisodeId) -> ApiResult<StreamSource> {
        self.coordinator.run(self.action(episode)).await
    }
}
