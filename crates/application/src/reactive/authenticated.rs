//! Credential-reactive streams.

use std::future::Future;

use anistream_domain::{ApiResult, CredentialToken, ErrorKind};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::switch::{Subscribable, SwitchToLatestExt};
use crate::auth::CredentialStore;

/// Restarts `producer` every time the credential token changes.
///
/// The producer receives `None` when no usable token is stored; blank tokens
/// are reported as `None`. The previous producer stream is dropped before
/// the next one is built, so nothing fetched under a superseded token
/// reaches the consumer.
pub fn credential_reactive<R, F, S>(
    tokens: &impl Subscribable<Option<CredentialToken>>,
    mut producer: F,
) -> BoxStream<'static, R>
where
    F: FnMut(Option<CredentialToken>) -> S + Send + 'static,
    S: Stream<Item = R> + Send + 'static,
    R: 'static,
{
    tokens
        .subscribe()
        .switch_map(move |token: Option<CredentialToken>| {
            producer(token.filter(|token| !token.is_blank()))
        })
        .boxed()
}

/// Runs a single authenticated call under the current token, again after
/// every token change.
///
/// With no token the call is not issued and the stream yields
/// [`ErrorKind::Unauthorized`]. If the server rejects the token, the token
/// is invalidated in `store`; the restart that follows yields that same
/// logged-out failure, so the rejected response itself is never emitted.
pub fn reactive_call<R, F, Fut>(store: &CredentialStore, mut call: F) -> BoxStream<'static, ApiResult<R>>
where
    F: FnMut(CredentialToken) -> Fut + Send + 'static,
    Fut: Future<Output = ApiResult<R>> + Send + 'static,
    R: Send + 'static,
{
    let session = store.clone();
    credential_reactive(store, move |token| {
        let attempt = token.map(|token| {
            let pending = call(token.clone());
            (token, pending)
        });
        let session = session.clone();

        stream::once(async move {
            let Some((token, pending)) = attempt else {
                debug!("no credential, failing fast");
                return Some(ApiResult::failure(ErrorKind::Unauthorized));
            };

            let result = pending.await;
            if result.error_kind() != Some(ErrorKind::Unauthorized) {
                return Some(result);
            }

            match session.invalidate(&token).await {
                Ok(_) => {}
                Err(error) => warn!(%error, "could not persist credential invalidation"),
            }
            None
        })
        .filter_map(futures::future::ready)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::MemoryPersistence;
    use anistream_domain::{ApiFailure, AuthState};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn store() -> CredentialStore {
        CredentialStore::empty(Arc::new(MemoryPersistence::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_change_before_first_emission() {
        let store = store();
        store.save("a").await.unwrap();

        let completed = Arc::new(AtomicUsize::new(0));
        let counter = completed.clone();
        let mut stream = reactive_call(&store, move |token| {
            let completed = counter.clone();
            async move {
                sleep(Duration::from_millis(100)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                ApiResult::Success(token.as_str().to_string())
            }
        });

        assert!(futures::poll!(stream.next()).is_pending());
        store.save("b").await.unwrap();

        assert_eq!(
            stream.next().await,
            Some(ApiResult::Success("Bearer b".to_string()))
        );
        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert!(
            timeout(Duration::from_secs(1), stream.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_absent_token_fails_fast() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut stream = reactive_call(&store, move |_token| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { ApiResult::Success(()) }
        });

        assert_eq!(
            stream.next().await,
            Some(ApiResult::Failure(ApiFailure::new(ErrorKind::Unauthorized)))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        store.save("abc").await.unwrap();
        assert_eq!(stream.next().await, Some(ApiResult::Success(())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_clears_credential() {
        let store = store();
        store.save("expired").await.unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let mut stream = reactive_call(&store, move |_token| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { ApiResult::<u32>::failure(ErrorKind::Unauthorized) }
        });

        assert_eq!(
            stream.next().await,
            Some(ApiResult::failure(ErrorKind::Unauthorized))
        );
        assert_eq!(store.auth_state(), AuthState::LoggedOut);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(
            timeout(Duration::from_secs(1), stream.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_blank_token_is_absent() {
        let store = store();
        store.save("  ").await.unwrap();

        let seen: Vec<bool> = credential_reactive(&store, |token| {
            stream::iter([token.is_some()])
        })
        .take(1)
        .collect()
        .await;
        assert_eq!(seen, vec![false]);
    }
}
