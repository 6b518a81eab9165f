//! Demand-driven page streams.

use std::sync::Arc;

use anistream_domain::{CredentialToken, ErrorKind};
use futures::future::ready;
use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::warn;

use super::{PageOutcome, PageSource, Pager};
use crate::auth::CredentialStore;
use crate::reactive::{Subscribable, SwitchToLatestExt, credential_reactive};

/// Signal from the consumer that it wants another page.
///
/// Signals raised while a page is loading coalesce into one, so the pager
/// never runs ahead of the consumer.
#[derive(Debug, Clone)]
pub struct Demand {
    signal: Arc<watch::Sender<u64>>,
}

impl Demand {
    /// Creates a demand signal.
    #[must_use]
    pub fn new() -> Self {
        let (signal, _) = watch::channel(0);
        Self {
            signal: Arc::new(signal),
        }
    }

    /// Asks for the next page.
    pub fn request_more(&self) {
        self.signal.send_modify(|count| *count = count.wrapping_add(1));
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.signal.subscribe()
    }
}

impl Default for Demand {
    fn default() -> Self {
        Self::new()
    }
}

/// Streams pages of `pager`, loading the first one immediately and one more
/// per [`Demand::request_more`].
///
/// Only loaded pages and failures are yielded. Dropping the stream cancels
/// the load in flight.
pub fn paged<C, T, S>(pager: Pager<C, T, S>, demand: &Demand) -> BoxStream<'static, PageOutcome<C, T>>
where
    C: Clone + PartialEq + Send + Sync + 'static,
    T: Send + 'static,
    S: PageSource<C, T> + 'static,
{
    WatchStream::new(demand.subscribe())
        .then(move |_| pager.request_more())
        .filter(|outcome| ready(outcome.is_delivery()))
        .boxed()
}

/// Streams pages that restart whenever the credential token or the criteria
/// change.
///
/// `build` creates the page source for a token (`None` when logged out). A
/// fresh pager starts at offset 0 for every token and every criteria value;
/// the previous pager and its in-flight load are dropped first.
///
/// A page rejected with [`ErrorKind::Unauthorized`] invalidates the token its
/// source was built with. The rejection itself is not yielded: the restart
/// under the logged-out source reports it.
pub fn credential_reactive_pages<C, T, S, W, B>(
    store: &CredentialStore,
    criteria: W,
    demand: &Demand,
    limit: usize,
    build: B,
) -> BoxStream<'static, PageOutcome<C, T>>
where
    C: Clone + PartialEq + Send + Sync + 'static,
    T: Send + 'static,
    S: PageSource<C, T> + 'static,
    W: Subscribable<C> + 'static,
    B: Fn(Option<CredentialToken>) -> S + Send + 'static,
{
    let demand = demand.clone();
    let session = store.clone();
    credential_reactive(store, move |token| {
        let source = Arc::new(build(token.clone()));
        let demand = demand.clone();
        let pages = criteria.subscribe().switch_map(move |criteria| {
            paged(Pager::new(Arc::clone(&source), criteria, limit), &demand)
        });

        let Some(token) = token else {
            return pages.boxed();
        };
        let session = session.clone();
        pages
            .filter_map(move |outcome| {
                let session = session.clone();
                let token = token.clone();
                async move {
                    if !is_rejection(&outcome) {
                        return Some(outcome);
                    }
                    // A superseded token is left alone; its successor restarts the stream.
                    if let Err(error) = session.invalidate(&token).await {
                        warn!(%error, "could not persist credential invalidation");
                    }
                    None
                }
            })
            .boxed()
    })
}

fn is_rejection<C, T>(outcome: &PageOutcome<C, T>) -> bool {
    matches!(
        outcome,
        PageOutcome::Failed { failure, .. } if failure.kind == ErrorKind::Unauthorized
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::paging::page_source_fn;
    use crate::testing::MemoryPersistence;
    use anistream_domain::{ApiResult, AuthState, PageRequest, PageResponse};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tokio::time::timeout;

    fn loaded_offset<C, T>(outcome: Option<PageOutcome<C, T>>) -> usize {
        match outcome {
            Some(PageOutcome::Loaded(page)) => page.offset,
            _ => panic!("expected a loaded page"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pages_follow_demand() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let requests = log.clone();
        let sizes = [20_usize, 20, 7];
        let source = page_source_fn(move |request: PageRequest<()>| {
            let size = sizes[requests.lock().len()];
            requests.lock().push(request.offset);
            async move { ApiResult::Success(PageResponse::new(vec![0_u8; size])) }
        });

        let demand = Demand::new();
        let mut pages = paged(Pager::new(source, (), 20), &demand);

        assert_eq!(loaded_offset(pages.next().await), 0);
        assert!(
            timeout(Duration::from_secs(1), pages.next())
                .await
                .is_err(),
            "no page without demand"
        );

        demand.request_more();
        assert_eq!(loaded_offset(pages.next().await), 20);
        demand.request_more();
        assert_eq!(loaded_offset(pages.next().await), 40);

        demand.request_more();
        demand.request_more();
        assert!(timeout(Duration::from_secs(1), pages.next()).await.is_err());
        assert_eq!(*log.lock(), vec![0, 20, 40]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_and_criteria_restart_paging() {
        let store = CredentialStore::empty(Arc::new(MemoryPersistence::default()));
        store.save("a").await.unwrap();
        let (criteria, criteria_rx) = watch::channel("one".to_string());
        let log = Arc::new(Mutex::new(Vec::new()));
        let requests = log.clone();

        let demand = Demand::new();
        let mut pages = credential_reactive_pages(
            &store,
            criteria_rx,
            &demand,
            2,
            move |token: Option<CredentialToken>| {
                let requests = requests.clone();
                page_source_fn(move |request: PageRequest<String>| {
                    let entry = (
                        token.as_ref().map(|token| token.as_str().to_string()),
                        request.criteria.clone(),
                        request.offset,
                    );
                    requests.lock().push(entry);
                    let authorized = token.is_some();
                    async move {
                        if authorized {
                            ApiResult::Success(PageResponse::new(vec![0_u8; 2]))
                        } else {
                            ApiResult::failure(ErrorKind::Unauthorized)
                        }
                    }
                })
            },
        );

        assert_eq!(loaded_offset(pages.next().await), 0);
        demand.request_more();
        assert_eq!(loaded_offset(pages.next().await), 2);

        criteria.send("two".to_string()).unwrap();
        assert_eq!(loaded_offset(pages.next().await), 0);

        store.save("b").await.unwrap();
        assert_eq!(loaded_offset(pages.next().await), 0);

        store.clear().await.unwrap();
        let Some(PageOutcome::Failed { failure, .. }) = pages.next().await else {
            panic!("logged-out source should fail");
        };
        assert_eq!(failure.kind, ErrorKind::Unauthorized);

        let bearer = |raw: &str| Some(format!("Bearer {raw}"));
        assert_eq!(
            *log.lock(),
            vec![
                (bearer("a"), "one".to_string(), 0),
                (bearer("a"), "one".to_string(), 2),
                (bearer("a"), "two".to_string(), 0),
                (bearer("b"), "two".to_string(), 0),
                (None, "two".to_string(), 0),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_page_invalidates_token() {
        let store = CredentialStore::empty(Arc::new(MemoryPersistence::default()));
        store.save("stale").await.unwrap();
        let (_criteria, criteria_rx) = watch::channel(());
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = sent.clone();

        let demand = Demand::new();
        let mut pages = credential_reactive_pages(
            &store,
            criteria_rx,
            &demand,
            20,
            move |token: Option<CredentialToken>| {
                let log = log.clone();
                page_source_fn(move |_: PageRequest<()>| {
                    if let Some(token) = &token {
                        log.lock().push(token.as_str().to_string());
                    }
                    async { ApiResult::<PageResponse<u8>>::failure(ErrorKind::Unauthorized) }
                })
            },
        );

        let Some(PageOutcome::Failed { failure, retry }) = pages.next().await else {
            panic!("expected the logged-out failure");
        };
        assert_eq!(failure.kind, ErrorKind::Unauthorized);
        assert!(retry.is_none());
        assert_eq!(store.auth_state(), AuthState::LoggedOut);

        demand.request_more();
        let next = pages.next().await;
        assert!(matches!(next, Some(PageOutcome::Failed { retry: None, .. })));
        assert_eq!(*sent.lock(), vec!["Bearer stale".to_string()]);
    }
}
