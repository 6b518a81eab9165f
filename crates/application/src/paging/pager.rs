//! Offset-sequenced page loader.
//!
//! A [`Pager`] owns the cursor of one paged list: the criteria, the next
//! offset and whether the sequence is exhausted. At most one load is in
//! flight at a time, so pages always arrive in increasing offset order.
//! Every load carries a ticket and the generation it was issued under; a
//! result whose ticket or generation no longer matches is discarded.

use std::marker::PhantomData;
use std::sync::Arc;

use anistream_domain::{ApiFailure, ApiResult, PageRequest, PagingState};
use futures::FutureExt;
use futures::future::{AbortHandle, Abortable, BoxFuture};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::debug;

use super::PageSource;
use crate::retry::RetryAction;

/// A successfully loaded page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Offset the page was requested at.
    pub offset: usize,
    /// Items, in server order.
    pub items: Vec<T>,
    /// The page came back short; no further loads will be issued.
    pub is_last: bool,
}

/// Result of asking the pager for a page.
#[derive(Debug)]
pub enum PageOutcome<C, T> {
    /// The page was loaded and the cursor advanced.
    Loaded(Page<T>),
    /// The load failed.
    Failed {
        /// Classified failure.
        failure: ApiFailure,
        /// Re-issues the same `(criteria, offset, limit)` load. Present iff
        /// the failure is recoverable.
        retry: Option<RetryAction<PageRequest<C>, PageOutcome<C, T>>>,
    },
    /// The same page is already being loaded; no request was issued.
    Pending,
    /// The sequence is exhausted; no request was issued.
    Exhausted,
    /// The request or its result belongs to a superseded position.
    Discarded,
}

impl<C, T> PageOutcome<C, T> {
    /// Returns the loaded page, if any.
    #[must_use]
    pub fn page(self) -> Option<Page<T>> {
        match self {
            Self::Loaded(page) => Some(page),
            _ => None,
        }
    }

    /// Returns true for outcomes a consumer has to react to.
    #[must_use]
    pub const fn is_delivery(&self) -> bool {
        matches!(self, Self::Loaded(_) | Self::Failed { .. })
    }
}

struct InFlight {
    ticket: u64,
    abort: AbortHandle,
}

struct Cursor<C> {
    criteria: C,
    generation: u64,
    next_offset: usize,
    exhausted: bool,
    in_flight: Option<InFlight>,
    next_ticket: u64,
}

struct Shared<C, T, S> {
    source: S,
    limit: usize,
    cursor: Mutex<Cursor<C>>,
    state: watch::Sender<PagingState>,
    _items: PhantomData<fn() -> T>,
}

impl<C, T, S> Shared<C, T, S> {
    fn set_state(&self, state: PagingState) {
        self.state.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }
}

/// Loads the pages of one list on demand.
///
/// Cheap to clone; clones drive the same cursor.
pub struct Pager<C, T, S> {
    shared: Arc<Shared<C, T, S>>,
}

impl<C, T, S> Clone for Pager<C, T, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C, T, S> Pager<C, T, S>
where
    C: Clone + PartialEq + Send + Sync + 'static,
    T: Send + 'static,
    S: PageSource<C, T> + 'static,
{
    /// Creates a pager positioned at offset 0. A zero `limit` is raised to 1.
    pub fn new(source: S, criteria: C, limit: usize) -> Self {
        let (state, _) = watch::channel(PagingState::IDLE);
        Self {
            shared: Arc::new(Shared {
                source,
                limit: limit.max(1),
                cursor: Mutex::new(Cursor {
                    criteria,
                    generation: 0,
                    next_offset: 0,
                    exhausted: false,
                    in_flight: None,
                    next_ticket: 0,
                }),
                state,
                _items: PhantomData,
            }),
        }
    }

    /// Page size used for every request.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.shared.limit
    }

    /// Current criteria.
    #[must_use]
    pub fn criteria(&self) -> C {
        self.shared.cursor.lock().criteria.clone()
    }

    /// Returns true once a short page has been loaded for the current criteria.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.shared.cursor.lock().exhausted
    }

    /// Current loading indicator.
    #[must_use]
    pub fn state(&self) -> PagingState {
        *self.shared.state.borrow()
    }

    /// Observes the loading indicator.
    #[must_use]
    pub fn paging_state(&self) -> watch::Receiver<PagingState> {
        self.shared.state.subscribe()
    }

    /// The request the next load will issue.
    #[must_use]
    pub fn next_request(&self) -> PageRequest<C> {
        let cursor = self.shared.cursor.lock();
        PageRequest::new(cursor.criteria.clone(), cursor.next_offset, self.shared.limit)
    }

    /// Loads the next page, if the sequence is not exhausted.
    pub fn request_more(&self) -> BoxFuture<'static, PageOutcome<C, T>> {
        self.load(self.next_request())
    }

    /// Loads the page described by `request`.
    ///
    /// Only the request at the current position is issued. A request for a
    /// page that is already loading is coalesced into the running load and
    /// reports [`PageOutcome::Pending`]. Dropping the returned future cancels
    /// the network call and frees the slot.
    pub fn load(&self, request: PageRequest<C>) -> BoxFuture<'static, PageOutcome<C, T>> {
        let pager = self.clone();
        async move { pager.run(request).await }.boxed()
    }

    async fn run(&self, request: PageRequest<C>) -> PageOutcome<C, T> {
        let shared = &self.shared;
        let (ticket, generation, registration) = {
            let mut cursor = shared.cursor.lock();
            if request.criteria != cursor.criteria
                || request.offset != cursor.next_offset
                || request.limit != shared.limit
            {
                debug!(offset = request.offset, "ignoring request for a superseded position");
                return PageOutcome::Discarded;
            }
            if cursor.exhausted {
                return PageOutcome::Exhausted;
            }
            if cursor.in_flight.is_some() {
                debug!(offset = request.offset, "page already loading");
                return PageOutcome::Pending;
            }

            let (abort, registration) = AbortHandle::new_pair();
            cursor.next_ticket += 1;
            let ticket = cursor.next_ticket;
            cursor.in_flight = Some(InFlight { ticket, abort });
            (ticket, cursor.generation, registration)
        };

        shared.set_state(PagingState::LOADING);
        debug!(offset = request.offset, limit = request.limit, "loading page");

        let mut guard = InFlightGuard {
            cursor: &shared.cursor,
            state: &shared.state,
            ticket,
            armed: true,
        };
        let loaded = Abortable::new(shared.source.load(request.clone()), registration).await;
        guard.armed = false;

        let mut cursor = shared.cursor.lock();
        let current = cursor
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.ticket == ticket);
        if current {
            cursor.in_flight = None;
        }

        let result = match loaded {
            Ok(result) if current && cursor.generation == generation => result,
            _ => {
                debug!(offset = request.offset, "discarding stale page");
                return PageOutcome::Discarded;
            }
        };

        match result {
            ApiResult::Success(response) => {
                let is_last = response.is_last(shared.limit);
                cursor.next_offset = request.offset + response.len();
                cursor.exhausted = is_last;
                drop(cursor);

                shared.set_state(PagingState::IDLE);
                debug!(offset = request.offset, items = response.len(), is_last, "page loaded");
                PageOutcome::Loaded(Page {
                    offset: request.offset,
                    items: response.items,
                    is_last,
                })
            }
            ApiResult::Failure(failure) => {
                drop(cursor);

                shared.set_state(PagingState::ERROR);
                debug!(offset = request.offset, %failure, "page load failed");
                let retry = failure.is_recoverable().then(|| {
                    let pager = self.clone();
                    RetryAction::new(request, move |request| pager.load(request))
                });
                PageOutcome::Failed { failure, retry }
            }
        }
    }

    /// Switches to new criteria, restarting the sequence at offset 0.
    ///
    /// Setting the current criteria again is a no-op. A load in flight for
    /// the old criteria is cancelled.
    pub fn set_criteria(&self, criteria: C) {
        let mut cursor = self.shared.cursor.lock();
        if cursor.criteria == criteria {
            return;
        }
        cursor.criteria = criteria;
        self.restart(cursor);
    }

    /// Restarts the current criteria from offset 0.
    pub fn refresh(&self) {
        let cursor = self.shared.cursor.lock();
        self.restart(cursor);
    }

    fn restart(&self, mut cursor: parking_lot::MutexGuard<'_, Cursor<C>>) {
        cursor.generation += 1;
        cursor.next_offset = 0;
        cursor.exhausted = false;
        if let Some(in_flight) = cursor.in_flight.take() {
            in_flight.abort.abort();
            debug!("cancelled in-flight page load");
        }
        drop(cursor);
        self.shared.set_state(PagingState::IDLE);
    }
}

impl<C, T, S> std::fmt::Debug for Pager<C, T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cursor = self.shared.cursor.lock();
        f.debug_struct("Pager")
            .field("limit", &self.shared.limit)
            .field("next_offset", &cursor.next_offset)
            .field("exhausted", &cursor.exhausted)
            .finish_non_exhaustive()
    }
}

/// Frees the in-flight slot if the load is dropped before it completes.
struct InFlightGuard<'a, C> {
    cursor: &'a Mutex<Cursor<C>>,
    state: &'a watch::Sender<PagingState>,
    ticket: u64,
    armed: bool,
}

impl<C> Drop for InFlightGuard<'_, C> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut cursor = self.cursor.lock();
        if cursor
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.ticket == self.ticket)
        {
            cursor.in_flight = None;
            drop(cursor);
            self.state.send_replace(PagingState::IDLE);
            debug!("page load dropped before completion");
        }
    }
}
