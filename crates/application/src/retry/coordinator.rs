//! Failure surfacing.
//!
//! The coordinator is the only place a classified failure becomes something
//! the user sees: a message identifier plus, for recoverable failures, a way
//! to try again. Effects are queued on an unbounded channel and drained by
//! the presentation layer in order.

use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

use anistream_domain::{ApiFailure, ApiResult, CredentialToken, ErrorKind, MessageId, PageRequest};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::RetryAction;
use crate::auth::CredentialStore;
use crate::paging::PageOutcome;

type RetryRun = dyn Fn() -> BoxFuture<'static, ApiResult<()>> + Send + Sync;

/// A retry handed to the presentation layer, with the payload type erased.
#[derive(Clone)]
pub struct PendingRetry {
    label: String,
    run: Arc<RetryRun>,
}

impl PendingRetry {
    /// Wraps a re-invocable call. `label` describes it for logs.
    pub fn new<F, Fut>(label: impl Into<String>, run: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            run: Arc::new(move || run().boxed()),
        }
    }

    /// Description of the retried call.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Re-issues the call. A failing retry queues its own effect.
    pub fn invoke(&self) -> BoxFuture<'static, ApiResult<()>> {
        (self.run)()
    }
}

impl Debug for PendingRetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRetry")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A failure to show to the user.
#[derive(Debug, Clone)]
pub struct UiEffect {
    /// Failure category.
    pub kind: ErrorKind,
    /// Message to display.
    pub message_id: MessageId,
    /// Present iff the failure is recoverable.
    pub retry: Option<PendingRetry>,
}

/// Publishes failures as [`UiEffect`]s.
#[derive(Debug, Clone)]
pub struct RetryCoordinator {
    effects: mpsc::UnboundedSender<UiEffect>,
    session: Option<CredentialStore>,
}

impl RetryCoordinator {
    /// Creates a coordinator and the receiving end of its effect queue.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UiEffect>) {
        let (effects, receiver) = mpsc::unbounded_channel();
        (
            Self {
                effects,
                session: None,
            },
            receiver,
        )
    }

    /// Binds the credential store whose session an `Unauthorized` failure ends.
    #[must_use]
    pub fn with_session(mut self, store: CredentialStore) -> Self {
        self.session = Some(store);
        self
    }

    /// Runs `action`, reporting its failure if it fails.
    ///
    /// The result is returned unchanged. An `Unauthorized` failure
    /// invalidates the token that was current when the call started, so a
    /// late rejection never ends a session opened in the meantime. Dropping
    /// the future before the call completes reports nothing.
    pub fn run<P, R>(&self, action: RetryAction<P, ApiResult<R>>) -> BoxFuture<'static, ApiResult<R>>
    where
        P: Clone + Debug + Send + Sync + 'static,
        R: Send + 'static,
    {
        let coordinator = self.clone();
        async move {
            let sent_with = coordinator.session.as_ref().and_then(CredentialStore::snapshot);
            let result = action.invoke().await;
            if let ApiResult::Failure(failure) = &result {
                if failure.kind == ErrorKind::Unauthorized {
                    coordinator.end_session(sent_with.as_ref()).await;
                }
                coordinator.report(*failure, &action).await;
            }
            result
        }
        .boxed()
    }

    /// Reports a failure of `action`.
    ///
    /// A retry is attached only for recoverable kinds; it re-runs `action`
    /// through this coordinator with the same parameters.
    pub async fn report<P, R>(&self, failure: ApiFailure, action: &RetryAction<P, ApiResult<R>>)
    where
        P: Clone + Debug + Send + Sync + 'static,
        R: Send + 'static,
    {
        let retry = failure.is_recoverable().then(|| {
            let coordinator = self.clone();
            let action = action.clone();
            PendingRetry::new(format!("{:?}", action.params()), move || {
                coordinator
                    .run(action.clone())
                    .map(|result| result.map(|_| ()))
            })
        });
        self.report_with(failure, retry).await;
    }

    /// Reports a failed page load.
    ///
    /// The pager only hands out a retry for recoverable failures. Invoking
    /// the published retry reloads the same page and reports a repeated
    /// failure the same way.
    pub fn report_page<C, T>(
        &self,
        failure: ApiFailure,
        retry: Option<RetryAction<PageRequest<C>, PageOutcome<C, T>>>,
    ) -> BoxFuture<'static, ()>
    where
        C: Clone + Debug + Send + Sync + 'static,
        T: Send + 'static,
    {
        let coordinator = self.clone();
        async move {
            let pending = retry.map(|retry| {
                let label = format!("{:?}", retry.params());
                let coordinator = coordinator.clone();
                PendingRetry::new(label, move || {
                    let coordinator = coordinator.clone();
                    let retry = retry.clone();
                    async move {
                        match retry.invoke().await {
                            PageOutcome::Failed { failure, retry } => {
                                coordinator.report_page(failure, retry).await;
                                ApiResult::Failure(failure)
                            }
                            _ => ApiResult::Success(()),
                        }
                    }
                })
            });
            coordinator.report_with(failure, pending).await;
        }
        .boxed()
    }

    /// Publishes a failure with an already erased retry.
    ///
    /// The retry is dropped for terminal kinds. Session handling is left to
    /// the caller, which alone knows the token the call was sent with.
    pub async fn report_with(&self, failure: ApiFailure, retry: Option<PendingRetry>) {
        if failure.is_recoverable() && retry.is_none() {
            warn!(kind = ?failure.kind, "recoverable failure reported without a retry");
        }

        let effect = UiEffect {
            kind: failure.kind,
            message_id: failure.message_id,
            retry: retry.filter(|_| failure.is_recoverable()),
        };
        debug!(
            kind = ?effect.kind,
            retry = effect.retry.is_some(),
            "publishing failure"
        );
        if self.effects.send(effect).is_err() {
            debug!("effect receiver dropped, failure not shown");
        }
    }

    async fn end_session(&self, sent_with: Option<&CredentialToken>) {
        let (Some(store), Some(token)) = (&self.session, sent_with) else {
            return;
        };
        match store.invalidate(token).await {
            Ok(true) => info!("session rejected, logged out"),
            Ok(false) => debug!("rejection of a superseded session ignored"),
            Err(error) => warn!(%error, "failed to clear rejected credential"),
        }
    }
}
