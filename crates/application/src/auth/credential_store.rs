//! Observable credential storage.
//!
//! The token lives in a single `watch` slot. Writes go through one writer
//! path (persist, then publish) serialized by a lock; readers only ever see
//! immutable snapshots, in the order they were published.

use std::sync::Arc;

use anistream_domain::{AuthState, CredentialToken};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::{Mutex, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::CredentialPersistence;
use crate::reactive::Subscribable;

/// Facade over the persisted session token.
///
/// Cheap to clone; every clone shares the same slot.
#[derive(Clone)]
pub struct CredentialStore {
    inner: Arc<Inner>,
}

struct Inner {
    persistence: Arc<dyn CredentialPersistence>,
    slot: watch::Sender<Option<CredentialToken>>,
    writer: Mutex<()>,
}

impl CredentialStore {
    /// Opens the store, restoring a previously persisted token.
    ///
    /// A blank stored value is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be read.
    pub async fn open(persistence: Arc<dyn CredentialPersistence>) -> ApplicationResult<Self> {
        let restored = persistence
            .load()
            .await?
            .map(CredentialToken::from_normalized)
            .filter(|token| !token.is_blank());

        debug!(restored = restored.is_some(), "credential store opened");
        Ok(Self::with_token(persistence, restored))
    }

    /// Creates a store with an empty slot, without reading persistence.
    #[must_use]
    pub fn empty(persistence: Arc<dyn CredentialPersistence>) -> Self {
        Self::with_token(persistence, None)
    }

    fn with_token(
        persistence: Arc<dyn CredentialPersistence>,
        token: Option<CredentialToken>,
    ) -> Self {
        let (slot, _) = watch::channel(token);
        Self {
            inner: Arc::new(Inner {
                persistence,
                slot,
                writer: Mutex::new(()),
            }),
        }
    }

    /// Returns the current token.
    #[must_use]
    pub fn snapshot(&self) -> Option<CredentialToken> {
        self.inner.slot.borrow().clone()
    }

    /// Returns a receiver observing every token change.
    #[must_use]
    pub fn current_token(&self) -> watch::Receiver<Option<CredentialToken>> {
        self.inner.slot.subscribe()
    }

    /// Projects the current session state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        AuthState::from_token(self.inner.slot.borrow().as_ref())
    }

    /// Streams the session state, starting with the current one.
    ///
    /// Consecutive equal states are not repeated.
    pub fn auth_states(&self) -> BoxStream<'static, AuthState> {
        let mut last = None;
        WatchStream::new(self.current_token())
            .map(|token| AuthState::from_token(token.as_ref()))
            .filter(move |state| {
                let changed = last != Some(*state);
                last = Some(*state);
                futures::future::ready(changed)
            })
            .boxed()
    }

    /// Normalizes, persists and publishes a raw token from the login endpoint.
    ///
    /// Re-saving the current value publishes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be persisted; the slot is left unchanged.
    pub async fn save(&self, raw: &str) -> ApplicationResult<CredentialToken> {
        let token = CredentialToken::normalize(raw);
        let _writer = self.inner.writer.lock().await;

        self.inner.persistence.store(token.as_str()).await?;
        let changed = self.publish(Some(token.clone()));
        info!(changed, "credential saved");
        Ok(token)
    }

    /// Clears the token. Clearing an absent token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be removed. The slot
    /// is cleared regardless, so authenticated streams stop either way.
    pub async fn clear(&self) -> ApplicationResult<()> {
        let _writer = self.inner.writer.lock().await;
        self.clear_locked().await
    }

    /// Clears the token only if `token` is still the current one.
    ///
    /// Used when the server rejects a session: a rejection of a superseded
    /// token must not log out the session that replaced it.
    ///
    /// # Errors
    ///
    /// Returns an error if the persisted record cannot be removed.
    pub async fn invalidate(&self, token: &CredentialToken) -> ApplicationResult<bool> {
        let _writer = self.inner.writer.lock().await;
        if self.inner.slot.borrow().as_ref() != Some(token) {
            debug!("ignoring invalidation of a superseded credential");
            return Ok(false);
        }

        info!("server rejected the session, clearing credential");
        self.clear_locked().await?;
        Ok(true)
    }

    async fn clear_locked(&self) -> ApplicationResult<()> {
        if self.inner.slot.borrow().is_none() {
            return Ok(());
        }

        let persisted = self.inner.persistence.clear().await;
        self.publish(None);
        if let Err(error) = &persisted {
            warn!(%error, "credential cleared in memory but not on disk");
        }
        persisted.map_err(ApplicationError::from)
    }

    fn publish(&self, token: Option<CredentialToken>) -> bool {
        self.inner.slot.send_if_modified(|slot| {
            if *slot == token {
                false
            } else {
                *slot = token;
                true
            }
        })
    }
}

impl Subscribable<Option<CredentialToken>> for CredentialStore {
    fn subscribe(&self) -> BoxStream<'static, Option<CredentialToken>> {
        WatchStream::new(self.current_token()).boxed()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("auth_state", &self.auth_state())
            .finish_non_exhaustive()
    }
}
