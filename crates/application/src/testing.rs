//! Test doubles shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use anistream_domain::ApiRequest;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::ports::{
    CredentialPersistence, PersistenceError, RawResponse, Transport, TransportFault,
};

/// Outcome of one scripted call.
pub struct Scripted {
    pub delay: Duration,
    pub outcome: Result<RawResponse<Vec<u8>>, TransportFault>,
}

impl Scripted {
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(RawResponse::from_status(status, body.to_string().into_bytes())),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Ok(RawResponse::from_status(status, Vec::new())),
        }
    }

    pub fn fault(fault: TransportFault) -> Self {
        Self {
            delay: Duration::ZERO,
            outcome: Err(fault),
        }
    }

    pub const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = dyn Fn(&ApiRequest) -> Scripted + Send + Sync;

/// Transport answering from a handler and recording every request it was sent.
pub struct ScriptedTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<ApiRequest>>,
    completed: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(handler: impl Fn(&ApiRequest) -> Scripted + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        })
    }

    /// Answers calls in order from a fixed queue; an exhausted queue answers 500.
    pub fn queue(responses: Vec<Scripted>) -> Arc<Self> {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::new(move |_| {
            queue
                .lock()
                .pop_front()
                .unwrap_or_else(|| Scripted::status(500))
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Number of calls that ran to completion (not cancelled).
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    async fn send(
        &self,
        request: ApiRequest,
    ) -> Result<RawResponse<Vec<u8>>, TransportFault> {
        let scripted = (self.handler)(&request);
        self.requests.lock().push(request);
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        scripted.outcome
    }
}

/// In-memory credential persistence with write-failure injection.
#[derive(Default)]
pub struct MemoryPersistence {
    value: Mutex<Option<String>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryPersistence {
    pub fn with_value(value: &str) -> Arc<Self> {
        let persistence = Self::default();
        *persistence.value.lock() = Some(value.to_string());
        Arc::new(persistence)
    }

    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), PersistenceError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io(std::io::Error::other("disk full")));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl CredentialPersistence for MemoryPersistence {
    async fn load(&self) -> Result<Option<String>, PersistenceError> {
        Ok(self.value())
    }

    async fn store(&self, token: &str) -> Result<(), PersistenceError> {
        self.check()?;
        *self.value.lock() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.check()?;
        *self.value.lock() = None;
        Ok(())
    }
}
