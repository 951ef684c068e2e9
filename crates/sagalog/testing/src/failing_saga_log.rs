//! Fault-injection wrapper around the in-memory log.
//!
//! Used to exercise the façade's failure discipline: a failed append must
//! leave the cached state at its pre-attempt value, and retrying the same
//! operation must succeed once the log recovers.

use std::sync::atomic::{AtomicUsize, Ordering};

use sagalog_core::error::SagaLogError;
use sagalog_core::message::{SagaId, SagaMessage};
use sagalog_core::port::SagaLog;

use crate::memory_saga_log::{InMemorySagaLog, InMemorySagaLogError};

/// Error type for [`FailingSagaLog`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailingSagaLogError {
    /// A scripted failure fired.
    #[error("injected log failure")]
    Injected,

    /// The underlying in-memory log failed.
    #[error(transparent)]
    Memory(#[from] InMemorySagaLogError),
}

/// An in-memory log that fails the next N appends on request.
///
/// Failures are consumed by `log_message` only; reads always succeed, so a
/// test can inspect the journal while the log is "down".
#[derive(Debug, Default)]
pub struct FailingSagaLog {
    inner: InMemorySagaLog,
    failures_remaining: AtomicUsize,
}

impl FailingSagaLog {
    /// Create a new log with no scripted failures.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` appends fail with an injected backend error.
    pub fn fail_next_appends(&self, n: usize) {
        self.failures_remaining.store(n, Ordering::SeqCst);
    }

    /// Scripted failures not yet consumed.
    pub fn pending_failures(&self) -> usize {
        self.failures_remaining.load(Ordering::SeqCst)
    }

    /// Access to the wrapped in-memory log.
    pub fn inner(&self) -> &InMemorySagaLog {
        &self.inner
    }

    fn consume_failure(&self) -> bool {
        self.failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

fn remap<T>(result: Result<T, SagaLogError<InMemorySagaLogError>>) -> Result<T, SagaLogError<FailingSagaLogError>> {
    result.map_err(|err| match err {
        SagaLogError::UnstartedSaga { saga_id } => SagaLogError::UnstartedSaga { saga_id },
        SagaLogError::Backend(e) => SagaLogError::Backend(e.into()),
    })
}

#[async_trait::async_trait]
impl SagaLog for FailingSagaLog {
    type Error = FailingSagaLogError;

    async fn start_saga(
        &self,
        saga_id: &SagaId,
        job: Option<&[u8]>,
    ) -> Result<(), SagaLogError<Self::Error>> {
        remap(self.inner.start_saga(saga_id, job).await)
    }

    async fn log_message(&self, msg: &SagaMessage) -> Result<(), SagaLogError<Self::Error>> {
        if self.consume_failure() {
            return Err(SagaLogError::Backend(FailingSagaLogError::Injected));
        }

        remap(self.inner.log_message(msg).await)
    }

    async fn get_messages(
        &self,
        saga_id: &SagaId,
    ) -> Result<Vec<SagaMessage>, SagaLogError<Self::Error>> {
        remap(self.inner.get_messages(saga_id).await)
    }

    async fn get_active_sagas(&self) -> Result<Vec<SagaId>, SagaLogError<Self::Error>> {
        remap(self.inner.get_active_sagas().await)
    }
}
