//! In-memory implementation of SagaLog for testing.
//!
//! Thread-safe and ordering-faithful, but nothing is persisted: this is the
//! conformance reference for the port semantics and a convenience for unit
//! tests and local development. Never use it in production.

use std::collections::HashMap;

use parking_lot::RwLock;

use sagalog_core::error::SagaLogError;
use sagalog_core::message::{SagaId, SagaMessage};
use sagalog_core::port::SagaLog;

/// In-memory saga log.
///
/// # Thread Safety
///
/// A readers-writer lock guards the journal map: `start_saga` and
/// `log_message` take the write lock, `get_messages` and
/// `get_active_sagas` take the read lock. Callers never hold the lock
/// across await points, so unrelated sagas append concurrently without
/// deadlock risk.
///
/// # Semantics
///
/// - `start_saga` on an already-known saga overwrites the existing journal
///   (permissive by design here; durable backends should reject the
///   duplicate instead).
/// - `log_message` fails for a saga with no StartSaga on record.
/// - `get_messages` on an unknown saga returns an empty vector, not an
///   error.
#[derive(Debug, Default)]
pub struct InMemorySagaLog {
    sagas: RwLock<HashMap<SagaId, Vec<SagaMessage>>>,
}

impl InMemorySagaLog {
    /// Create a new, empty in-memory log.
    pub fn new() -> Self {
        Self {
            sagas: RwLock::new(HashMap::new()),
        }
    }

    /// Number of sagas on record.
    pub fn saga_count(&self) -> usize {
        self.sagas.read().len()
    }

    /// Total number of messages across all journals.
    pub fn message_count(&self) -> usize {
        self.sagas.read().values().map(|msgs| msgs.len()).sum()
    }

    /// Drop every journal (useful between test cases).
    pub fn clear(&self) {
        self.sagas.write().clear();
    }
}

/// Error type for in-memory log operations. The in-memory log itself never
/// fails; the type exists so the backend slot in [`SagaLogError`] is
/// inhabited for wrappers layered on top.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InMemorySagaLogError {
    #[error("Internal error: {0}")]
    Internal(String),
}

#[async_trait::async_trait]
impl SagaLog for InMemorySagaLog {
    type Error = InMemorySagaLogError;

    async fn start_saga(
        &self,
        saga_id: &SagaId,
        job: Option<&[u8]>,
    ) -> Result<(), SagaLogError<Self::Error>> {
        let start_msg = SagaMessage::start_saga(saga_id.clone(), job.map(|j| j.to_vec()));

        tracing::debug!(saga_id = %saga_id, "start saga journal");
        self.sagas
            .write()
            .insert(saga_id.clone(), vec![start_msg]);

        Ok(())
    }

    async fn log_message(&self, msg: &SagaMessage) -> Result<(), SagaLogError<Self::Error>> {
        let mut sagas = self.sagas.write();

        let msgs = sagas
            .get_mut(&msg.saga_id)
            .ok_or_else(|| SagaLogError::unstarted(msg.saga_id.clone()))?;

        tracing::debug!(
            saga_id = %msg.saga_id,
            msg_type = %msg.msg_type,
            task_id = msg.task_id.as_ref().map(|t| t.as_str()),
            "append saga message"
        );
        msgs.push(msg.clone());

        Ok(())
    }

    async fn get_messages(
        &self,
        saga_id: &SagaId,
    ) -> Result<Vec<SagaMessage>, SagaLogError<Self::Error>> {
        Ok(self
            .sagas
            .read()
            .get(saga_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_active_sagas(&self) -> Result<Vec<SagaId>, SagaLogError<Self::Error>> {
        Ok(self.sagas.read().keys().cloned().collect())
    }
}
