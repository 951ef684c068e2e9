//! The per-saga façade.
//!
//! A [`Saga`] binds one saga id to one [`SagaLog`] and owns the cached
//! [`SagaState`]. Every mutating operation runs the same critical section
//! under the saga's mutex:
//!
//! 1. validate the transition against the cached state,
//! 2. append the message to the log,
//! 3. commit the successor state.
//!
//! A rejection in step 1 touches nothing. A log failure in step 2 leaves
//! the cached state at its pre-attempt value, so retrying the operation is
//! always safe and log order always matches cached-state transition order.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::SagaError;
use crate::message::{SagaId, SagaMessage, TaskId};
use crate::port::SagaLog;
use crate::state::{apply_message, SagaState};
use crate::telemetry::SagaObserver;

/// Handle to a single running saga.
///
/// Cheap to share behind an `Arc`; all operations take `&self` and
/// serialize internally. State snapshots returned by [`state`](Saga::state)
/// are immutable once published and safe to read without any lock.
pub struct Saga<L: SagaLog> {
    saga_id: SagaId,
    log: Arc<L>,
    state: Mutex<Arc<SagaState>>,
    observer: Option<Arc<dyn SagaObserver>>,
}

impl<L: SagaLog> Saga<L> {
    pub(crate) fn from_state(
        state: SagaState,
        log: Arc<L>,
        observer: Option<Arc<dyn SagaObserver>>,
    ) -> Self {
        Self {
            saga_id: state.saga_id().clone(),
            log,
            state: Mutex::new(Arc::new(state)),
            observer,
        }
    }

    /// The id of this saga.
    pub fn saga_id(&self) -> &SagaId {
        &self.saga_id
    }

    /// A read-only snapshot of the current state.
    ///
    /// The snapshot is the state as of the moment of the call; later
    /// operations produce new states and never mutate snapshots already
    /// handed out.
    pub async fn state(&self) -> Arc<SagaState> {
        Arc::clone(&*self.state.lock().await)
    }

    /// Record that a forward task has started.
    pub async fn start_task(
        &self,
        task_id: TaskId,
        data: Option<Vec<u8>>,
    ) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::start_task(self.saga_id.clone(), task_id, data))
            .await
    }

    /// Record that a forward task has completed.
    pub async fn end_task(
        &self,
        task_id: TaskId,
        data: Option<Vec<u8>>,
    ) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::end_task(self.saga_id.clone(), task_id, data))
            .await
    }

    /// Record that a compensating task has started. Legal only once the
    /// saga is aborted.
    pub async fn start_comp_task(
        &self,
        task_id: TaskId,
        data: Option<Vec<u8>>,
    ) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::start_comp_task(
            self.saga_id.clone(),
            task_id,
            data,
        ))
        .await
    }

    /// Record that a compensating task has completed.
    pub async fn end_comp_task(
        &self,
        task_id: TaskId,
        data: Option<Vec<u8>>,
    ) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::end_comp_task(
            self.saga_id.clone(),
            task_id,
            data,
        ))
        .await
    }

    /// Abort the saga. Completed tasks must then be driven through their
    /// compensating tasks before the saga can end.
    pub async fn abort_saga(&self) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::abort_saga(self.saga_id.clone()))
            .await
    }

    /// Mark the saga completed. Requires every task completed, or every
    /// task compensated when the saga is aborted.
    pub async fn end_saga(&self) -> Result<(), SagaError<L::Error>> {
        self.log_and_apply(SagaMessage::end_saga(self.saga_id.clone()))
            .await
    }

    /// The validate → append → commit critical section.
    async fn log_and_apply(&self, msg: SagaMessage) -> Result<(), SagaError<L::Error>> {
        let mut current = self.state.lock().await;

        let next = match apply_message(&current, &msg) {
            Ok(next) => next,
            Err(reason) => {
                if let Some(observer) = &self.observer {
                    observer.on_rejected(&msg, &reason);
                }
                tracing::debug!(
                    saga_id = %self.saga_id,
                    msg_type = %msg.msg_type,
                    %reason,
                    "rejected saga message"
                );
                return Err(reason.into());
            }
        };

        // Append before publishing: a log failure must leave the cached
        // state at the pre-attempt value so the caller can retry.
        self.log.log_message(&msg).await.map_err(SagaError::Log)?;

        let next = Arc::new(next);
        *current = Arc::clone(&next);

        if let Some(observer) = &self.observer {
            observer.on_transition(&msg, &next);
        }
        tracing::debug!(
            saga_id = %self.saga_id,
            msg_type = %msg.msg_type,
            "committed saga message"
        );

        Ok(())
    }
}

impl<L: SagaLog> std::fmt::Debug for Saga<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Saga").field("saga_id", &self.saga_id).finish()
    }
}
