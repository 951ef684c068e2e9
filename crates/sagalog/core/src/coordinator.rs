//! The saga coordinator: factory and recovery entry point.
//!
//! A [`SagaCoordinator`] wraps one shared [`SagaLog`] and hands out
//! [`Saga`] façades, either for brand-new sagas ([`make_saga`]) or for
//! sagas recovered from the journal after a crash
//! ([`recover_saga_state`] / [`recover_saga`]). Recovery is a left fold of
//! the journal through the transition function; a journal that replays
//! illegally is reported as corruption.
//!
//! [`make_saga`]: SagaCoordinator::make_saga
//! [`recover_saga_state`]: SagaCoordinator::recover_saga_state
//! [`recover_saga`]: SagaCoordinator::recover_saga

use std::sync::Arc;

use crate::error::{SagaError, TransitionError};
use crate::message::{SagaId, SagaMessage, SagaMessageType};
use crate::port::SagaLog;
use crate::saga::Saga;
use crate::state::{apply_message, SagaState};
use crate::telemetry::SagaObserver;

/// Factory for saga façades over one shared log.
///
/// The log is shared by every saga created here; unrelated sagas progress
/// in parallel with no coordination beyond the log's own thread safety.
pub struct SagaCoordinator<L: SagaLog> {
    log: Arc<L>,
    observer: Option<Arc<dyn SagaObserver>>,
}

impl<L: SagaLog> SagaCoordinator<L> {
    /// Create a coordinator over the given log.
    pub fn new(log: Arc<L>) -> Self {
        Self {
            log,
            observer: None,
        }
    }

    /// Attach a transition observer; every façade created afterwards
    /// reports to it.
    pub fn with_observer(mut self, observer: Arc<dyn SagaObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The shared log.
    pub fn log(&self) -> &Arc<L> {
        &self.log
    }

    /// Create a new saga: durably journal its StartSaga message and return
    /// the façade.
    ///
    /// Rejects an empty saga id before touching the log.
    pub async fn make_saga(
        &self,
        saga_id: SagaId,
        job: Option<Vec<u8>>,
    ) -> Result<Saga<L>, SagaError<L::Error>> {
        let state = SagaState::new(saga_id.clone(), job.clone())?;

        self.log
            .start_saga(&saga_id, job.as_deref())
            .await
            .map_err(SagaError::Log)?;

        tracing::info!(saga_id = %saga_id, "saga started");

        Ok(Saga::from_state(
            state,
            Arc::clone(&self.log),
            self.observer.clone(),
        ))
    }

    /// Build a façade around a state recovered elsewhere, without touching
    /// the log.
    pub fn rehydrate_saga(&self, state: SagaState) -> Saga<L> {
        Saga::from_state(state, Arc::clone(&self.log), self.observer.clone())
    }

    /// Recover a saga's state by replaying its journal.
    ///
    /// Returns `Ok(None)` for a saga the log has never seen. A journal
    /// that exists but replays illegally is a [`SagaError::Recovery`]:
    /// either the log is corrupt or the transition rules changed
    /// incompatibly underneath it.
    pub async fn recover_saga_state(
        &self,
        saga_id: &SagaId,
    ) -> Result<Option<SagaState>, SagaError<L::Error>> {
        let messages = self
            .log
            .get_messages(saga_id)
            .await
            .map_err(SagaError::Log)?;

        if messages.is_empty() {
            return Ok(None);
        }

        let state = replay(&messages).map_err(|reason| {
            tracing::error!(saga_id = %saga_id, %reason, "saga journal failed to replay");
            SagaError::Recovery {
                saga_id: saga_id.clone(),
                reason,
            }
        })?;

        tracing::info!(
            saga_id = %saga_id,
            messages = messages.len(),
            "saga state recovered"
        );

        Ok(Some(state))
    }

    /// Recover a saga and return a live façade for it.
    pub async fn recover_saga(
        &self,
        saga_id: &SagaId,
    ) -> Result<Option<Saga<L>>, SagaError<L::Error>> {
        Ok(self
            .recover_saga_state(saga_id)
            .await?
            .map(|state| self.rehydrate_saga(state)))
    }

    /// Every saga the log has on record, for a cold-start recovery sweep.
    pub async fn active_sagas(&self) -> Result<Vec<SagaId>, SagaError<L::Error>> {
        self.log.get_active_sagas().await.map_err(SagaError::Log)
    }
}

impl<L: SagaLog> Clone for SagaCoordinator<L> {
    fn clone(&self) -> Self {
        Self {
            log: Arc::clone(&self.log),
            observer: self.observer.clone(),
        }
    }
}

impl<L: SagaLog> std::fmt::Debug for SagaCoordinator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaCoordinator").finish_non_exhaustive()
    }
}

/// Fold an ordered journal into the state it describes.
///
/// The first message must be the StartSaga that created the saga; every
/// later message is applied through the transition function. Replaying the
/// same journal always yields the same state.
pub fn replay(messages: &[SagaMessage]) -> Result<SagaState, TransitionError> {
    let first = match messages.first() {
        Some(first) => first,
        None => {
            return Err(TransitionError::invalid_state(
                "cannot replay an empty journal",
            ))
        }
    };

    if first.msg_type != SagaMessageType::StartSaga {
        return Err(TransitionError::invalid_state(format!(
            "journal for saga {} does not begin with a StartSaga Message",
            first.saga_id
        )));
    }

    let mut state = SagaState::new(first.saga_id.clone(), first.data.clone())?;

    for msg in &messages[1..] {
        state = apply_message(&state, msg)?;
    }

    Ok(state)
}
