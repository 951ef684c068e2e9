//! The per-saga state projection and its transition function.
//!
//! [`SagaState`] is a pure in-memory fold of a saga's journal. The only way
//! it advances is through [`apply_message`], a pure function that either
//! returns the successor state or rejects the message with a
//! [`TransitionError`]. States are copy-on-update: `apply_message` never
//! mutates its input, so published snapshots stay safe to read without
//! locks.
//!
//! Task progress is a monotonic flag lattice. The legal paths per task:
//!
//! ```text
//! happy:        ∅ → STARTED → STARTED|COMPLETED
//! compensated:  ∅ → STARTED → [STARTED|COMPLETED] → …|COMP_STARTED → …|COMP_COMPLETED
//! ```
//!
//! Compensation flags can only appear once the saga is aborted.

use std::collections::HashMap;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;
use crate::message::{SagaId, SagaMessage, SagaMessageType, TaskId};

/// Progress flags for a single task. Flags are only ever added, never
/// cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct TaskFlags(u8);

impl TaskFlags {
    /// No progress recorded.
    pub const NONE: TaskFlags = TaskFlags(0);
    /// A StartTask message was applied.
    pub const STARTED: TaskFlags = TaskFlags(1);
    /// An EndTask message was applied.
    pub const COMPLETED: TaskFlags = TaskFlags(1 << 1);
    /// A StartCompTask message was applied.
    pub const COMP_STARTED: TaskFlags = TaskFlags(1 << 2);
    /// An EndCompTask message was applied.
    pub const COMP_COMPLETED: TaskFlags = TaskFlags(1 << 3);

    /// True if every flag in `flags` is set in `self`.
    pub fn contains(self, flags: TaskFlags) -> bool {
        self.0 & flags.0 == flags.0
    }

    /// The raw bit pattern.
    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for TaskFlags {
    type Output = TaskFlags;

    fn bitor(self, rhs: TaskFlags) -> TaskFlags {
        TaskFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for TaskFlags {
    fn bitor_assign(&mut self, rhs: TaskFlags) {
        self.0 |= rhs.0;
    }
}

/// Opaque per-task payloads captured from the four task messages.
///
/// Stored verbatim and persisted with the journal; useful to applications
/// for results and debugging, never interpreted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskData {
    /// Data carried by the StartTask message, if any.
    pub task_start: Option<Vec<u8>>,
    /// Data carried by the EndTask message, if any.
    pub task_end: Option<Vec<u8>>,
    /// Data carried by the StartCompTask message, if any.
    pub comp_task_start: Option<Vec<u8>>,
    /// Data carried by the EndCompTask message, if any.
    pub comp_task_end: Option<Vec<u8>>,
}

/// In-memory projection of one saga's journal.
///
/// The saga id and job are immutable after creation; everything else grows
/// monotonically under [`apply_message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaState {
    saga_id: SagaId,
    job: Option<Vec<u8>>,

    /// Per-task progress flags.
    task_state: HashMap<TaskId, TaskFlags>,

    /// Per-task opaque payloads, populated when messages carry data.
    task_data: HashMap<TaskId, TaskData>,

    saga_aborted: bool,
    saga_completed: bool,
}

impl SagaState {
    /// Create the state a StartSaga message establishes.
    ///
    /// Rejects an empty saga id with an ill-formed-message error.
    pub fn new(saga_id: SagaId, job: Option<Vec<u8>>) -> Result<Self, TransitionError> {
        validate_saga_id(&saga_id)?;

        Ok(Self {
            saga_id,
            job,
            task_state: HashMap::new(),
            task_data: HashMap::new(),
            saga_aborted: false,
            saga_completed: false,
        })
    }

    /// The id of the saga this state represents.
    pub fn saga_id(&self) -> &SagaId {
        &self.saga_id
    }

    /// The opaque job definition supplied at creation.
    pub fn job(&self) -> Option<&[u8]> {
        self.job.as_deref()
    }

    /// Ids of every task this saga has recorded progress for.
    pub fn task_ids(&self) -> Vec<TaskId> {
        self.task_state.keys().cloned().collect()
    }

    /// Progress flags for a task; [`TaskFlags::NONE`] if unknown.
    pub fn task_flags(&self, task_id: &TaskId) -> TaskFlags {
        self.task_state.get(task_id).copied().unwrap_or_default()
    }

    /// True if the task has been started.
    pub fn is_task_started(&self, task_id: &TaskId) -> bool {
        self.task_flags(task_id).contains(TaskFlags::STARTED)
    }

    /// True if the task has been completed.
    pub fn is_task_completed(&self, task_id: &TaskId) -> bool {
        self.task_flags(task_id).contains(TaskFlags::COMPLETED)
    }

    /// True if the task's compensating task has been started.
    pub fn is_comp_task_started(&self, task_id: &TaskId) -> bool {
        self.task_flags(task_id).contains(TaskFlags::COMP_STARTED)
    }

    /// True if the task's compensating task has been completed.
    pub fn is_comp_task_completed(&self, task_id: &TaskId) -> bool {
        self.task_flags(task_id).contains(TaskFlags::COMP_COMPLETED)
    }

    /// Data supplied with the StartTask message.
    pub fn start_task_data(&self, task_id: &TaskId) -> Option<&[u8]> {
        self.task_data.get(task_id).and_then(|d| d.task_start.as_deref())
    }

    /// Data supplied with the EndTask message.
    pub fn end_task_data(&self, task_id: &TaskId) -> Option<&[u8]> {
        self.task_data.get(task_id).and_then(|d| d.task_end.as_deref())
    }

    /// Data supplied with the StartCompTask message.
    pub fn start_comp_task_data(&self, task_id: &TaskId) -> Option<&[u8]> {
        self.task_data
            .get(task_id)
            .and_then(|d| d.comp_task_start.as_deref())
    }

    /// Data supplied with the EndCompTask message.
    pub fn end_comp_task_data(&self, task_id: &TaskId) -> Option<&[u8]> {
        self.task_data
            .get(task_id)
            .and_then(|d| d.comp_task_end.as_deref())
    }

    /// True if an AbortSaga message has been applied.
    pub fn is_saga_aborted(&self) -> bool {
        self.saga_aborted
    }

    /// True if an EndSaga message has been applied.
    pub fn is_saga_completed(&self) -> bool {
        self.saga_completed
    }

    fn set_flags(&mut self, task_id: &TaskId, flags: TaskFlags) {
        *self.task_state.entry(task_id.clone()).or_default() |= flags;
    }

    fn add_task_data(&mut self, task_id: &TaskId, msg_type: SagaMessageType, data: Vec<u8>) {
        let entry = self.task_data.entry(task_id.clone()).or_default();

        match msg_type {
            SagaMessageType::StartTask => entry.task_start = Some(data),
            SagaMessageType::EndTask => entry.task_end = Some(data),
            SagaMessageType::StartCompTask => entry.comp_task_start = Some(data),
            SagaMessageType::EndCompTask => entry.comp_task_end = Some(data),
            _ => {}
        }
    }
}

/// Apply a message to a state, returning the successor state.
///
/// Pure and total: the input state is never mutated, and every outcome is a
/// value. A rejection means applying the message would produce an invalid
/// state (or the message itself is ill-formed); the reasons identify the
/// offending saga or task and the violated rule.
pub fn apply_message(state: &SagaState, msg: &SagaMessage) -> Result<SagaState, TransitionError> {
    if msg.msg_type == SagaMessageType::StartSaga {
        return Err(TransitionError::invalid_state(
            "Cannot apply a StartSaga Message to an already existing Saga",
        ));
    }

    if msg.saga_id != state.saga_id {
        return Err(TransitionError::invalid_message(format!(
            "sagaId {} & SagaMessage sagaId {} do not match",
            state.saga_id, msg.saga_id
        )));
    }

    let mut next = state.clone();

    match msg.msg_type {
        SagaMessageType::StartSaga => unreachable!("handled above"),

        SagaMessageType::EndSaga => {
            // A completed saga must have start/end pairs for every task, or
            // start/comp-start/comp-end pairs for every task once aborted.
            for task_id in state.task_state.keys() {
                if state.saga_aborted {
                    if !(state.is_comp_task_started(task_id)
                        && state.is_comp_task_completed(task_id))
                    {
                        return Err(TransitionError::invalid_state(format!(
                            "End Saga Message cannot be applied to an aborted Saga where Task {} has not completed its compensating Tasks",
                            task_id
                        )));
                    }
                } else if !state.is_task_completed(task_id) {
                    return Err(TransitionError::invalid_state(format!(
                        "End Saga Message cannot be applied to a Saga where Task {} has not completed",
                        task_id
                    )));
                }
            }

            next.saga_completed = true;
        }

        SagaMessageType::AbortSaga => {
            if state.is_saga_completed() {
                return Err(TransitionError::invalid_state(
                    "AbortSaga Message cannot be applied to a Completed Saga",
                ));
            }

            next.saga_aborted = true;
        }

        SagaMessageType::StartTask => {
            let task_id = require_task_id(msg)?;

            if state.is_saga_completed() {
                return Err(TransitionError::invalid_state(
                    "Cannot StartTask after Saga has been completed",
                ));
            }

            if state.is_saga_aborted() {
                return Err(TransitionError::invalid_state(
                    "Cannot StartTask after Saga has been aborted",
                ));
            }

            // Re-starting an unfinished task is a legal idempotent restart;
            // only completion disqualifies.
            if state.is_task_completed(task_id) {
                return Err(TransitionError::invalid_state(
                    "Cannot StartTask after it has been completed",
                ));
            }

            if let Some(data) = &msg.data {
                next.add_task_data(task_id, msg.msg_type, data.clone());
            }

            next.set_flags(task_id, TaskFlags::STARTED);
        }

        SagaMessageType::EndTask => {
            let task_id = require_task_id(msg)?;

            if state.is_saga_completed() {
                return Err(TransitionError::invalid_state(
                    "Cannot EndTask after Saga has been completed",
                ));
            }

            if state.is_saga_aborted() {
                return Err(TransitionError::invalid_state(
                    "Cannot EndTask after an Abort Saga Message",
                ));
            }

            if !state.is_task_started(task_id) {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a EndTask {} Message Before a StartTask {} Message",
                    task_id, task_id
                )));
            }

            if let Some(data) = &msg.data {
                next.add_task_data(task_id, msg.msg_type, data.clone());
            }

            next.set_flags(task_id, TaskFlags::COMPLETED);
        }

        SagaMessageType::StartCompTask => {
            let task_id = require_task_id(msg)?;

            if state.is_saga_completed() {
                return Err(TransitionError::invalid_state(
                    "Cannot StartCompTask after Saga has been completed",
                ));
            }

            // Compensating transactions only run against an aborted saga.
            if !state.is_saga_aborted() {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a StartCompTask {} Message when Saga has not been Aborted",
                    task_id
                )));
            }

            if !state.is_task_started(task_id) {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a StartCompTask {} Message Before a StartTask {} Message",
                    task_id, task_id
                )));
            }

            if state.is_comp_task_completed(task_id) {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot StartCompTask after it has been completed. taskId: {}",
                    task_id
                )));
            }

            if let Some(data) = &msg.data {
                next.add_task_data(task_id, msg.msg_type, data.clone());
            }

            next.set_flags(task_id, TaskFlags::COMP_STARTED);
        }

        SagaMessageType::EndCompTask => {
            let task_id = require_task_id(msg)?;

            if state.is_saga_completed() {
                return Err(TransitionError::invalid_state(
                    "Cannot EndCompTask after Saga has been completed",
                ));
            }

            if !state.is_saga_aborted() {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a EndCompTask {} Message when Saga has not been Aborted",
                    task_id
                )));
            }

            if !state.is_task_started(task_id) {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a EndCompTask {} Message Before a StartTask {} Message",
                    task_id, task_id
                )));
            }

            if !state.is_comp_task_started(task_id) {
                return Err(TransitionError::invalid_state(format!(
                    "Cannot have a EndCompTask {} Message Before a StartCompTask {} Message",
                    task_id, task_id
                )));
            }

            if let Some(data) = &msg.data {
                next.add_task_data(task_id, msg.msg_type, data.clone());
            }

            next.set_flags(task_id, TaskFlags::COMP_COMPLETED);
        }
    }

    Ok(next)
}

fn require_task_id(msg: &SagaMessage) -> Result<&TaskId, TransitionError> {
    match &msg.task_id {
        Some(task_id) if !task_id.as_str().is_empty() => Ok(task_id),
        _ => Err(TransitionError::invalid_message(
            "taskId cannot be the empty string",
        )),
    }
}

fn validate_saga_id(saga_id: &SagaId) -> Result<(), TransitionError> {
    if saga_id.as_str().is_empty() {
        Err(TransitionError::invalid_message(
            "sagaId cannot be the empty string",
        ))
    } else {
        Ok(())
    }
}
