//! Saga journal messages.
//!
//! A [`SagaMessage`] is the unit appended to a [`SagaLog`](crate::port::SagaLog).
//! The full, ordered message sequence for a saga is its source of truth: folding
//! it through [`apply_message`](crate::state::apply_message) reconstructs the
//! [`SagaState`](crate::state::SagaState) exactly.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Saga identifier type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SagaId(pub String);

impl SagaId {
    /// Create a saga ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new random saga ID.
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SagaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SagaId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Task identifier type, unique within one saga.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl TaskId {
    /// Create a task ID from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// All message types in the saga journal.
///
/// Saga-level messages (`StartSaga`, `EndSaga`, `AbortSaga`) carry no task id;
/// task-level messages require one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaMessageType {
    /// A saga has been created. Always the first message in a journal.
    StartSaga,
    /// The saga reached its terminal state.
    EndSaga,
    /// The saga was aborted; compensation may begin.
    AbortSaga,
    /// A forward task has started.
    StartTask,
    /// A forward task has completed.
    EndTask,
    /// A compensating task has started.
    StartCompTask,
    /// A compensating task has completed.
    EndCompTask,
}

impl SagaMessageType {
    /// Returns true if this message type refers to an individual task.
    pub fn is_task_message(&self) -> bool {
        matches!(
            self,
            Self::StartTask | Self::EndTask | Self::StartCompTask | Self::EndCompTask
        )
    }

    /// Get the snake_case string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartSaga => "start_saga",
            Self::EndSaga => "end_saga",
            Self::AbortSaga => "abort_saga",
            Self::StartTask => "start_task",
            Self::EndTask => "end_task",
            Self::StartCompTask => "start_comp_task",
            Self::EndCompTask => "end_comp_task",
        }
    }

    /// Get the compact u8 representation (for binary codecs).
    pub(crate) fn to_compact_u8(self) -> u8 {
        match self {
            Self::StartSaga => 0,
            Self::EndSaga => 1,
            Self::AbortSaga => 2,
            Self::StartTask => 10,
            Self::EndTask => 11,
            Self::StartCompTask => 12,
            Self::EndCompTask => 13,
        }
    }

    /// Convert u8 back to a message type (for deserialization).
    pub(crate) fn from_compact_u8(n: u8) -> Option<Self> {
        match n {
            0 => Some(Self::StartSaga),
            1 => Some(Self::EndSaga),
            2 => Some(Self::AbortSaga),
            10 => Some(Self::StartTask),
            11 => Some(Self::EndTask),
            12 => Some(Self::StartCompTask),
            13 => Some(Self::EndCompTask),
            _ => None,
        }
    }
}

impl std::str::FromStr for SagaMessageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start_saga" => Ok(Self::StartSaga),
            "end_saga" => Ok(Self::EndSaga),
            "abort_saga" => Ok(Self::AbortSaga),
            "start_task" => Ok(Self::StartTask),
            "end_task" => Ok(Self::EndTask),
            "start_comp_task" => Ok(Self::StartCompTask),
            "end_comp_task" => Ok(Self::EndCompTask),
            _ => Err(format!("Unknown saga message type: {}", s)),
        }
    }
}

impl std::fmt::Display for SagaMessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single immutable record in a saga's journal.
///
/// `data` is opaque to the saga layer: it is stored on the state projection
/// and round-trips byte for byte through any conforming log, but is never
/// parsed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaMessage {
    /// The saga this message belongs to.
    pub saga_id: SagaId,

    /// Message type.
    pub msg_type: SagaMessageType,

    /// Task the message refers to. `None` for saga-level messages.
    pub task_id: Option<TaskId>,

    /// Optional opaque payload; meaning depends on `msg_type`.
    pub data: Option<Vec<u8>>,
}

impl SagaMessage {
    /// Message that creates a saga with an opaque job definition.
    pub fn start_saga(saga_id: SagaId, job: Option<Vec<u8>>) -> Self {
        Self {
            saga_id,
            msg_type: SagaMessageType::StartSaga,
            task_id: None,
            data: job,
        }
    }

    /// Message that marks the saga completed.
    pub fn end_saga(saga_id: SagaId) -> Self {
        Self {
            saga_id,
            msg_type: SagaMessageType::EndSaga,
            task_id: None,
            data: None,
        }
    }

    /// Message that aborts the saga.
    pub fn abort_saga(saga_id: SagaId) -> Self {
        Self {
            saga_id,
            msg_type: SagaMessageType::AbortSaga,
            task_id: None,
            data: None,
        }
    }

    /// Message that records a forward task starting.
    pub fn start_task(saga_id: SagaId, task_id: TaskId, data: Option<Vec<u8>>) -> Self {
        Self::task_message(saga_id, SagaMessageType::StartTask, task_id, data)
    }

    /// Message that records a forward task completing.
    pub fn end_task(saga_id: SagaId, task_id: TaskId, data: Option<Vec<u8>>) -> Self {
        Self::task_message(saga_id, SagaMessageType::EndTask, task_id, data)
    }

    /// Message that records a compensating task starting.
    pub fn start_comp_task(saga_id: SagaId, task_id: TaskId, data: Option<Vec<u8>>) -> Self {
        Self::task_message(saga_id, SagaMessageType::StartCompTask, task_id, data)
    }

    /// Message that records a compensating task completing.
    pub fn end_comp_task(saga_id: SagaId, task_id: TaskId, data: Option<Vec<u8>>) -> Self {
        Self::task_message(saga_id, SagaMessageType::EndCompTask, task_id, data)
    }

    fn task_message(
        saga_id: SagaId,
        msg_type: SagaMessageType,
        task_id: TaskId,
        data: Option<Vec<u8>>,
    ) -> Self {
        Self {
            saga_id,
            msg_type,
            task_id: Some(task_id),
            data,
        }
    }
}
