//! Error types for saga coordination.
//!
//! Three layers of failure are kept apart:
//! - [`TransitionError`]: the transition function rejected a message. Caller
//!   bug; retrying the same message cannot succeed.
//! - [`SagaLogError`]: the log backend failed. Possibly transient; because
//!   the façade never advances its cached state on a log failure, retrying
//!   the operation is always safe.
//! - [`SagaError`]: the union surfaced by the façade and coordinator,
//!   including journal replay failures during recovery.

use crate::message::SagaId;
use thiserror::Error;

/// Rejection reasons from the transition function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The message itself is ill-formed (empty saga id or task id, saga id
    /// mismatch).
    #[error("InvalidSagaMessage: {0}")]
    InvalidSagaMessage(String),

    /// The message is well-formed but applying it would violate a state
    /// invariant.
    #[error("InvalidSagaState: {0}")]
    InvalidSagaState(String),
}

impl TransitionError {
    /// Create an ill-formed-message rejection.
    pub fn invalid_message(reason: impl Into<String>) -> Self {
        Self::InvalidSagaMessage(reason.into())
    }

    /// Create an illegal-transition rejection.
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidSagaState(reason.into())
    }

    /// The human-readable reason carried by this rejection.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidSagaMessage(reason) | Self::InvalidSagaState(reason) => reason,
        }
    }
}

/// Errors that can occur when operating on a saga log.
#[derive(Debug, Error)]
pub enum SagaLogError<E> {
    /// Append attempted for a saga with no StartSaga on record.
    #[error("Saga {saga_id} is not Started yet")]
    UnstartedSaga {
        /// The saga id the append was addressed to.
        saga_id: SagaId,
    },

    /// Backend-specific error; propagated unchanged to callers.
    #[error("Backend error: {0:?}")]
    Backend(E),
}

impl<E> SagaLogError<E> {
    /// Create an unstarted-saga error.
    pub fn unstarted(saga_id: SagaId) -> Self {
        Self::UnstartedSaga { saga_id }
    }

    /// Check if this is an unstarted-saga error.
    pub fn is_unstarted(&self) -> bool {
        matches!(self, Self::UnstartedSaga { .. })
    }
}

impl<E> From<E> for SagaLogError<E> {
    fn from(err: E) -> Self {
        SagaLogError::Backend(err)
    }
}

/// Errors surfaced by the saga façade and coordinator.
///
/// `E` is the backend error type of the [`SagaLog`](crate::port::SagaLog)
/// in use.
#[derive(Debug)]
pub enum SagaError<E> {
    /// The transition function rejected the operation. The cached state and
    /// the log are untouched.
    Transition(TransitionError),

    /// The log append failed. The cached state is unchanged, so the same
    /// operation can be retried.
    Log(SagaLogError<E>),

    /// A replayed journal message was rejected during recovery. Signals log
    /// corruption or a backward-incompatible transition change; fatal for
    /// the saga.
    Recovery {
        /// The saga whose journal failed to replay.
        saga_id: SagaId,
        /// The rejection the transition function produced.
        reason: TransitionError,
    },
}

// Display and Error are written by hand: the derive cannot express that
// the Log variant's formatting only needs `E: Debug`.
impl<E: std::fmt::Debug> std::fmt::Display for SagaError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transition(reason) => write!(f, "{}", reason),
            Self::Log(err) => write!(f, "Log error: {}", err),
            Self::Recovery { saga_id, reason } => {
                write!(f, "Recovery of saga {} failed: {}", saga_id, reason)
            }
        }
    }
}

impl<E: std::fmt::Debug> std::error::Error for SagaError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transition(reason) => Some(reason),
            Self::Recovery { reason, .. } => Some(reason),
            Self::Log(_) => None,
        }
    }
}

impl<E> From<TransitionError> for SagaError<E> {
    fn from(reason: TransitionError) -> Self {
        Self::Transition(reason)
    }
}

impl<E> SagaError<E> {
    /// True when retrying the failed operation can succeed (log errors
    /// only; rejections are deterministic).
    pub fn is_retry_safe(&self) -> bool {
        matches!(self, Self::Log(_))
    }
}
