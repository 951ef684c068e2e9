//! # sagalog-core
//!
//! Core saga coordination library with zero infrastructure dependencies.
//! Applications drive long-lived, multi-step distributed transactions
//! through a journaled state machine with compensating rollback: every
//! state transition is validated by a pure transition function and appended
//! to a pluggable [`SagaLog`] before it becomes visible, so a crash at any
//! point is recoverable by replay.
//!
//! ## Modules
//!
//! - [`message`]: [`SagaMessage`], [`SagaMessageType`], [`SagaId`], [`TaskId`]
//! - [`state`]: [`SagaState`] and the pure [`apply_message`] transition function
//! - [`port`]: the [`SagaLog`] port durable backends implement
//! - [`saga`]: the [`Saga`] façade (validate → append → commit)
//! - [`coordinator`]: [`SagaCoordinator`] factory and journal replay
//! - [`codec`]: [`MessageCodec`] reference codecs for backends
//! - [`telemetry`]: [`SagaObserver`] hook and tracing bootstrap
//! - [`error`]: error taxonomy
//!
//! ## The state machine
//!
//! ```rust
//! use sagalog_core::{apply_message, SagaId, SagaMessage, SagaState, TaskId};
//!
//! let id = SagaId::from("order-17");
//! let state = SagaState::new(id.clone(), Some(b"order payload".to_vec())).unwrap();
//!
//! let state = apply_message(
//!     &state,
//!     &SagaMessage::start_task(id.clone(), TaskId::from("charge-card"), None),
//! )
//! .unwrap();
//! let state = apply_message(
//!     &state,
//!     &SagaMessage::end_task(id.clone(), TaskId::from("charge-card"), Some(b"txn-9".to_vec())),
//! )
//! .unwrap();
//! let state = apply_message(&state, &SagaMessage::end_saga(id)).unwrap();
//!
//! assert!(state.is_saga_completed());
//! ```
//!
//! Aborting a saga flips it onto the compensation path: completed work is
//! driven through `start_comp_task`/`end_comp_task` before `end_saga` is
//! accepted.

pub mod codec;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod port;
pub mod saga;
pub mod state;
pub mod telemetry;

pub use codec::{BincodeCodec, CodecError, JsonCodec, MessageCodec, CURRENT_MESSAGE_VERSION};
pub use coordinator::{replay, SagaCoordinator};
pub use error::{SagaError, SagaLogError, TransitionError};
pub use message::{SagaId, SagaMessage, SagaMessageType, TaskId};
pub use port::SagaLog;
pub use saga::Saga;
pub use state::{apply_message, SagaState, TaskData, TaskFlags};
pub use telemetry::{
    init_telemetry, SagaObserver, TelemetryConfig, TelemetryGuard, TracingObserver,
};
