//! SagaLog port trait definition.
//!
//! This module defines the [`SagaLog`] trait that backends must implement
//! to provide the durable, append-only journal behind each saga.

use crate::error::SagaLogError;
use crate::message::{SagaId, SagaMessage};
use std::fmt::Debug;

/// Trait for saga journal storage.
///
/// The SagaLog is the durability boundary of the coordinator. A conforming
/// implementation provides an append-only, per-saga message stream plus
/// enumeration of every saga on record.
///
/// # Durability Contract
///
/// A successful return from [`start_saga`](SagaLog::start_saga) or
/// [`log_message`](SagaLog::log_message) guarantees the message will be
/// observed by a subsequent [`get_messages`](SagaLog::get_messages) from
/// any process with access to the log. Durable implementations sync to
/// stable storage before returning; the in-memory reference satisfies this
/// trivially.
///
/// # Ordering
///
/// `get_messages` must return messages in the exact order `log_message`
/// accepted them. Streams of unrelated sagas are independent; no
/// cross-saga ordering is required.
///
/// # Concurrency Model
///
/// Implementations must be internally thread-safe: one log instance is
/// shared by every saga façade created from a coordinator, and unrelated
/// sagas append concurrently without coordination.
#[async_trait::async_trait]
pub trait SagaLog: Send + Sync {
    /// The backend error type for this implementation.
    type Error: Debug + Send + Sync + 'static;

    /// Durably create the journal for a new saga, containing exactly one
    /// StartSaga message carrying `job`.
    ///
    /// Behavior when a journal already exists for `saga_id` is
    /// implementation-defined; the in-memory reference overwrites, but
    /// durable implementations should reject the duplicate instead.
    async fn start_saga(
        &self,
        saga_id: &SagaId,
        job: Option<&[u8]>,
    ) -> Result<(), SagaLogError<Self::Error>>;

    /// Append a message to the saga's journal.
    ///
    /// # Errors
    ///
    /// - [`SagaLogError::UnstartedSaga`] if no StartSaga is on record for
    ///   the message's saga.
    /// - [`SagaLogError::Backend`] for implementation-specific failures;
    ///   these are propagated unchanged to the caller.
    async fn log_message(&self, msg: &SagaMessage) -> Result<(), SagaLogError<Self::Error>>;

    /// Get the full journal for a saga, in append order.
    ///
    /// An unknown saga is not an error: it returns an empty vector,
    /// distinguishing "never started" by the empty result.
    async fn get_messages(
        &self,
        saga_id: &SagaId,
    ) -> Result<Vec<SagaMessage>, SagaLogError<Self::Error>>;

    /// Enumerate every saga ever started in this log, in unspecified
    /// order. Completed sagas are included until garbage-collected by a
    /// mechanism outside this interface.
    async fn get_active_sagas(&self) -> Result<Vec<SagaId>, SagaLogError<Self::Error>>;
}
