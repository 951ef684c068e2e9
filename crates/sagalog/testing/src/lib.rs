//! # sagalog-testing
//!
//! Testing utilities for sagalog with in-memory implementations.
//! Provides [`InMemorySagaLog`] (the conformance reference for the
//! [`SagaLog`](sagalog_core::port::SagaLog) port), [`FailingSagaLog`] for
//! fault injection, and a ready-made in-memory coordinator.

pub mod failing_saga_log;
pub mod memory_saga_log;

#[cfg(test)]
mod tests;

pub use failing_saga_log::{FailingSagaLog, FailingSagaLogError};
pub use memory_saga_log::{InMemorySagaLog, InMemorySagaLogError};

use std::sync::Arc;

use sagalog_core::SagaCoordinator;

/// A coordinator over a fresh in-memory log, for tests and local
/// development.
pub fn in_memory_coordinator() -> SagaCoordinator<InMemorySagaLog> {
    SagaCoordinator::new(Arc::new(InMemorySagaLog::new()))
}
