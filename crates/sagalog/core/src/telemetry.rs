//! Tracing integration and the transition observer hook.
//!
//! The observer is optional: a façade without one skips the hook entirely,
//! so observability costs nothing when unused. [`TracingObserver`] emits
//! every transition as a structured `tracing` event.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::TransitionError;
use crate::message::SagaMessage;
use crate::state::SagaState;

/// Sink for the stream of saga transitions.
///
/// Called inside the façade's critical section, after the transition has
/// been journaled and committed (or rejected). Implementations must be
/// cheap and must not block.
pub trait SagaObserver: Send + Sync {
    /// A message was accepted, journaled, and committed; `state` is the
    /// successor state.
    fn on_transition(&self, msg: &SagaMessage, state: &SagaState);

    /// A message was rejected by the transition function; nothing was
    /// journaled.
    fn on_rejected(&self, msg: &SagaMessage, reason: &TransitionError);
}

/// Default observer that records transitions as `tracing` events.
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a new tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl SagaObserver for TracingObserver {
    fn on_transition(&self, msg: &SagaMessage, state: &SagaState) {
        tracing::debug!(
            saga_id = %msg.saga_id,
            msg_type = %msg.msg_type,
            task_id = msg.task_id.as_ref().map(|t| t.as_str()),
            aborted = state.is_saga_aborted(),
            completed = state.is_saga_completed(),
            "saga transition committed"
        );
    }

    fn on_rejected(&self, msg: &SagaMessage, reason: &TransitionError) {
        tracing::warn!(
            saga_id = %msg.saga_id,
            msg_type = %msg.msg_type,
            task_id = msg.task_id.as_ref().map(|t| t.as_str()),
            %reason,
            "saga transition rejected"
        );
    }
}

/// Configuration for telemetry initialization.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name for tracing.
    pub service_name: String,
    /// Log level filter.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "sagalog".to_string(),
            log_level: "INFO".to_string(),
        }
    }
}

/// Telemetry guard - must be kept alive for tracing to work.
pub struct TelemetryGuard;

impl TelemetryGuard {
    /// Shutdown telemetry.
    pub fn shutdown(self) {}
}

/// Initialize tracing for sagalog at application startup.
pub fn init_telemetry(config: &TelemetryConfig) -> TelemetryGuard {
    let env_filter = EnvFilter::new(&config.log_level);

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(service = %config.service_name, "telemetry initialized");

    TelemetryGuard
}
