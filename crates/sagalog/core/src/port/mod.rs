//! Ports for infrastructure adapters.
//!
//! The core crate has no infrastructure dependencies; durable backends plug
//! in by implementing the traits defined here.

pub mod saga_log;

pub use saga_log::SagaLog;
