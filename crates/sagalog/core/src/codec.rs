//! Message codec traits and implementations.
//!
//! The coordinator itself never persists bytes; each [`SagaLog`](crate::port::SagaLog)
//! backend defines its own layout. This module provides the [`MessageCodec`]
//! trait plus two reference codecs backends can reuse: [`JsonCodec`]
//! (human-readable) and [`BincodeCodec`] (compact). Both preserve opaque
//! payloads byte for byte.

use serde::{Deserialize, Serialize};

use crate::message::{SagaId, SagaMessage, SagaMessageType, TaskId};

/// Current wire schema version.
pub const CURRENT_MESSAGE_VERSION: u32 = 1;

/// Error type for codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("JSON serialization/deserialization error")]
    Json(#[from] serde_json::Error),

    #[error("Bincode serialization/deserialization error")]
    Bincode(#[from] bincode::Error),

    #[error("Invalid message version: expected {expected}, got {actual}")]
    InvalidVersion { expected: u32, actual: u32 },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl CodecError {
    /// Create a version mismatch error.
    pub fn version_mismatch(expected: u32, actual: u32) -> Self {
        Self::InvalidVersion { expected, actual }
    }

    /// Create a parse error.
    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Trait for encoding and decoding saga messages.
pub trait MessageCodec: Send + Sync + 'static {
    /// Error type for this codec.
    type Error: std::fmt::Debug + Send + Sync + 'static;

    /// Encode a saga message to bytes.
    fn encode(&self, msg: &SagaMessage) -> Result<Vec<u8>, Self::Error>;

    /// Decode a saga message from bytes.
    fn decode(&self, data: &[u8]) -> Result<SagaMessage, Self::Error>;

    /// Return a unique identifier for this codec.
    fn codec_id(&self) -> &'static str;
}

/// JSON-based message codec.
///
/// Produces human-readable output; suited to debugging, development, and
/// backends where inspectability matters more than size.
#[derive(Debug, Default, Clone)]
pub struct JsonCodec;

impl JsonCodec {
    /// Create a new JSON codec.
    pub fn new() -> Self {
        Self
    }
}

impl MessageCodec for JsonCodec {
    type Error = CodecError;

    fn encode(&self, msg: &SagaMessage) -> Result<Vec<u8>, Self::Error> {
        let wrapper = MessageWrapper::from(msg);
        serde_json::to_vec(&wrapper).map_err(CodecError::Json)
    }

    fn decode(&self, data: &[u8]) -> Result<SagaMessage, Self::Error> {
        let wrapper: MessageWrapper = serde_json::from_slice(data).map_err(CodecError::Json)?;
        wrapper.into_message()
    }

    fn codec_id(&self) -> &'static str {
        "json"
    }
}

/// Binary message codec using bincode.
///
/// Compact and fast; suited to production journals and network
/// transmission. Not human-readable.
#[derive(Debug, Default, Clone)]
pub struct BincodeCodec;

impl BincodeCodec {
    /// Create a new binary codec.
    pub fn new() -> Self {
        Self
    }
}

impl MessageCodec for BincodeCodec {
    type Error = CodecError;

    fn encode(&self, msg: &SagaMessage) -> Result<Vec<u8>, Self::Error> {
        let wrapper = BincodeMessageWrapper::from(msg);
        bincode::serialize(&wrapper).map_err(CodecError::Bincode)
    }

    fn decode(&self, data: &[u8]) -> Result<SagaMessage, Self::Error> {
        let wrapper: BincodeMessageWrapper =
            bincode::deserialize(data).map_err(CodecError::Bincode)?;
        wrapper.into_message()
    }

    fn codec_id(&self) -> &'static str {
        "bincode"
    }
}

/// Internal wrapper for JSON serialization.
#[derive(Debug, Serialize, Deserialize)]
struct MessageWrapper {
    version: u32,
    saga_id: String,
    msg_type: String,
    task_id: Option<String>,
    data: Option<Vec<u8>>,
}

impl MessageWrapper {
    fn from(msg: &SagaMessage) -> Self {
        Self {
            version: CURRENT_MESSAGE_VERSION,
            saga_id: msg.saga_id.0.clone(),
            msg_type: msg.msg_type.as_str().to_string(),
            task_id: msg.task_id.as_ref().map(|t| t.0.clone()),
            data: msg.data.clone(),
        }
    }

    fn into_message(self) -> Result<SagaMessage, CodecError> {
        if self.version != CURRENT_MESSAGE_VERSION {
            return Err(CodecError::version_mismatch(
                CURRENT_MESSAGE_VERSION,
                self.version,
            ));
        }

        let msg_type: SagaMessageType =
            self.msg_type.parse().map_err(CodecError::parse_error)?;

        Ok(SagaMessage {
            saga_id: SagaId(self.saga_id),
            msg_type,
            task_id: self.task_id.map(TaskId),
            data: self.data,
        })
    }
}

/// Internal wrapper for bincode serialization. Uses the compact u8 message
/// type encoding.
#[derive(Debug, Serialize, Deserialize)]
struct BincodeMessageWrapper {
    version: u32,
    saga_id: String,
    msg_type: u8,
    task_id: Option<String>,
    data: Option<Vec<u8>>,
}

impl BincodeMessageWrapper {
    fn from(msg: &SagaMessage) -> Self {
        Self {
            version: CURRENT_MESSAGE_VERSION,
            saga_id: msg.saga_id.0.clone(),
            msg_type: msg.msg_type.to_compact_u8(),
            task_id: msg.task_id.as_ref().map(|t| t.0.clone()),
            data: msg.data.clone(),
        }
    }

    fn into_message(self) -> Result<SagaMessage, CodecError> {
        if self.version != CURRENT_MESSAGE_VERSION {
            return Err(CodecError::version_mismatch(
                CURRENT_MESSAGE_VERSION,
                self.version,
            ));
        }

        let msg_type = SagaMessageType::from_compact_u8(self.msg_type).ok_or_else(|| {
            CodecError::parse_error(format!("Unknown message type code: {}", self.msg_type))
        })?;

        Ok(SagaMessage {
            saga_id: SagaId(self.saga_id),
            msg_type,
            task_id: self.task_id.map(TaskId),
            data: self.data,
        })
    }
}
