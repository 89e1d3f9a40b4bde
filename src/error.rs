use thiserror::Error;

use crate::dsp::graph::NodeId;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures inside the engine. None of these escape the session controller;
/// they are logged where they are absorbed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio synthesis is not supported by host '{host}'")]
    Unsupported { host: String },

    #[error("no audio context is available")]
    ContextUnavailable,

    #[error("audio context is closed")]
    ContextClosed,

    #[error("sample rate {0} Hz is outside the supported range")]
    InvalidSampleRate(f32),

    #[error("invalid value {value} for {name}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("node limit of {limit} reached")]
    NodeLimit { limit: usize },

    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),

    #[error("cannot connect {from:?} to {to}")]
    InvalidConnection { from: NodeId, to: String },

    #[error("resume failed: {reason}")]
    ResumeFailed { reason: String },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// True when retrying cannot help because the environment itself lacks
    /// synthesis support.
    pub fn is_environmental(&self) -> bool {
        matches!(self, EngineError::Unsupported { .. })
    }
}
