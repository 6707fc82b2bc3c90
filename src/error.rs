use std::fmt;

use thiserror::Error;

/// A scripted command stream with its own progression counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    /// Continue, step and halt-reason queries
    Stop,
    /// `m` memory reads
    Memory,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stream::Stop => "stop",
            Stream::Memory => "memory-read",
        };
        write!(f, "{}", s)
    }
}

/// Errors raised to the caller of the stub.
///
/// Malformed and unknown packets never show up here: those are answered on
/// the wire with the empty "unsupported" reply.
#[derive(Debug, Error)]
pub enum StubError {
    #[error("no further scripted {stream} replies: request #{ordinal} but only {available} scripted")]
    SequenceExhausted {
        stream: Stream,
        ordinal: usize,
        available: usize,
    },

    #[error("memory read #{ordinal} requested {requested} bytes but the scripted blob holds {scripted}")]
    SizeMismatch {
        ordinal: usize,
        requested: usize,
        scripted: usize,
    },

    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed script JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl StubError {
    /// Fixture errors mean the test itself is broken, not the debugger under test.
    pub fn is_fixture_error(&self) -> bool {
        matches!(
            self,
            StubError::SequenceExhausted { .. }
                | StubError::SizeMismatch { .. }
                | StubError::InvalidScript(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StubError>;
