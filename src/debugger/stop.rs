//! Execution-stop stream
//!
//! Every continue, step or halt-reason query moves the stop stream forward
//! by one and is answered with the next scripted stop, encoded as a `T`
//! stop-reply packet:
//!
//! ```text
//! T05 00:10050000; 01:baff0000; ... thread:1;
//!  |   |  |
//!  |   |  +-- value, little-endian, register width * 2 hex digits
//!  |   +----- register index, two hex digits
//!  +--------- signal
//! ```

use std::fmt::Write;

use serde::Serialize;

use super::counter::SequenceCounter;
use crate::error::{Result, Stream, StubError};
use crate::script::ScriptedStop;

/// Where the stop stream stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopState {
    /// No continue/step seen yet
    AwaitingFirstStop,
    /// The last command was answered with this 1-based scripted stop
    StopAvailable(usize),
    /// More stops were requested than scripted. Terminal.
    Exhausted,
}

/// Render one register value fixed-width, little-endian.
///
/// Widths above 8 bytes are clamped and bytes above `width` are dropped;
/// [`Script::validate`](crate::script::Script::validate) rejects scripts
/// where either would happen.
pub fn encode_register(value: u64, width: usize) -> String {
    let bytes = value.to_le_bytes();
    hex::encode(&bytes[..width.min(bytes.len())])
}

/// Encode a scripted stop as a `T` stop-reply packet.
pub fn encode_stop(stop: &ScriptedStop, register_width: usize) -> String {
    let mut reply = String::with_capacity(3 + stop.registers.len() * (4 + register_width * 2));
    write!(reply, "T{:02x}", stop.signal).unwrap();
    for reg in &stop.registers {
        write!(
            reply,
            "{:02x}:{};",
            reg.index,
            encode_register(reg.value, register_width)
        )
        .unwrap();
    }
    if let Some(thread) = stop.thread {
        write!(reply, "thread:{:x};", thread).unwrap();
    }
    reply
}

/// Stop-stream position within a session
#[derive(Debug, Clone, Serialize)]
pub struct StopSequence {
    counter: SequenceCounter,
    state: StopState,
}

impl Default for StopSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSequence {
    pub fn new() -> Self {
        Self {
            counter: SequenceCounter::new(),
            state: StopState::AwaitingFirstStop,
        }
    }

    pub fn state(&self) -> StopState {
        self.state
    }

    /// Stop commands received so far, including ones past the script
    pub fn consumed(&self) -> usize {
        self.counter.consumed()
    }

    /// Advance the stream and encode the scripted stop it lands on.
    pub fn next_stop(&mut self, stops: &[ScriptedStop], register_width: usize) -> Result<String> {
        let ordinal = self.counter.advance();
        self.state = match self.state {
            StopState::Exhausted => StopState::Exhausted,
            _ if ordinal > stops.len() => StopState::Exhausted,
            _ => StopState::StopAvailable(ordinal),
        };

        match self.state {
            StopState::StopAvailable(n) => Ok(encode_stop(&stops[n - 1], register_width)),
            _ => Err(StubError::SequenceExhausted {
                stream: Stream::Stop,
                ordinal,
                available: stops.len(),
            }),
        }
    }

    /// The scripted stop the target is currently halted at
    pub fn current<'a>(&self, stops: &'a [ScriptedStop]) -> Option<&'a ScriptedStop> {
        match self.state {
            StopState::StopAvailable(n) => stops.get(n - 1),
            _ => None,
        }
    }
}
