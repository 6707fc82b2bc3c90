use log::debug;
use serde::Serialize;

use super::counter::SequenceCounter;
use crate::error::{Result, Stream, StubError};
use crate::script::ScriptedMemoryBlob;

/// Memory-read stream within a session.
///
/// Reads are answered in call order from the scripted blobs. The requested
/// address only shows up in the log: the stub has no address space, the
/// Nth read gets the Nth blob wherever it points.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryProvider {
    counter: SequenceCounter,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads served so far, including failed ones
    pub fn consumed(&self) -> usize {
        self.counter.consumed()
    }

    /// Answer an `m` read with the next scripted blob.
    ///
    /// The blob must decode to exactly `len` bytes. A mismatch is a fixture
    /// bug and is raised rather than padded or cut.
    pub fn read_memory(
        &mut self,
        blobs: &[ScriptedMemoryBlob],
        addr: u64,
        len: usize,
    ) -> Result<String> {
        let ordinal = self.counter.advance();
        debug!("Memory read #{} at {:#x}, {} bytes", ordinal, addr, len);

        let blob = blobs
            .get(ordinal - 1)
            .ok_or(StubError::SequenceExhausted {
                stream: Stream::Memory,
                ordinal,
                available: blobs.len(),
            })?;

        if blob.decoded_len() != len {
            return Err(StubError::SizeMismatch {
                ordinal,
                requested: len,
                scripted: blob.decoded_len(),
            });
        }

        Ok(blob.as_hex().to_string())
    }
}
