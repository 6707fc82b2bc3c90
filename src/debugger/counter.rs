use serde::Serialize;

/// Progression counter for one scripted command stream.
///
/// Only ever moves forward, one step per matching command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SequenceCounter(usize);

impl SequenceCounter {
    pub fn new() -> Self {
        Self(0)
    }

    /// Count one more command and return its 1-based ordinal.
    pub fn advance(&mut self) -> usize {
        self.0 += 1;
        self.0
    }

    /// Commands counted so far
    pub fn consumed(&self) -> usize {
        self.0
    }
}
