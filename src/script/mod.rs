//! Session scripts
//!
//! A script is the fixture data a stub session replays: the ordered stop
//! events returned for continue/step, the ordered memory blobs returned for
//! memory reads, and the packet size announced to the client.
//!
//! Scripts are authored as JSON:
//!
//! ```json
//! {
//!   "maxPacketSize": 16384,
//!   "registerWidth": 4,
//!   "scriptedStops": [
//!     { "signal": 5, "registers": [{ "index": 0, "value": 1280 }] }
//!   ],
//!   "scriptedMemory": ["3140c0ff"]
//! }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::debugger::stop::encode_stop;
use crate::error::{Result, StubError};

/// Packet size announced when the script does not set one
pub const DEFAULT_MAX_PACKET_SIZE: usize = 0x4000;

/// Register width in bytes when the script does not set one
pub const DEFAULT_REGISTER_WIDTH: usize = 4;

/// One register value reported in a stop event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterValue {
    pub index: u8,
    pub value: u64,
}

/// One scripted execution-stop event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedStop {
    /// Signal number (5 = SIGTRAP)
    pub signal: u8,
    /// Thread reported with the stop, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread: Option<u64>,
    /// Registers in the order they are put on the wire
    #[serde(default)]
    pub registers: Vec<RegisterValue>,
}

impl ScriptedStop {
    pub fn register(&self, index: u8) -> Option<u64> {
        self.registers
            .iter()
            .find(|r| r.index == index)
            .map(|r| r.value)
    }
}

/// One scripted memory-read reply, kept in wire hex form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptedMemoryBlob(String);

impl ScriptedMemoryBlob {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Wire form of the blob
    pub fn as_hex(&self) -> &str {
        &self.0
    }

    /// Number of bytes the blob decodes to
    pub fn decoded_len(&self) -> usize {
        self.0.len() / 2
    }

    fn validate(&self, ordinal: usize) -> Result<()> {
        hex::decode(&self.0).map_err(|e| {
            StubError::InvalidScript(format!("memory blob #{}: {}", ordinal, e))
        })?;
        Ok(())
    }
}

/// Full fixture set for one stub session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    #[serde(default)]
    pub scripted_stops: Vec<ScriptedStop>,
    #[serde(default)]
    pub scripted_memory: Vec<ScriptedMemoryBlob>,
    #[serde(default = "default_max_packet_size")]
    pub max_packet_size: usize,
    #[serde(default = "default_register_width")]
    pub register_width: usize,
}

fn default_max_packet_size() -> usize {
    DEFAULT_MAX_PACKET_SIZE
}

fn default_register_width() -> usize {
    DEFAULT_REGISTER_WIDTH
}

impl Default for Script {
    fn default() -> Self {
        Self {
            scripted_stops: Vec::new(),
            scripted_memory: Vec::new(),
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
            register_width: DEFAULT_REGISTER_WIDTH,
        }
    }
}

impl Script {
    /// Parse and validate a script from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let script: Script = serde_json::from_str(text)?;
        script.validate()?;
        debug!(
            "Loaded script: {} stops, {} memory blobs, packet size {:#x}",
            script.scripted_stops.len(),
            script.scripted_memory.len(),
            script.max_packet_size
        );
        Ok(script)
    }

    /// Size of the register file: one past the highest index any stop lists
    pub fn register_count(&self) -> usize {
        self.scripted_stops
            .iter()
            .flat_map(|stop| stop.registers.iter())
            .map(|r| r.index as usize + 1)
            .max()
            .unwrap_or(0)
    }

    /// Read, parse and validate a script file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Check the fixtures can be replayed as written.
    ///
    /// Catches authoring mistakes up front instead of mid-session: invalid
    /// hex, register values that do not fit the register width, a register
    /// listed twice in one stop, and replies larger than the announced
    /// packet size.
    pub fn validate(&self) -> Result<()> {
        if self.register_width == 0 || self.register_width > 8 {
            return Err(StubError::InvalidScript(format!(
                "register width must be 1..=8 bytes, got {}",
                self.register_width
            )));
        }
        if self.max_packet_size == 0 {
            return Err(StubError::InvalidScript(
                "max packet size must be non-zero".to_string(),
            ));
        }

        for (i, stop) in self.scripted_stops.iter().enumerate() {
            let ordinal = i + 1;
            let mut seen = HashSet::new();
            for reg in &stop.registers {
                if !seen.insert(reg.index) {
                    return Err(StubError::InvalidScript(format!(
                        "stop #{}: register {:#04x} listed twice",
                        ordinal, reg.index
                    )));
                }
                if !fits_width(reg.value, self.register_width) {
                    return Err(StubError::InvalidScript(format!(
                        "stop #{}: register {:#04x} value {:#x} does not fit in {} bytes",
                        ordinal, reg.index, reg.value, self.register_width
                    )));
                }
            }
            let reply_len = encode_stop(stop, self.register_width).len();
            if reply_len > self.max_packet_size {
                return Err(StubError::InvalidScript(format!(
                    "stop #{} encodes to {} characters, larger than the packet size {:#x}",
                    ordinal, reply_len, self.max_packet_size
                )));
            }
        }

        for (i, blob) in self.scripted_memory.iter().enumerate() {
            let ordinal = i + 1;
            blob.validate(ordinal)?;
            if blob.as_hex().len() > self.max_packet_size {
                return Err(StubError::InvalidScript(format!(
                    "memory blob #{} is {} characters, larger than the packet size {:#x}",
                    ordinal,
                    blob.as_hex().len(),
                    self.max_packet_size
                )));
            }
        }

        Ok(())
    }
}

fn fits_width(value: u64, width: usize) -> bool {
    width >= 8 || value >> (width * 8) == 0
}
