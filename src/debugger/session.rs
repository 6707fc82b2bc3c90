//! Responder engine
//!
//! [`Responder`] owns one session's [`SessionState`] and borrows the script
//! it replays. Each decoded packet goes through [`Responder::process_command`],
//! which routes it to exactly one handler and returns the reply payload for
//! the transport to frame.

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use super::breakpoint::BreakpointTable;
use super::capability;
use super::command::{parse_addr_len, Command};
use super::memory::MemoryProvider;
use super::stop::{encode_register, StopSequence};
use super::Debuggable;
use crate::error::Result;
use crate::script::{Script, ScriptedStop};

/// The "not implemented" reply
pub const UNSUPPORTED: &str = "";

/// Thread reported when the current stop does not name one
pub const DEFAULT_THREAD: u64 = 1;

/// `g` reply when the script lists no registers at all
pub const NO_REGISTERS: &str = "E01";

/// Mutable state of one stub session
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionState {
    pub stops: StopSequence,
    pub memory: MemoryProvider,
    pub breakpoints: BreakpointTable,
    /// Client asked for `QStartNoAckMode`
    pub no_ack_mode: bool,
    /// Client detached or killed the target
    pub finished: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Debuggable for SessionState {
    fn read_state(&self) -> Value {
        serde_json::json!({
            "stop_state": self.stops.state(),
            "stops_consumed": self.stops.consumed(),
            "memory_reads": self.memory.consumed(),
            "breakpoints": self.breakpoints,
            "no_ack_mode": self.no_ack_mode,
            "finished": self.finished,
        })
    }
}

/// Scripted GDB responder for a single connection
pub struct Responder<'a> {
    script: &'a Script,
    state: SessionState,
}

impl<'a> Responder<'a> {
    /// Check `script` and start a session on it.
    ///
    /// `Script` fields are public, so a script built in code has not been
    /// through [`Script::validate`] yet; a bad one is rejected here rather
    /// than replayed.
    pub fn new(script: &'a Script) -> Result<Self> {
        script.validate()?;
        debug!(
            "New responder ({} stops, {} memory blobs)",
            script.scripted_stops.len(),
            script.scripted_memory.len()
        );
        Ok(Self {
            script,
            state: SessionState::new(),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn into_state(self) -> SessionState {
        self.state
    }

    /// Decode a packet payload and answer it.
    pub fn process_command(&mut self, packet: &str) -> Result<String> {
        let command = Command::parse(packet);
        debug!("<- {:?}", command);
        self.handle(command)
    }

    /// Route a decoded command to its handler.
    ///
    /// `Err` means the script ran out or does not fit the request; the
    /// session cannot go on meaningfully after that.
    pub fn handle(&mut self, command: Command) -> Result<String> {
        let reply = match command {
            Command::QuerySupported(features) => {
                capability::negotiate(&features, self.script.max_packet_size)
            }
            Command::HaltReason | Command::Continue | Command::Step => {
                self.state.stops.next_stop(
                    &self.script.scripted_stops,
                    self.script.register_width,
                )?
            }
            Command::SetBreakpoint(spec) => self.state.breakpoints.set_breakpoint(&spec),
            Command::RemoveBreakpoint(spec) => self.state.breakpoints.remove_breakpoint(&spec),
            Command::ReadMemory(args) => self.read_memory(&args)?,
            Command::ReadRegisters => self.read_registers(),
            Command::ReadRegister(args) => self.read_register(&args),
            Command::SetThread => "OK".to_string(),
            Command::CurrentThread => format!("QC{:x}", self.current_thread()),
            Command::ThreadInfoFirst => format!("m{:x}", self.current_thread()),
            Command::ThreadInfoNext => "l".to_string(),
            Command::Attached => "1".to_string(),
            Command::StartNoAckMode => {
                self.state.no_ack_mode = true;
                "OK".to_string()
            }
            Command::Detach => {
                info!("Client detached");
                self.state.finished = true;
                "OK".to_string()
            }
            Command::Kill => {
                info!("Client killed the target");
                self.state.finished = true;
                UNSUPPORTED.to_string()
            }
            Command::Unknown(packet) => {
                debug!("Unsupported packet {:?}", packet);
                UNSUPPORTED.to_string()
            }
        };
        Ok(reply)
    }

    fn read_memory(&mut self, args: &str) -> Result<String> {
        let Some((addr, len)) = parse_addr_len(args) else {
            warn!("Malformed memory read {:?}", args);
            return Ok(UNSUPPORTED.to_string());
        };
        self.state
            .memory
            .read_memory(&self.script.scripted_memory, addr, len)
    }

    fn current_stop(&self) -> Option<&'a ScriptedStop> {
        let script: &'a Script = self.script;
        self.state.stops.current(&script.scripted_stops)
    }

    fn current_thread(&self) -> u64 {
        self.current_stop()
            .and_then(|stop| stop.thread)
            .unwrap_or(DEFAULT_THREAD)
    }

    /// Registers come from the stop the target is halted at; anything the
    /// stop does not list reads as zero.
    fn register_value(&self, index: u8) -> u64 {
        self.current_stop()
            .and_then(|stop| stop.register(index))
            .unwrap_or(0)
    }

    fn read_register(&self, args: &str) -> String {
        match u8::from_str_radix(args, 16) {
            Ok(index) => encode_register(self.register_value(index), self.script.register_width),
            Err(_) => {
                warn!("Malformed register read {:?}", args);
                UNSUPPORTED.to_string()
            }
        }
    }

    /// The register file is as wide as the highest index any stop lists, so
    /// `g` has the same length before the first stop and after every one.
    fn read_registers(&self) -> String {
        let width = self.script.register_width;
        let count = self.script.register_count();
        if count == 0 {
            warn!("Register file requested but the script lists no registers");
            return NO_REGISTERS.to_string();
        }

        let mut result = String::with_capacity(count * width * 2);
        for index in 0..count {
            result.push_str(&encode_register(self.register_value(index as u8), width));
        }
        result
    }
}
