use serde_json::Value;

pub mod breakpoint;
pub mod capability;
pub mod command;
pub mod counter;
pub mod gdb;
pub mod memory;
pub mod session;
pub mod stop;

pub use breakpoint::{BreakpointRecord, BreakpointTable};
pub use command::Command;
pub use gdb::{GdbServer, ServerConfig, DEFAULT_PORT};
pub use session::{Responder, SessionState, UNSUPPORTED};
pub use stop::{encode_stop, StopState};

/// A trait for components whose state can be inspected by a test harness.
pub trait Debuggable {
    /// Reads the component's state and returns it as a JSON value.
    fn read_state(&self) -> Value;
}

#[cfg(test)]
mod tests_session;
