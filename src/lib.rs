//! gdbmock - A scriptable GDB Remote Serial Protocol target stub
//!
//! This library replays a pre-authored debugging session to a GDB-protocol
//! client: capability negotiation, breakpoints, scripted stop replies for
//! continue/step, and scripted memory dumps. Debugger implementations can be
//! tested deterministically against it without hardware or an emulator.

pub mod debugger;
pub mod error;
pub mod script;

pub use debugger::{GdbServer, Responder, SessionState};
pub use error::{Result, StubError};
pub use script::Script;
