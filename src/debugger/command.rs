//! Decoded GDB packets
//!
//! The transport hands the dispatcher packet payloads with framing and
//! checksum already stripped. `Command::parse` only classifies the packet by
//! its tag; argument payloads are kept raw and parsed by the handler that
//! owns them.

/// A decoded request from the debugger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `qSupported[:features]`
    QuerySupported(String),
    /// `?`
    HaltReason,
    /// `c`, `C`, `vCont;c`
    Continue,
    /// `s`, `S`, `vCont;s`
    Step,
    /// `Z<type>,<addr>,<kind>`
    SetBreakpoint(String),
    /// `z<type>,<addr>,<kind>`
    RemoveBreakpoint(String),
    /// `m<addr>,<len>`
    ReadMemory(String),
    /// `g`
    ReadRegisters,
    /// `p<n>`
    ReadRegister(String),
    /// `H<op><tid>`
    SetThread,
    /// `qC`
    CurrentThread,
    /// `qfThreadInfo`
    ThreadInfoFirst,
    /// `qsThreadInfo`
    ThreadInfoNext,
    /// `qAttached`
    Attached,
    /// `QStartNoAckMode`
    StartNoAckMode,
    /// `D`
    Detach,
    /// `k`
    Kill,
    /// Anything else
    Unknown(String),
}

impl Command {
    pub fn parse(packet: &str) -> Command {
        let Some(first_char) = packet.chars().next() else {
            return Command::Unknown(String::new());
        };

        match first_char {
            '?' => Command::HaltReason,
            'c' | 'C' => Command::Continue,
            's' | 'S' => Command::Step,
            'g' if packet.len() == 1 => Command::ReadRegisters,
            'p' => Command::ReadRegister(packet[1..].to_string()),
            'm' => Command::ReadMemory(packet[1..].to_string()),
            'Z' => Command::SetBreakpoint(packet[1..].to_string()),
            'z' => Command::RemoveBreakpoint(packet[1..].to_string()),
            'H' => Command::SetThread,
            'D' => Command::Detach,
            'k' => Command::Kill,
            'q' => Self::parse_query(packet),
            'Q' if packet == "QStartNoAckMode" => Command::StartNoAckMode,
            'v' => Self::parse_v_packet(packet),
            _ => Command::Unknown(packet.to_string()),
        }
    }

    fn parse_query(packet: &str) -> Command {
        if let Some(rest) = packet.strip_prefix("qSupported") {
            let features = rest.strip_prefix(':').unwrap_or(rest);
            return Command::QuerySupported(features.to_string());
        }
        match packet {
            "qC" => Command::CurrentThread,
            "qfThreadInfo" => Command::ThreadInfoFirst,
            "qsThreadInfo" => Command::ThreadInfoNext,
            "qAttached" => Command::Attached,
            _ => Command::Unknown(packet.to_string()),
        }
    }

    /// Only the first `vCont` action matters: there is one thread.
    fn parse_v_packet(packet: &str) -> Command {
        let Some(actions) = packet.strip_prefix("vCont;") else {
            return Command::Unknown(packet.to_string());
        };
        match actions.chars().next() {
            Some('c') | Some('C') => Command::Continue,
            Some('s') | Some('S') => Command::Step,
            _ => Command::Unknown(packet.to_string()),
        }
    }
}

/// Parse `<addr>,<len>` (both hex), as used by `m`.
pub fn parse_addr_len(payload: &str) -> Option<(u64, usize)> {
    let (addr, len) = payload.split_once(',')?;
    let addr = u64::from_str_radix(addr, 16).ok()?;
    let len = usize::from_str_radix(len, 16).ok()?;
    Some((addr, len))
}
