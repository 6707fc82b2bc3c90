//! GDB Remote Serial Protocol Server
//!
//! Serves scripted sessions over TCP so a stock debugger can attach to the
//! stub. Connect with: `gdb -ex "target remote :1234"` or
//! `lldb -o "gdb-remote 1234"`.
//!
//! Connections are served one at a time and every connection starts from a
//! fresh [`SessionState`].

use std::io::{self, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use log::{debug, error, info, warn};

use super::command::Command;
use super::session::{Responder, SessionState};
use super::Debuggable;
use crate::error::Result;
use crate::script::Script;

/// Default GDB server port
pub const DEFAULT_PORT: u16 = 1234;

/// Sent to the client when the script cannot answer a request
pub const SCRIPT_FAILURE_REPLY: &str = "E01";

/// Sum of payload bytes modulo 256
pub fn checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Wrap a payload in `$...#xx` framing.
pub fn frame_packet(data: &str) -> String {
    format!("${}#{:02x}", data, checksum(data.as_bytes()))
}

/// Packet-level view of one client byte stream
pub struct Connection<S: Read + Write> {
    reader: BufReader<S>,
    max_packet_size: usize,
    no_ack_mode: bool,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S, max_packet_size: usize) -> Self {
        Self {
            reader: BufReader::new(stream),
            max_packet_size,
            no_ack_mode: false,
        }
    }

    pub fn set_no_ack_mode(&mut self, enabled: bool) {
        self.no_ack_mode = enabled;
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn send_ack(&mut self, ack: u8) -> io::Result<()> {
        if self.no_ack_mode {
            return Ok(());
        }
        let stream = self.reader.get_mut();
        stream.write_all(&[ack])?;
        stream.flush()
    }

    /// Send a packet to the client
    pub fn write_packet(&mut self, data: &str) -> io::Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(frame_packet(data).as_bytes())?;
        stream.flush()
    }

    /// Receive the next valid packet payload.
    ///
    /// Returns `None` once the connection is gone: end of stream, or a
    /// payload larger than the negotiated packet size.
    pub fn read_packet(&mut self) -> io::Result<Option<String>> {
        loop {
            // Look for packet start
            loop {
                match self.read_byte()? {
                    None => return Ok(None),
                    Some(b'$') => break,
                    // ACK/NAK, ignore
                    Some(b'+') | Some(b'-') => continue,
                    // Ctrl+C: the scripted target is never running
                    Some(0x03) => debug!("Ignoring interrupt request"),
                    Some(other) => debug!("Skipping stray byte {:#04x}", other),
                }
            }

            // Read until #
            let mut data = Vec::new();
            loop {
                match self.read_byte()? {
                    None => return Ok(None),
                    Some(b'#') => break,
                    Some(b) => {
                        if data.len() >= self.max_packet_size {
                            warn!(
                                "Packet exceeded maximum size of {:#x}. Disconnecting.",
                                self.max_packet_size
                            );
                            return Ok(None);
                        }
                        data.push(b);
                    }
                }
            }

            // Read checksum (2 chars)
            let mut checksum_buf = [0u8; 2];
            match self.reader.read_exact(&mut checksum_buf) {
                Ok(()) => {}
                Err(ref e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
                Err(e) => return Err(e),
            }

            let received = std::str::from_utf8(&checksum_buf)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok());

            if received == Some(checksum(&data)) {
                self.send_ack(b'+')?;
                return Ok(Some(String::from_utf8_lossy(&data).into_owned()));
            }

            warn!(
                "Checksum mismatch on packet {:?}, requesting resend",
                String::from_utf8_lossy(&data)
            );
            self.send_ack(b'-')?;
        }
    }
}

/// Replay `script` over one client stream until it disconnects.
///
/// Returns the final session state. A script failure (stream exhausted,
/// size mismatch) is reported to the client as an error reply and then
/// returned, ending the session.
pub fn run_session<S: Read + Write>(script: &Script, stream: S) -> Result<SessionState> {
    let mut responder = Responder::new(script)?;
    let mut conn = Connection::new(stream, script.max_packet_size);
    info!(
        "Starting scripted session ({} stops, {} memory blobs)",
        script.scripted_stops.len(),
        script.scripted_memory.len()
    );

    while let Some(packet) = conn.read_packet()? {
        let command = Command::parse(&packet);
        debug!("<- {:?}", packet);
        let is_kill = command == Command::Kill;

        let reply = match responder.handle(command) {
            Ok(reply) => reply,
            Err(e) => {
                error!("Script failure on packet {:?}: {}", packet, e);
                // Client may already be gone
                if let Err(io) = conn.write_packet(SCRIPT_FAILURE_REPLY) {
                    warn!("Could not report script failure to the client: {}", io);
                }
                return Err(e);
            }
        };

        // `k` gets no reply
        if !is_kill {
            debug!("-> {:?}", reply);
            conn.write_packet(&reply)?;
        }
        conn.set_no_ack_mode(responder.state().no_ack_mode);

        if responder.state().finished {
            break;
        }
    }

    info!(
        "Session ended after {} stops and {} memory reads",
        responder.state().stops.consumed(),
        responder.state().memory.consumed()
    );
    Ok(responder.into_state())
}

/// Listener options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Accept connections from non-loopback peers
    pub allow_remote: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            allow_remote: false,
        }
    }
}

/// GDB Server state
pub struct GdbServer {
    listener: TcpListener,
    config: ServerConfig,
}

impl GdbServer {
    /// Create a new GDB server
    pub fn bind(config: ServerConfig) -> Result<Self> {
        let listener = TcpListener::bind((config.host.as_str(), config.port))?;
        info!("GDB stub listening on {}", listener.local_addr()?);
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Wait for the next acceptable client
    pub fn accept(&self) -> Result<TcpStream> {
        loop {
            let (stream, addr) = self.listener.accept()?;
            if !self.config.allow_remote && !addr.ip().is_loopback() {
                warn!("Rejected GDB connection from non-loopback address: {}", addr);
                continue;
            }
            info!("Accepted GDB connection from {}", addr);
            stream.set_nodelay(true)?;
            return Ok(stream);
        }
    }

    /// Accept one client and replay `script` to it.
    pub fn serve_one(&self, script: &Script) -> Result<SessionState> {
        let stream = self.accept()?;
        run_session(script, stream)
    }

    /// Serve sessions one after another.
    ///
    /// A client dropping mid-session only ends that session. Script failures
    /// and listener errors end the loop: the first means the fixture is wrong,
    /// the second would otherwise repeat on every iteration.
    pub fn serve(&self, script: &Script, once: bool) -> Result<()> {
        loop {
            let stream = self.accept()?;
            match run_session(script, stream) {
                Ok(state) => info!("Final session state: {}", state.read_state()),
                Err(e) if e.is_fixture_error() => return Err(e),
                Err(e) => error!("Session aborted: {}", e),
            }
            if once {
                return Ok(());
            }
        }
    }
}
