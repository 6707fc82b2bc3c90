#![no_main]
use libfuzzer_sys::fuzz_target;
use gdbmock::debugger::gdb::run_session;
use gdbmock::Script;
use std::io::{self, Cursor, Read, Write};

const MSP430_SCRIPT: &str = include_str!("../../fixtures/msp430_mspdebug.json");

// Raw client bytes in, replies discarded
struct Wire {
    input: Cursor<Vec<u8>>,
}

impl Read for Wire {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for Wire {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let script = match Script::from_json(MSP430_SCRIPT) {
        Ok(s) => s,
        Err(_) => return,
    };
    let wire = Wire {
        input: Cursor::new(data.to_vec()),
    };
    let _ = run_session(&script, wire);
});
