#![no_main]
use libfuzzer_sys::fuzz_target;
use gdbmock::debugger::Responder;
use gdbmock::Script;

const MSP430_SCRIPT: &str = include_str!("../../fixtures/msp430_mspdebug.json");

fuzz_target!(|packets: Vec<String>| {
    let script = match Script::from_json(MSP430_SCRIPT) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut responder = match Responder::new(&script) {
        Ok(r) => r,
        Err(_) => return,
    };

    // Running out of script is expected; panics are not
    for packet in &packets {
        if responder.process_command(packet).is_err() {
            break;
        }
    }
});
