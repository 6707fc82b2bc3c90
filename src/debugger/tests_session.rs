use super::session::{Responder, NO_REGISTERS, UNSUPPORTED};
use super::{Command, Debuggable, StopState};
use crate::error::{Stream, StubError};
use crate::script::{RegisterValue, Script, ScriptedMemoryBlob, ScriptedStop};

fn stop(signal: u8, thread: Option<u64>, registers: &[(u8, u64)]) -> ScriptedStop {
    ScriptedStop {
        signal,
        thread,
        registers: registers
            .iter()
            .map(|&(index, value)| RegisterValue { index, value })
            .collect(),
    }
}

fn create_test_script() -> Script {
    Script {
        scripted_stops: vec![
            stop(5, None, &[(0, 0x0500), (1, 0x0000)]),
            stop(5, None, &[(0, 0x0510), (1, 0xffba), (2, 0x0005)]),
            stop(5, Some(3), &[(0, 0x0516), (1, 0xffba), (3, 0x0001)]),
        ],
        scripted_memory: vec![
            ScriptedMemoryBlob::new("3140c0ff"),
            ScriptedMemoryBlob::new("280500000a05"),
        ],
        max_packet_size: 0x4000,
        register_width: 2,
    }
}

#[test]
fn test_process_command_basic() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(
        responder.process_command("qSupported:multiprocess+").unwrap(),
        "PacketSize=4000"
    );
    assert_eq!(responder.process_command("Z0,510,2").unwrap(), "OK");
    assert_eq!(responder.process_command("c").unwrap(), "T0500:0005;01:0000;");
    assert_eq!(
        responder.process_command("c").unwrap(),
        "T0500:1005;01:baff;02:0500;"
    );
    assert_eq!(
        responder.process_command("s").unwrap(),
        "T0500:1605;01:baff;03:0100;thread:3;"
    );

    // Test unknown command
    assert_eq!(responder.process_command("X").unwrap(), UNSUPPORTED);
}

#[test]
fn test_halt_reason_draws_from_stop_stream() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("?").unwrap(), "T0500:0005;01:0000;");
    assert_eq!(
        responder.process_command("c").unwrap(),
        "T0500:1005;01:baff;02:0500;"
    );
    assert_eq!(responder.state().stops.consumed(), 2);
}

#[test]
fn test_stop_exhausted() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();
    for _ in 0..3 {
        responder.process_command("c").unwrap();
    }

    let err = responder.process_command("vCont;c").unwrap_err();
    assert!(matches!(
        err,
        StubError::SequenceExhausted {
            stream: Stream::Stop,
            ordinal: 4,
            available: 3
        }
    ));
    assert_eq!(responder.state().stops.state(), StopState::Exhausted);
}

#[test]
fn test_process_command_memory() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("m500,4").unwrap(), "3140c0ff");
    // Address is not used: the second read gets the second blob
    assert_eq!(responder.process_command("m500,6").unwrap(), "280500000a05");

    let err = responder.process_command("m500,6").unwrap_err();
    assert!(matches!(
        err,
        StubError::SequenceExhausted {
            stream: Stream::Memory,
            ..
        }
    ));
}

#[test]
fn test_memory_size_mismatch() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    let err = responder.process_command("mfe00,200").unwrap_err();
    assert!(matches!(
        err,
        StubError::SizeMismatch {
            ordinal: 1,
            requested: 0x200,
            scripted: 4
        }
    ));
    assert!(err.is_fixture_error());
}

#[test]
fn test_malformed_memory_read_is_recoverable() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("m500").unwrap(), UNSUPPORTED);
    assert_eq!(responder.process_command("mzz,4").unwrap(), UNSUPPORTED);

    // Malformed reads do not consume a blob
    assert_eq!(responder.state().memory.consumed(), 0);
    assert_eq!(responder.process_command("m500,4").unwrap(), "3140c0ff");
}

#[test]
fn test_streams_are_independent() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("m0,4").unwrap(), "3140c0ff");
    assert_eq!(responder.process_command("c").unwrap(), "T0500:0005;01:0000;");
    assert_eq!(
        responder.process_command("m0,6").unwrap(),
        "280500000a05"
    );
    assert_eq!(
        responder.process_command("s").unwrap(),
        "T0500:1005;01:baff;02:0500;"
    );
    assert_eq!(responder.state().stops.consumed(), 2);
    assert_eq!(responder.state().memory.consumed(), 2);
}

#[test]
fn test_process_command_registers() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    // Before any stop every register reads as zero; the file covers
    // registers 0..=3, the highest index any stop lists
    assert_eq!(responder.process_command("p0").unwrap(), "0000");
    assert_eq!(responder.process_command("g").unwrap(), "0000000000000000");

    responder.process_command("c").unwrap();
    responder.process_command("c").unwrap();
    assert_eq!(responder.process_command("p0").unwrap(), "1005");
    assert_eq!(responder.process_command("p01").unwrap(), "baff");
    assert_eq!(responder.process_command("p0f").unwrap(), "0000");
    assert_eq!(responder.process_command("g").unwrap(), "1005baff05000000");

    responder.process_command("s").unwrap();
    // Register 2 is not listed in the third stop
    assert_eq!(responder.process_command("g").unwrap(), "1605baff00000100");

    assert_eq!(responder.process_command("pxyz").unwrap(), UNSUPPORTED);

    // Register reads never advance a stream
    assert_eq!(responder.state().stops.consumed(), 3);
    assert_eq!(responder.state().memory.consumed(), 0);
}

#[test]
fn test_register_file_without_registers() {
    let script = Script {
        scripted_stops: vec![stop(5, None, &[])],
        ..Script::default()
    };
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("g").unwrap(), NO_REGISTERS);
    responder.process_command("c").unwrap();
    assert_eq!(responder.process_command("g").unwrap(), NO_REGISTERS);
    assert_ne!(NO_REGISTERS, UNSUPPORTED);
}

#[test]
fn test_responder_rejects_unvalidated_scripts() {
    // Odd-length blob would otherwise be sent as-is with no size check
    let script = Script {
        scripted_memory: vec![ScriptedMemoryBlob::new("abc")],
        ..create_test_script()
    };
    assert!(matches!(
        Responder::new(&script),
        Err(StubError::InvalidScript(_))
    ));

    let script = Script {
        scripted_memory: vec![ScriptedMemoryBlob::new("zz")],
        ..create_test_script()
    };
    assert!(matches!(
        Responder::new(&script),
        Err(StubError::InvalidScript(_))
    ));

    // 0x10000 does not fit a 2-byte register
    let script = Script {
        scripted_stops: vec![stop(5, None, &[(0, 0x1_0000)])],
        ..create_test_script()
    };
    assert!(matches!(
        Responder::new(&script),
        Err(StubError::InvalidScript(_))
    ));

    let script = Script {
        register_width: 16,
        ..create_test_script()
    };
    assert!(matches!(
        Responder::new(&script),
        Err(StubError::InvalidScript(_))
    ));
}

#[test]
fn test_query_commands_strict_conformance() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("qC").unwrap(), "QC1");
    assert_eq!(responder.process_command("qfThreadInfo").unwrap(), "m1");
    assert_eq!(responder.process_command("qsThreadInfo").unwrap(), "l");
    assert_eq!(responder.process_command("qAttached").unwrap(), "1");
    assert_eq!(responder.process_command("Hg0").unwrap(), "OK");
    assert_eq!(responder.process_command("qHostInfo").unwrap(), UNSUPPORTED);

    // Thread id follows the current stop
    for _ in 0..3 {
        responder.process_command("s").unwrap();
    }
    assert_eq!(responder.process_command("qC").unwrap(), "QC3");
    assert_eq!(responder.process_command("qfThreadInfo").unwrap(), "m3");
}

#[test]
fn test_process_command_connection() {
    let script = create_test_script();

    let mut responder = Responder::new(&script).unwrap();
    assert_eq!(responder.process_command("QStartNoAckMode").unwrap(), "OK");
    assert!(responder.state().no_ack_mode);
    assert_eq!(responder.process_command("D").unwrap(), "OK");
    assert!(responder.state().finished);

    let mut responder = Responder::new(&script).unwrap();
    assert_eq!(responder.process_command("k").unwrap(), UNSUPPORTED);
    assert!(responder.state().finished);
}

#[test]
fn test_process_command_breakpoints() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(responder.process_command("Z0,510,2").unwrap(), "OK");
    assert_eq!(responder.process_command("Z0,510,2").unwrap(), "OK");
    assert_eq!(responder.process_command("Z1,GG,2").unwrap(), "OK");
    assert_eq!(responder.process_command("z0,510,2").unwrap(), "OK");

    let bps = &responder.state().breakpoints;
    assert_eq!(bps.len(), 3);
    assert!(bps.is_breakpoint(0x510));

    // Breakpoints never touch the stop stream
    assert_eq!(responder.state().stops.state(), StopState::AwaitingFirstStop);
}

#[test]
fn test_handle_takes_decoded_commands() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();

    assert_eq!(
        responder.handle(Command::ReadMemory("0,4".to_string())).unwrap(),
        "3140c0ff"
    );
    assert_eq!(
        responder.handle(Command::Unknown("vMustReplyEmpty".to_string())).unwrap(),
        UNSUPPORTED
    );
}

#[test]
fn test_read_state_snapshot() {
    let script = create_test_script();
    let mut responder = Responder::new(&script).unwrap();
    responder.process_command("Z0,510,2").unwrap();
    responder.process_command("c").unwrap();
    responder.process_command("m0,4").unwrap();

    let state = responder.state().read_state();
    assert_eq!(state["stops_consumed"], 1);
    assert_eq!(state["memory_reads"], 1);
    assert_eq!(state["stop_state"]["StopAvailable"], 1);
    assert_eq!(state["breakpoints"][0]["address"], 0x510);
    assert_eq!(state["breakpoints"][0]["set"], true);
    assert_eq!(state["finished"], false);

    let initial = Responder::new(&script).unwrap().state().read_state();
    assert_eq!(initial["stop_state"], "AwaitingFirstStop");
}
