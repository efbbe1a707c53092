//! Remote receiver over the simulated bus: start latch, framing offset,
//! overwrite reporting and timeout handling.

use pulsetrain::adapters::sim::{SimBus, SimCounter, SimLine, Waveform};
use pulsetrain::remote::RemoteState;
use pulsetrain::{DecodeError, EdgeLatch, IrRemote, ProtocolStatus, RemoteCommand};

use crate::mock_hw::{LineCall, RecordingLine, fast_remote_timing};

const FRAME: [u8; 4] = [0x00, 0xFF, 0x45, 0xBA];

/// Segment index of cell `k`'s space in `Waveform::remote_frame`.
fn space_segment(k: usize) -> usize {
    3 + 2 * k
}

fn receiver<'a>(bus: &SimBus, latch: &'a EdgeLatch) -> IrRemote<'a, SimLine, SimCounter> {
    let mut ir = IrRemote::new(bus.line(), bus.counter(), latch, fast_remote_timing());
    ir.enable().unwrap();
    ir
}

#[test]
fn second_frame_is_read_one_position_late() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    bus.play(Waveform::remote_bytes(FRAME));
    assert_eq!(ir.framing_offset(), 0);
    assert_eq!(
        ir.wait_command_available(),
        Ok(RemoteCommand {
            address: 0x00,
            command: 0x45,
        })
    );
    assert_eq!(ir.read_command(), 0x45);
    assert_eq!(ir.framing_offset(), 1);

    bus.play(Waveform::remote_bytes(FRAME));
    let second = ir.wait_command_available().unwrap();
    assert_eq!(second.command, 0x8A);
    assert_eq!(ir.read_command(), 0x8A);
}

#[test]
fn unread_command_is_overwritten() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    bus.play(Waveform::remote_bytes([0x10, 0xEF, 0x01, 0xFE]));
    ir.wait_command_available().unwrap();
    assert!(ir.has_unread());

    bus.play(Waveform::remote_bytes([0x10, 0xEF, 0x03, 0xFC]));
    assert_eq!(ir.wait_command_available(), Err(DecodeError::Overwrite));
    assert_eq!(ir.last_status(), Some(ProtocolStatus::OverwriteError));
    // The newer frame is kept (with the late window).
    assert_eq!(ir.read_command(), 0x06);
    assert_eq!(ir.read_address(), 0x20);
    assert!(!ir.has_unread());
}

#[test]
fn read_in_between_avoids_overwrite() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    for _ in 0..3 {
        bus.play(Waveform::remote_bytes([0x02, 0xFD, 0x11, 0xEE]));
        assert!(ir.wait_command_available().is_ok());
        ir.read_command();
    }
    assert_eq!(ir.last_status(), Some(ProtocolStatus::Ok));
}

#[test]
fn stalled_cell_times_out_and_keeps_bytes() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    bus.play(Waveform::remote_bytes(FRAME));
    ir.wait_command_available().unwrap();
    ir.read_command();

    bus.play(Waveform::remote_bytes([0x01, 0xFE, 0x77, 0x88]).stretched(space_segment(20), 10_000));
    assert_eq!(ir.wait_command_available(), Err(DecodeError::Timeout));
    assert_eq!(ir.last_status(), Some(ProtocolStatus::TimeoutError));
    assert_eq!(ir.read_address(), 0x00);
    assert_eq!(ir.read_command(), 0x45);
    assert!(!ir.has_unread());
}

#[test]
fn rejected_address_does_not_advance_offset() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    bus.play(Waveform::remote_bytes([0xFF, 0x00, 0x12, 0xED]));
    assert_eq!(ir.wait_command_available(), Err(DecodeError::Checksum));
    assert_eq!(ir.framing_offset(), 0);

    bus.play(Waveform::remote_bytes([0x04, 0xFB, 0x12, 0xED]));
    assert_eq!(ir.wait_command_available().map(|c| c.command), Ok(0x12));
}

#[test]
fn interrupt_handler_records_start_in_static_latch() {
    static LATCH: EdgeLatch = EdgeLatch::new();

    let bus = SimBus::new();
    let mut ir = receiver(&bus, &LATCH);
    let isr = |ticks| LATCH.record_edge(ticks);

    assert!(!ir.command_available());
    bus.advance(123);
    bus.play(Waveform::remote_bytes(FRAME));
    assert!(isr(bus.now()));
    assert_eq!(LATCH.last_edge_ticks(), 123);
    assert!(ir.command_available());
    assert_eq!(ir.state(), RemoteState::StartDetected);

    ir.wait_command_available().unwrap();
    assert!(!ir.command_available());
    assert_eq!(ir.state(), RemoteState::Done);
}

#[test]
fn acquisition_masks_and_rearms_edge_interrupt() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let (line, calls) = RecordingLine::new(&bus);
    let mut ir = IrRemote::new(line, bus.counter(), &latch, fast_remote_timing());

    ir.enable().unwrap();
    bus.play(Waveform::remote_bytes(FRAME));
    ir.wait_command_available().unwrap();
    ir.clear_pending_edge().unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![
            LineCall::SetMode(pulsetrain::ports::LineMode::Input),
            LineCall::ClearEdge,
            LineCall::ArmEdge,
            LineCall::DisarmEdge,
            LineCall::ClearEdge,
            LineCall::ArmEdge,
            LineCall::ClearEdge,
        ]
    );
    assert!(bus.edge_armed());
}

#[test]
fn busy_receiver_reports_concurrent_access() {
    let bus = SimBus::new();
    let latch = EdgeLatch::new();
    let mut ir = receiver(&bus, &latch);

    let token = latch.try_claim().unwrap();
    bus.play(Waveform::remote_bytes(FRAME));
    assert_eq!(ir.wait_command_available(), Err(DecodeError::ConcurrentAccess));
    assert_eq!(ir.last_status(), Some(ProtocolStatus::ConcurrentAccessError));
    assert!(latch.is_claimed());

    drop(token);
    bus.play(Waveform::remote_bytes(FRAME));
    assert!(ir.wait_command_available().is_ok());
}
