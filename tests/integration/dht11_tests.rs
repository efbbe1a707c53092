//! DHT11 acquisition over the simulated bus: handshake, validation and the
//! rule that only a clean packet replaces the stored bytes.

use embedded_hal::digital::PinState;
use pulsetrain::adapters::sim::{SimBus, SimCounter, SimLine, Waveform, dht11_ticks};
use pulsetrain::ports::LineMode;
use pulsetrain::sensors::{Dht11, Dht11State};
use pulsetrain::{DecodeError, ProtocolStatus, SensorReading};

use crate::mock_hw::{LineCall, RecordingLine, fast_sensor_timing};

/// Segment index of bit `k`'s low separator in `Waveform::dht11_response`.
fn separator_segment(k: usize) -> usize {
    3 + 2 * k
}

/// Segment index of bit `k`'s high mark.
fn mark_segment(k: usize) -> usize {
    4 + 2 * k
}

fn sensor(bus: &SimBus) -> Dht11<SimLine, SimCounter> {
    Dht11::new(bus.line(), bus.counter(), fast_sensor_timing())
}

#[test]
fn valid_packet_updates_both_bytes() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);

    bus.play(Waveform::dht11_response([0x37, 0x00, 0x18, 0x00, 0x4F]));
    let reading = dht.acquire().unwrap();

    assert_eq!(
        reading,
        SensorReading {
            humidity: 0x37,
            temperature: 0x18,
            parity: 0x4F,
        }
    );
    assert_eq!(dht.last_status(), Some(ProtocolStatus::Ok));
    assert_eq!(dht.read_humidity(), 55);
    assert_eq!(dht.read_temperature(), 24);
}

#[test]
fn reads_are_idempotent_between_acquisitions() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);
    bus.play(Waveform::dht11_response([41, 0, 22, 0, 63]));
    dht.acquire().unwrap();

    let first = (dht.read_temperature(), dht.read_humidity());
    bus.advance(10_000);
    for _ in 0..3 {
        assert_eq!((dht.read_temperature(), dht.read_humidity()), first);
    }
}

#[test]
fn checksum_failure_leaves_previous_reading() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);
    bus.play(Waveform::dht11_response([30, 0, 21, 0, 51]));
    dht.acquire().unwrap();

    // 40 + 25 = 65, parity says 66.
    bus.play(Waveform::dht11_response([40, 0, 25, 0, 66]));
    assert_eq!(dht.acquire(), Err(DecodeError::Checksum));
    assert_eq!(dht.last_status(), Some(ProtocolStatus::ChecksumError));
    assert_eq!(dht.read_humidity(), 30);
    assert_eq!(dht.read_temperature(), 21);
    assert_eq!(dht.last_reading().map(|r| r.parity), Some(51));
}

#[test]
fn overlong_mark_times_out_mid_frame() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);
    bus.play(Waveform::dht11_response([30, 0, 21, 0, 51]));
    dht.acquire().unwrap();

    let wave = Waveform::dht11_response([70, 0, 10, 0, 80]).stretched(mark_segment(17), 70_000);
    bus.play(wave);
    assert_eq!(dht.acquire(), Err(DecodeError::Timeout));
    assert_eq!(dht.last_status(), Some(ProtocolStatus::TimeoutError));
    assert_eq!(dht.state(), Dht11State::Failed(DecodeError::Timeout));
    assert_eq!((dht.read_humidity(), dht.read_temperature()), (30, 21));
}

#[test]
fn sensor_dropping_out_mid_frame_times_out() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);

    let wave = Waveform::dht11_response([70, 0, 10, 0, 80])
        .stretched(separator_segment(25), 70_000)
        .then_idle(PinState::Low);
    bus.play(wave);
    assert_eq!(dht.acquire(), Err(DecodeError::Timeout));
    assert_eq!(dht.last_reading(), None);
    assert_eq!(dht.read_temperature(), 0);
}

#[test]
fn marks_either_side_of_threshold() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);

    // Marks of 980 ticks read as zeros, 1_020 as ones, against 999.
    bus.play(Waveform::dht11_response_with([0x0F, 0, 0xF0, 0, 0xFF], 980, 1_020));
    let r = dht.acquire().unwrap();
    assert_eq!((r.humidity, r.temperature), (0x0F, 0xF0));
}

#[test]
fn recovers_after_failure() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);

    bus.play(Waveform::new());
    assert_eq!(dht.acquire(), Err(DecodeError::Timeout));

    bus.play(Waveform::dht11_response([12, 0, 34, 0, 46]));
    assert_eq!(dht.acquire().map(|r| r.temperature), Ok(34));
    assert_eq!(dht.state(), Dht11State::Done);
}

#[test]
fn handshake_call_sequence() {
    let bus = SimBus::new();
    let (line, calls) = RecordingLine::new(&bus);
    let mut dht = Dht11::new(line, bus.counter(), fast_sensor_timing());

    bus.play(Waveform::dht11_response([1, 0, 2, 0, 3]));
    dht.acquire().unwrap();

    assert_eq!(
        *calls.borrow(),
        vec![
            LineCall::SetMode(LineMode::Output),
            LineCall::Write(PinState::Low),
            LineCall::Write(PinState::High),
            LineCall::SetMode(LineMode::InputPullUp),
        ]
    );
}

#[test]
fn release_phase_lasts_configured_ticks() {
    let bus = SimBus::new();
    let mut dht = sensor(&bus);
    bus.play(Waveform::dht11_response([1, 0, 2, 0, 3]));
    dht.acquire().unwrap();

    let writes = bus.writes();
    let released_at = writes[1].0;
    // Sensor's reply starts after the release window; at least that long
    // elapses before the frame is done.
    let total = dht11_ticks::RESPONSE_DELAY + fast_sensor_timing().start_release_ticks;
    assert!(bus.now() - released_at >= total);
}
