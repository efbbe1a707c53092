//! Fuzz target: arbitrary pulse trains into both decoders
//!
//! Each input byte pair becomes one segment width, alternating low/high,
//! and the resulting waveform is played to a DHT11 and a remote receiver.
//! Neither may panic, and a failed acquisition must never change the
//! stored bytes.
//!
//! cargo fuzz run fuzz_pulse_widths

#![no_main]

use libfuzzer_sys::fuzz_target;
use pulsetrain::adapters::sim::{SimBus, Waveform};
use pulsetrain::config::{RemoteTiming, SensorTiming};
use pulsetrain::{Dht11, EdgeLatch, IrRemote};

fn waveform(data: &[u8]) -> Waveform {
    let mut w = Waveform::new();
    for (i, pair) in data.chunks(2).take(200).enumerate() {
        let width = u32::from(pair[0]) << 4 | u32::from(*pair.get(1).unwrap_or(&0)) >> 4;
        w = if i % 2 == 0 { w.low(width) } else { w.high(width) };
    }
    w
}

fuzz_target!(|data: &[u8]| {
    let sensor_timing = SensorTiming {
        full_scale_ticks: 5_000,
        start_low_ticks: 100,
        start_release_ticks: 10,
        one_threshold_ticks: 999,
    };
    let bus = SimBus::new();
    let mut dht = Dht11::new(bus.line(), bus.counter(), sensor_timing);
    bus.play(waveform(data));
    let before = dht.last_reading();
    if dht.acquire().is_err() {
        assert_eq!(dht.last_reading(), before);
    }

    let remote_timing = RemoteTiming {
        full_scale_ticks: 5_000,
        ..RemoteTiming::default()
    };
    let latch = EdgeLatch::new();
    let bus = SimBus::new();
    let mut ir = IrRemote::new(bus.line(), bus.counter(), &latch, remote_timing);
    let _ = ir.enable();
    bus.play(waveform(data));
    let _ = ir.wait_command_available();
    let before = (ir.read_address(), ir.read_command());

    bus.play(waveform(data));
    if ir.wait_command_available().is_err() {
        assert_eq!((ir.read_address(), ir.read_command()), before);
    }
    assert!(!latch.is_claimed());
});
