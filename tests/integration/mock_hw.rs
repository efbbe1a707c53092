//! Mock line adapter for integration tests.
//!
//! Wraps a simulated line and records every port call so tests can assert
//! on the exact sequence of mode switches, writes and interrupt handling.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::digital::PinState;
use pulsetrain::LineFault;
use pulsetrain::adapters::sim::{SimBus, SimLine};
use pulsetrain::config::{RemoteTiming, SensorTiming};
use pulsetrain::ports::{EdgeDetect, LineMode, SignalLine};

// ── Line call record ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum LineCall {
    SetMode(LineMode),
    Write(PinState),
    ArmEdge,
    DisarmEdge,
    ClearEdge,
}

// ── RecordingLine ─────────────────────────────────────────────

/// A [`SimLine`] that logs every non-read call into a shared history.
pub struct RecordingLine {
    inner: SimLine,
    calls: Rc<RefCell<Vec<LineCall>>>,
}

#[allow(dead_code)]
impl RecordingLine {
    pub fn new(bus: &SimBus) -> (Self, Rc<RefCell<Vec<LineCall>>>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let line = Self {
            inner: bus.line(),
            calls: Rc::clone(&calls),
        };
        (line, calls)
    }

    fn record(&self, call: LineCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl SignalLine for RecordingLine {
    fn set_mode(&mut self, mode: LineMode) -> Result<(), LineFault> {
        self.record(LineCall::SetMode(mode));
        self.inner.set_mode(mode)
    }

    fn write(&mut self, level: PinState) -> Result<(), LineFault> {
        self.record(LineCall::Write(level));
        self.inner.write(level)
    }

    fn read(&mut self) -> Result<PinState, LineFault> {
        self.inner.read()
    }
}

impl EdgeDetect for RecordingLine {
    fn arm_edge_detection(&mut self) -> Result<(), LineFault> {
        self.record(LineCall::ArmEdge);
        self.inner.arm_edge_detection()
    }

    fn disarm_edge_detection(&mut self) -> Result<(), LineFault> {
        self.record(LineCall::DisarmEdge);
        self.inner.disarm_edge_detection()
    }

    fn clear_edge_flag(&mut self) -> Result<(), LineFault> {
        self.record(LineCall::ClearEdge);
        self.inner.clear_edge_flag()
    }
}

// ── Timing presets ────────────────────────────────────────────

/// Sensor timing with a short wake-up pulse so each test polls less.
pub fn fast_sensor_timing() -> SensorTiming {
    SensorTiming {
        start_low_ticks: 2_000,
        ..SensorTiming::default()
    }
}

/// Remote timing with a smaller full scale so timeouts resolve quickly.
pub fn fast_remote_timing() -> RemoteTiming {
    RemoteTiming {
        full_scale_ticks: 5_000,
        ..RemoteTiming::default()
    }
}
