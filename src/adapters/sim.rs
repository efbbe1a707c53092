//! Virtual-time simulation bus.
//!
//! Host-side stand-in for the GPIO line and the hardware counter, so the
//! decoders run deterministically without real elapsed time.
//!
//! - Time advances by exactly one tick each time a [`SimCounter`] is polled
//!   with `has_timed_out()`; nothing else moves the clock.
//! - A [`SimLine`] in a sensing mode plays back the loaded [`Waveform`].
//!   Playback restarts whenever the line switches into a sensing mode or
//!   [`SimBus::play`] is called.  Past the last segment the waveform holds
//!   its idle level.
//! - In output mode the line reads back whatever was last written, and every
//!   write is recorded with its timestamp.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::digital::PinState;

use crate::error::LineFault;
use crate::ports::{EdgeDetect, LineMode, PulseCounter, SignalLine, Ticks};

// ── Waveform ──────────────────────────────────────────────────

/// A scripted sequence of (level, duration) segments.
///
/// Segments are stored with their cumulative end time so playback lookups
/// are a binary search, not a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    segments: Vec<(PinState, Ticks)>,
    idle: PinState,
}

impl Default for Waveform {
    fn default() -> Self {
        Self::new()
    }
}

impl Waveform {
    /// Empty waveform idling high (pulled-up bus).
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            idle: PinState::High,
        }
    }

    /// Empty waveform stuck low.
    pub fn idle_low() -> Self {
        Self::new().then_idle(PinState::Low)
    }

    #[must_use]
    pub fn high(self, ticks: Ticks) -> Self {
        self.segment(PinState::High, ticks)
    }

    #[must_use]
    pub fn low(self, ticks: Ticks) -> Self {
        self.segment(PinState::Low, ticks)
    }

    #[must_use]
    pub fn segment(mut self, level: PinState, ticks: Ticks) -> Self {
        if ticks > 0 {
            let end = self.duration() + ticks;
            self.segments.push((level, end));
        }
        self
    }

    /// Level held after the last segment.
    #[must_use]
    pub fn then_idle(mut self, level: PinState) -> Self {
        self.idle = level;
        self
    }

    /// Replace the duration of segment `index` (zero-based, in push order).
    #[must_use]
    pub fn stretched(self, index: usize, ticks: Ticks) -> Self {
        let idle = self.idle;
        let mut out = Self::new().then_idle(idle);
        let mut start = 0;
        for (i, (level, end)) in self.segments.into_iter().enumerate() {
            let d = if i == index { ticks } else { end - start };
            start = end;
            out = out.segment(level, d);
        }
        out
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total scripted duration.
    pub fn duration(&self) -> Ticks {
        self.segments.last().map_or(0, |&(_, end)| end)
    }

    /// Level at `t` ticks after playback started.
    pub fn level_at(&self, t: Ticks) -> PinState {
        let i = self.segments.partition_point(|&(_, end)| end <= t);
        self.segments.get(i).map_or(self.idle, |&(level, _)| level)
    }
}

// ── Shared bus state ──────────────────────────────────────────

#[derive(Debug)]
struct BusState {
    now: Cell<Ticks>,
    origin: Cell<Ticks>,
    wave: RefCell<Waveform>,
    mode: Cell<LineMode>,
    driven: Cell<PinState>,
    writes: RefCell<Vec<(Ticks, PinState)>>,
    edge_armed: Cell<bool>,
    edge_clears: Cell<u32>,
    fail_reads: Cell<bool>,
}

/// Handle to the simulated world; clone freely.
#[derive(Debug, Clone)]
pub struct SimBus {
    state: Rc<BusState>,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    pub fn new() -> Self {
        Self {
            state: Rc::new(BusState {
                now: Cell::new(0),
                origin: Cell::new(0),
                wave: RefCell::new(Waveform::new()),
                mode: Cell::new(LineMode::Input),
                driven: Cell::new(PinState::High),
                writes: RefCell::new(Vec::new()),
                edge_armed: Cell::new(false),
                edge_clears: Cell::new(0),
                fail_reads: Cell::new(false),
            }),
        }
    }

    /// A line bound to this bus.
    pub fn line(&self) -> SimLine {
        SimLine { bus: self.clone() }
    }

    /// A counter bound to this bus.
    pub fn counter(&self) -> SimCounter {
        SimCounter {
            bus: self.clone(),
            base: 0,
            limit: Ticks::MAX,
        }
    }

    /// Load `wave` and start playing it now.
    pub fn play(&self, wave: Waveform) {
        *self.state.wave.borrow_mut() = wave;
        self.rewind();
    }

    /// Restart playback of the loaded waveform.
    pub fn rewind(&self) {
        self.state.origin.set(self.state.now.get());
    }

    pub fn now(&self) -> Ticks {
        self.state.now.get()
    }

    /// Let virtual time pass without anyone polling.
    pub fn advance(&self, ticks: Ticks) {
        self.state.now.set(self.state.now.get() + ticks);
    }

    pub fn mode(&self) -> LineMode {
        self.state.mode.get()
    }

    /// Every level driven so far, with its timestamp.
    pub fn writes(&self) -> Vec<(Ticks, PinState)> {
        self.state.writes.borrow().clone()
    }

    pub fn edge_armed(&self) -> bool {
        self.state.edge_armed.get()
    }

    pub fn edge_clears(&self) -> u32 {
        self.state.edge_clears.get()
    }

    /// Make every subsequent `read()` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.set(fail);
    }

    fn tick(&self) {
        self.advance(1);
    }

    fn sample(&self) -> PinState {
        let t = self.state.now.get() - self.state.origin.get();
        self.state.wave.borrow().level_at(t)
    }
}

// ── SimLine ───────────────────────────────────────────────────

/// Simulated digital line.
#[derive(Debug, Clone)]
pub struct SimLine {
    bus: SimBus,
}

impl SignalLine for SimLine {
    fn set_mode(&mut self, mode: LineMode) -> Result<(), LineFault> {
        let was_input = self.bus.state.mode.get().is_input();
        self.bus.state.mode.set(mode);
        if mode.is_input() && !was_input {
            self.bus.rewind();
        }
        Ok(())
    }

    fn write(&mut self, level: PinState) -> Result<(), LineFault> {
        self.bus.state.driven.set(level);
        self.bus
            .state
            .writes
            .borrow_mut()
            .push((self.bus.now(), level));
        Ok(())
    }

    fn read(&mut self) -> Result<PinState, LineFault> {
        if self.bus.state.fail_reads.get() {
            return Err(LineFault::other());
        }
        if self.bus.state.mode.get().is_input() {
            Ok(self.bus.sample())
        } else {
            Ok(self.bus.state.driven.get())
        }
    }
}

impl EdgeDetect for SimLine {
    fn arm_edge_detection(&mut self) -> Result<(), LineFault> {
        self.bus.state.edge_armed.set(true);
        Ok(())
    }

    fn disarm_edge_detection(&mut self) -> Result<(), LineFault> {
        self.bus.state.edge_armed.set(false);
        Ok(())
    }

    fn clear_edge_flag(&mut self) -> Result<(), LineFault> {
        let n = self.bus.state.edge_clears.get();
        self.bus.state.edge_clears.set(n + 1);
        Ok(())
    }
}

// ── SimCounter ────────────────────────────────────────────────

/// Simulated free-running counter.
#[derive(Debug, Clone)]
pub struct SimCounter {
    bus: SimBus,
    base: Ticks,
    limit: Ticks,
}

impl PulseCounter for SimCounter {
    fn reset(&mut self) {
        self.base = self.bus.now();
    }

    fn arm_timeout(&mut self, max_ticks: Ticks) {
        self.limit = max_ticks;
    }

    fn has_timed_out(&self) -> bool {
        self.bus.tick();
        self.current_ticks() >= self.limit
    }

    fn current_ticks(&self) -> Ticks {
        self.bus.now() - self.base
    }
}

// ── Protocol waveform builders ────────────────────────────────

/// Sensor response timing in counter ticks (undivided bus clock).
pub mod dht11_ticks {
    use crate::ports::Ticks;

    /// Delay before the sensor pulls the released bus low.
    pub const RESPONSE_DELAY: Ticks = 600;
    /// Sensor's 80 µs low acknowledge.
    pub const RESPONSE_LOW: Ticks = 1_680;
    /// Sensor's 80 µs high acknowledge.
    pub const RESPONSE_HIGH: Ticks = 1_680;
    /// 50 µs low separator before each bit.
    pub const BIT_LOW: Ticks = 1_050;
    /// 26–28 µs high mark for a zero.
    pub const ZERO_HIGH: Ticks = 560;
    /// 70 µs high mark for a one.
    pub const ONE_HIGH: Ticks = 1_470;
}

/// Remote timing in counter ticks (clock/128, ~6.1 µs per tick).
pub mod remote_ticks {
    use crate::ports::Ticks;

    /// 9 ms leader mark.
    pub const LEADER_MARK: Ticks = 1_474;
    /// 4.5 ms leader space.
    pub const LEADER_SPACE: Ticks = 737;
    /// 560 µs mark opening every cell.
    pub const MARK: Ticks = 92;
    /// 560 µs space of a zero (period ~1.125 ms).
    pub const ZERO_SPACE: Ticks = 92;
    /// 1.69 ms space of a one (period ~2.25 ms).
    pub const ONE_SPACE: Ticks = 277;
}

impl Waveform {
    /// What a DHT11 puts on the bus after the host releases it:
    /// acknowledge, then 40 bits of `bytes` MSB first, then release.
    pub fn dht11_response(bytes: [u8; 5]) -> Self {
        Self::dht11_response_with(bytes, dht11_ticks::ZERO_HIGH, dht11_ticks::ONE_HIGH)
    }

    /// As [`dht11_response`](Self::dht11_response) with explicit mark widths.
    pub fn dht11_response_with(bytes: [u8; 5], zero_high: Ticks, one_high: Ticks) -> Self {
        use dht11_ticks::{BIT_LOW, RESPONSE_DELAY, RESPONSE_HIGH, RESPONSE_LOW};

        let mut w = Self::new()
            .high(RESPONSE_DELAY)
            .low(RESPONSE_LOW)
            .high(RESPONSE_HIGH);
        for byte in bytes {
            for i in 0..8 {
                let one = byte & (0x80 >> i) != 0;
                w = w.low(BIT_LOW).high(if one { one_high } else { zero_high });
            }
        }
        w.low(BIT_LOW)
    }

    /// A remote frame: leader, 32 cells of `bits` MSB first, stop mark.
    /// The leader's falling edge is at t = 0.
    pub fn remote_frame(bits: u32) -> Self {
        use remote_ticks::{LEADER_MARK, LEADER_SPACE, MARK, ONE_SPACE, ZERO_SPACE};

        let mut w = Self::new().low(LEADER_MARK).high(LEADER_SPACE);
        for i in 0..32 {
            let one = bits & (0x8000_0000 >> i) != 0;
            w = w.low(MARK).high(if one { ONE_SPACE } else { ZERO_SPACE });
        }
        w.low(MARK)
    }

    /// A remote frame built from the four wire bytes.
    pub fn remote_bytes(bytes: [u8; 4]) -> Self {
        Self::remote_frame(u32::from_be_bytes(bytes))
    }
}
