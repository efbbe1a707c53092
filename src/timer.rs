//! Edge timer: "how long did the line stay at this level?"
//!
//! Wraps a [`PulseCounter`] and bounds every wait by the counter's full
//! scale.  A stuck or silent line therefore costs at most one full-scale
//! period per measurement, after which the measurement reports
//! `timed_out` instead of spinning forever.
//!
//! Measurements busy-wait.  They are not reentrant: one measurement per
//! timer/line pair at a time, which `&mut self` already enforces.

use embedded_hal::digital::PinState;

use crate::error::{DecodeError, LineFault, Result};
use crate::ports::{PulseCounter, SignalLine, Ticks};

/// Full scale of the 16-bit counter on the reference board.
pub const DEFAULT_FULL_SCALE: Ticks = 0xFFFF;

/// One measured interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseMeasurement {
    /// Ticks elapsed while the line held the level.
    pub ticks: Ticks,
    /// The counter reached full scale before the level changed.
    pub timed_out: bool,
}

impl PulseMeasurement {
    /// The tick count, or [`DecodeError::Timeout`] if the wait expired.
    pub fn into_ticks(self) -> Result<Ticks> {
        if self.timed_out {
            Err(DecodeError::Timeout)
        } else {
            Ok(self.ticks)
        }
    }
}

/// Bounded level-duration timer.
pub struct EdgeTimer<C> {
    counter: C,
    full_scale: Ticks,
}

impl<C: PulseCounter> EdgeTimer<C> {
    /// `full_scale` is the longest a single measurement may wait.
    pub fn new(counter: C, full_scale: Ticks) -> Self {
        Self {
            counter,
            full_scale: full_scale.max(1),
        }
    }

    pub fn full_scale(&self) -> Ticks {
        self.full_scale
    }

    /// Zero the counter and start a full-scale window.
    pub fn reset_and_arm(&mut self) {
        self.counter.reset();
        self.counter.arm_timeout(self.full_scale);
    }

    /// Block until `line` leaves `level` or the window expires.
    ///
    /// Maximum latency is one full-scale period.
    pub fn measure_level<L: SignalLine>(
        &mut self,
        line: &mut L,
        level: PinState,
    ) -> core::result::Result<PulseMeasurement, LineFault> {
        self.reset_and_arm();
        loop {
            if line.read()? != level {
                return Ok(PulseMeasurement {
                    ticks: self.counter.current_ticks(),
                    timed_out: false,
                });
            }
            if self.counter.has_timed_out() {
                return Ok(PulseMeasurement {
                    ticks: self.full_scale,
                    timed_out: true,
                });
            }
        }
    }

    /// [`measure_level`](Self::measure_level), folding expiry into the error.
    pub fn measure(&mut self, line: &mut impl SignalLine, level: PinState) -> Result<Ticks> {
        self.measure_level(line, level)?.into_ticks()
    }

    /// Current counter value, without blocking.
    pub fn read_free_running_count(&self) -> Ticks {
        self.counter.current_ticks()
    }

    /// Busy-wait for `ticks`, in full-scale chunks when longer than one window.
    pub fn hold(&mut self, ticks: Ticks) {
        let mut remaining = ticks;
        while remaining > 0 {
            let chunk = remaining.min(self.full_scale);
            self.counter.reset();
            self.counter.arm_timeout(chunk);
            while !self.counter.has_timed_out() {}
            remaining -= chunk;
        }
    }

    pub fn into_inner(self) -> C {
        self.counter
    }
}
