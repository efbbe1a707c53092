//! Port traits: the boundary between the decoders and the hardware.
//!
//! ```text
//!   GPIO / timer adapter ──▶ Port trait ──▶ Dht11 / IrRemote
//! ```
//!
//! The decoders take these by value at construction, so the same protocol
//! code runs against real registers, an embedded-hal pin, or the virtual-time
//! [`sim`](crate::adapters::sim) bus in tests.
//!
//! Line control and edge detection are separate capabilities.  A line that
//! can raise interrupts implements both; nothing inherits from anything.

use embedded_hal::digital::PinState;

use crate::error::LineFault;

/// Counter ticks.  The hardware counter is 16 bits wide on the reference
/// board, but the arithmetic is done in 32 bits so multi-window holds and
/// mark + space sums never overflow.
pub type Ticks = u32;

// ───────────────────────────────────────────────────────────────
// Digital line
// ───────────────────────────────────────────────────────────────

/// Direction/pull configuration of a [`SignalLine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineMode {
    /// The MCU drives the line.
    Output,
    /// The MCU senses the line, no internal pull.
    Input,
    /// The MCU senses the line with the internal pull-up enabled.
    InputPullUp,
}

impl LineMode {
    pub fn is_input(self) -> bool {
        !matches!(self, Self::Output)
    }
}

/// A single digital line that can be switched between drive and sense.
pub trait SignalLine {
    /// Switch direction / pull configuration.
    fn set_mode(&mut self, mode: LineMode) -> Result<(), LineFault>;

    /// Drive the line (only meaningful in [`LineMode::Output`]).
    fn write(&mut self, level: PinState) -> Result<(), LineFault>;

    /// Sample the current logic level.
    fn read(&mut self) -> Result<PinState, LineFault>;
}

// ───────────────────────────────────────────────────────────────
// Edge detection capability
// ───────────────────────────────────────────────────────────────

/// Interrupt-on-edge capability, composed next to [`SignalLine`].
pub trait EdgeDetect {
    /// Enable the falling-edge interrupt for this line.
    fn arm_edge_detection(&mut self) -> Result<(), LineFault>;

    /// Disable the edge interrupt.
    fn disarm_edge_detection(&mut self) -> Result<(), LineFault>;

    /// Acknowledge a latched edge so the interrupt can fire again.
    fn clear_edge_flag(&mut self) -> Result<(), LineFault>;
}

// ───────────────────────────────────────────────────────────────
// Free-running counter
// ───────────────────────────────────────────────────────────────

/// A free-running hardware counter with a programmable expiry.
///
/// `has_timed_out` is polled in tight loops; implementations must not block.
pub trait PulseCounter {
    /// Zero the counter and clear any pending expiry.
    fn reset(&mut self);

    /// Start counting; expire once `max_ticks` have elapsed since `reset`.
    fn arm_timeout(&mut self, max_ticks: Ticks);

    /// Whether the armed window has elapsed.
    fn has_timed_out(&self) -> bool;

    /// Ticks elapsed since the last `reset`.
    fn current_ticks(&self) -> Ticks;
}
