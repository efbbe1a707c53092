//! Start-of-frame latch shared between the edge interrupt and the decoder.
//!
//! ## Hardware
//!
//! The receiver output idles high and every frame opens with a falling
//! edge.  The GPIO interrupt for that edge calls [`EdgeLatch::record_edge`],
//! which only stores a flag and one counter sample; it never blocks and
//! never touches the counter itself.  The main loop polls
//! [`EdgeLatch::is_pending`] and then runs the blocking acquisition.
//!
//! ## Ownership
//!
//! The latch also carries the owner token for the timer/line pair.  An
//! acquisition claims it for its whole duration; a second claim fails and
//! edges reported while it is held are dropped.
//!
//! State lives in a `critical_section::Mutex<Cell<_>>` rather than atomics
//! because Cortex-M0+ has no compare-and-swap.  `new` is `const`, so the
//! latch can sit in a `static` next to the interrupt handler.

use core::cell::Cell;

use critical_section::Mutex;

use crate::ports::Ticks;

#[derive(Debug, Clone, Copy)]
struct LatchState {
    pending: bool,
    edge_ticks: Ticks,
    owned: bool,
    dropped: u32,
}

impl LatchState {
    const fn new() -> Self {
        Self {
            pending: false,
            edge_ticks: 0,
            owned: false,
            dropped: 0,
        }
    }
}

/// Interrupt-safe start-of-frame flag plus owner token.
pub struct EdgeLatch {
    state: Mutex<Cell<LatchState>>,
}

impl Default for EdgeLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl EdgeLatch {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Cell::new(LatchState::new())),
        }
    }

    /// Interrupt hook: a falling edge was seen at counter value `ticks`.
    ///
    /// Returns `false` (and records nothing) while an acquisition owns the
    /// timer/line pair.
    pub fn record_edge(&self, ticks: Ticks) -> bool {
        self.update(|s| {
            if s.owned {
                s.dropped = s.dropped.wrapping_add(1);
                return false;
            }
            s.pending = true;
            s.edge_ticks = ticks;
            true
        })
    }

    /// A start edge was recorded and not yet consumed.
    pub fn is_pending(&self) -> bool {
        self.update(|s| s.pending)
    }

    /// Consume the pending flag; returns whether it was set.
    pub fn take_pending(&self) -> bool {
        self.update(|s| core::mem::replace(&mut s.pending, false))
    }

    /// Discard a pending start edge.
    pub fn clear(&self) {
        self.update(|s| s.pending = false);
    }

    /// Counter sample taken with the last recorded edge.
    pub fn last_edge_ticks(&self) -> Ticks {
        self.update(|s| s.edge_ticks)
    }

    /// Edges ignored because an acquisition was in progress.
    pub fn dropped_edges(&self) -> u32 {
        self.update(|s| s.dropped)
    }

    pub fn is_claimed(&self) -> bool {
        self.update(|s| s.owned)
    }

    /// Take the owner token.  `None` if someone else holds it.
    pub fn try_claim(&self) -> Option<SamplingGuard<'_>> {
        let claimed = self.update(|s| {
            if s.owned {
                false
            } else {
                s.owned = true;
                true
            }
        });
        claimed.then(|| SamplingGuard { latch: self })
    }

    fn update<R>(&self, f: impl FnOnce(&mut LatchState) -> R) -> R {
        critical_section::with(|cs| {
            let cell = self.state.borrow(cs);
            let mut s = cell.get();
            let r = f(&mut s);
            cell.set(s);
            r
        })
    }
}

/// Owner token; released on drop.
#[must_use = "the token is released as soon as the guard is dropped"]
pub struct SamplingGuard<'a> {
    latch: &'a EdgeLatch,
}

impl Drop for SamplingGuard<'_> {
    fn drop(&mut self) {
        self.latch.update(|s| s.owned = false);
    }
}
