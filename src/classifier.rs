//! Threshold classification of measured intervals into bits.
//!
//! Both protocols encode a bit in the length of one interval; they only
//! differ in which interval is measured and where the cutoff sits:
//!
//! | Protocol  | Measured interval        | `1` when                  |
//! |-----------|--------------------------|---------------------------|
//! | DHT11     | high mark of the cell    | mark longer than cutoff   |
//! | IR remote | mark + space of the cell | period longer than cutoff |
//!
//! Ties go to `0`: a count exactly equal to the threshold is a zero.

use crate::ports::Ticks;

/// A single decoded bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Bit {
    #[default]
    Zero = 0,
    One = 1,
}

impl From<bool> for Bit {
    fn from(b: bool) -> Self {
        if b { Self::One } else { Self::Zero }
    }
}

impl From<Bit> for u8 {
    fn from(b: Bit) -> Self {
        b as u8
    }
}

/// Map `ticks` to a bit: strictly above `threshold` is `1`.
#[inline]
pub const fn classify(ticks: Ticks, threshold: Ticks) -> Bit {
    if ticks > threshold { Bit::One } else { Bit::Zero }
}

/// A classifier bound to one protocol's cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PulseClassifier {
    threshold: Ticks,
}

impl PulseClassifier {
    pub const fn new(threshold: Ticks) -> Self {
        Self { threshold }
    }

    #[inline]
    pub const fn classify(&self, ticks: Ticks) -> Bit {
        classify(ticks, self.threshold)
    }
}
