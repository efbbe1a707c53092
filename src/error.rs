//! Unified error types for the pulse-train decoders.
//!
//! A single `DecodeError` enum that both protocols return, so the caller's
//! acquisition loop handles every outcome the same way.  All variants are
//! `Copy`; nothing here allocates.

use core::fmt;

use embedded_hal::digital::ErrorKind;

// ---------------------------------------------------------------------------
// Line faults
// ---------------------------------------------------------------------------

/// The digital line collaborator refused a mode change, write or read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineFault(pub ErrorKind);

impl LineFault {
    /// Fault with no more specific cause than "the pin said no".
    pub const fn other() -> Self {
        Self(ErrorKind::Other)
    }

    /// Map any embedded-hal pin error onto a fault.
    pub fn from_pin<E: embedded_hal::digital::Error>(e: &E) -> Self {
        Self(e.kind())
    }
}

impl fmt::Display for LineFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line fault: {}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Decode errors
// ---------------------------------------------------------------------------

/// Every acquisition attempt that does not end in `Ok` ends in one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// A required edge never arrived within the counter's full-scale window.
    Timeout,
    /// The frame was fully sampled but failed its validation rule.
    Checksum,
    /// A new remote frame completed before the previous command was read.
    Overwrite,
    /// Another acquisition already owns the timer/line pair.
    ConcurrentAccess,
    /// The line collaborator failed.
    Line(LineFault),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout waiting for edge"),
            Self::Checksum => write!(f, "frame failed validation"),
            Self::Overwrite => write!(f, "unread command overwritten"),
            Self::ConcurrentAccess => write!(f, "timer/line already in use"),
            Self::Line(e) => write!(f, "{e}"),
        }
    }
}

impl From<LineFault> for DecodeError {
    fn from(e: LineFault) -> Self {
        Self::Line(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol status
// ---------------------------------------------------------------------------

/// Outcome of the most recent acquisition, as a closed set of values.
///
/// Exactly one is produced per attempt.  Protocols keep the latest one so a
/// display layer can show "sensor not responding" without holding on to the
/// `Result` itself; before the first attempt there is none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolStatus {
    Ok,
    TimeoutError,
    ChecksumError,
    OverwriteError,
    ConcurrentAccessError,
    LineError,
}

impl ProtocolStatus {
    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }
}

impl From<DecodeError> for ProtocolStatus {
    fn from(e: DecodeError) -> Self {
        match e {
            DecodeError::Timeout => Self::TimeoutError,
            DecodeError::Checksum => Self::ChecksumError,
            DecodeError::Overwrite => Self::OverwriteError,
            DecodeError::ConcurrentAccess => Self::ConcurrentAccessError,
            DecodeError::Line(_) => Self::LineError,
        }
    }
}

impl<T> From<&Result<T>> for ProtocolStatus {
    fn from(r: &Result<T>) -> Self {
        match r {
            Ok(_) => Self::Ok,
            Err(e) => (*e).into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, DecodeError>;
