//! Adapters: concrete implementations of the port traits.
//!
//! | Adapter      | Implements                             | Connects to                 |
//! |--------------|----------------------------------------|-----------------------------|
//! | `open_drain` | SignalLine                             | any embedded-hal I/O pin    |
//! | `sim`        | SignalLine, EdgeDetect, PulseCounter   | virtual-time bus (host only)|

pub mod open_drain;
#[cfg(not(target_os = "none"))]
pub mod sim;

pub use open_drain::OpenDrainLine;
