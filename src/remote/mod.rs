//! Infrared remote-control reception.
//!
//! [`latch`] is the interrupt-side half (start-of-frame flag and owner
//! token); [`ir`] is the blocking main-loop decoder that consumes it.

pub mod ir;
pub mod latch;

pub use ir::{IrRemote, RemoteCommand, RemoteState};
pub use latch::{EdgeLatch, SamplingGuard};
