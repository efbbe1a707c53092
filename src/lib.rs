//! Timing-based pulse-train decoding.
//!
//! Decodes the two off-chip peripherals that talk by pulse width rather
//! than by a serial peripheral: a DHT11 temperature/humidity sensor and a
//! pulse-distance infrared remote.  Both share one pipeline:
//!
//! ```text
//!  EdgeTimer ──▶ PulseClassifier ──▶ FrameAssembler ──▶ protocol check ──▶ caller
//!  (ticks)        (bit)               (BitFrame)         (Dht11 / IrRemote)
//! ```
//!
//! Hardware is reached only through the [`ports`] traits; [`adapters`]
//! holds an embedded-hal open-drain line and, on hosted targets, a
//! virtual-time simulation bus.

#![cfg_attr(target_os = "none", no_std)]
#![deny(unused_must_use)]

pub mod adapters;
pub mod classifier;
pub mod config;
pub mod error;
pub mod frame;
pub mod ports;
pub mod remote;
pub mod sensors;
pub mod timer;

pub use config::DecoderConfig;
pub use error::{DecodeError, LineFault, ProtocolStatus, Result};
pub use remote::{EdgeLatch, IrRemote, RemoteCommand};
pub use sensors::{Dht11, SensorReading};
