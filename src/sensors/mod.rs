//! Off-chip sensors read over a timed single-wire protocol.

pub mod dht11;

pub use dht11::{Dht11, Dht11State, SensorReading};
