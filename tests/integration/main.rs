//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives one decoder end to end over
//! the virtual-time bus.  All tests run on the host with no real hardware
//! required.

mod dht11_tests;
mod mock_hw;
mod remote_tests;
