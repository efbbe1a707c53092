//! Decoder timing configuration
//!
//! All tick constants used by the two protocols.  Defaults reproduce the
//! reference board: the sensor counter runs at the undivided bus clock
//! (~20.97 MHz, ~48 ns/tick) and the remote counter at clock/128
//! (~6.1 µs/tick).  Values can be persisted as a compact postcard blob.

use serde::{Deserialize, Serialize};

use crate::ports::Ticks;
use crate::timer::DEFAULT_FULL_SCALE;

/// Upper bound on the encoded size of a [`DecoderConfig`].
pub const CONFIG_BLOB_MAX: usize = 48;

/// Timing of the single-wire sensor protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorTiming {
    /// Longest single measurement before giving up.
    pub full_scale_ticks: Ticks,
    /// How long the host holds the line low to wake the sensor.
    pub start_low_ticks: Ticks,
    /// How long the host releases the line high before sensing.
    pub start_release_ticks: Ticks,
    /// High marks longer than this decode as `1`.
    pub one_threshold_ticks: Ticks,
}

impl Default for SensorTiming {
    fn default() -> Self {
        Self {
            full_scale_ticks: DEFAULT_FULL_SCALE,
            start_low_ticks: 7 * DEFAULT_FULL_SCALE, // ~21.9 ms
            start_release_ticks: 1000,               // ~48 µs
            one_threshold_ticks: 999,                // >= 1000 ticks (~48 µs) is a one
        }
    }
}

/// Timing of the pulse-distance remote protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTiming {
    /// Longest single measurement before giving up.
    pub full_scale_ticks: Ticks,
    /// Mark + space periods longer than this decode as `1`.
    pub one_threshold_ticks: Ticks,
}

impl Default for RemoteTiming {
    fn default() -> Self {
        Self {
            full_scale_ticks: DEFAULT_FULL_SCALE,
            one_threshold_ticks: 275, // ~1.68 ms, between 1.125 ms and 2.25 ms
        }
    }
}

/// Timing for both decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecoderConfig {
    pub sensor: SensorTiming,
    pub remote: RemoteTiming,
}

/// Errors from validating or (de)serialising a [`DecoderConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` names the field and why.
    ValidationFailed(&'static str),
    /// The blob did not fit the buffer or could not be decoded.
    Encoding,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::Encoding => write!(f, "config encoding error"),
        }
    }
}

impl SensorTiming {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.full_scale_ticks == 0 {
            return Err(ConfigError::ValidationFailed("sensor.full_scale_ticks is zero"));
        }
        if self.one_threshold_ticks >= self.full_scale_ticks {
            return Err(ConfigError::ValidationFailed(
                "sensor.one_threshold_ticks must be below full scale",
            ));
        }
        if self.start_low_ticks == 0 {
            return Err(ConfigError::ValidationFailed("sensor.start_low_ticks is zero"));
        }
        Ok(())
    }
}

impl RemoteTiming {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.full_scale_ticks == 0 {
            return Err(ConfigError::ValidationFailed("remote.full_scale_ticks is zero"));
        }
        if self.one_threshold_ticks >= self.full_scale_ticks {
            return Err(ConfigError::ValidationFailed(
                "remote.one_threshold_ticks must be below full scale",
            ));
        }
        Ok(())
    }
}

impl DecoderConfig {
    /// Reject out-of-range values.  Nothing is clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sensor.validate()?;
        self.remote.validate()
    }

    /// Validate, then serialise into `buf`.  Returns the used prefix.
    pub fn encode<'b>(&self, buf: &'b mut [u8]) -> Result<&'b mut [u8], ConfigError> {
        self.validate()?;
        postcard::to_slice(self, buf).map_err(|_| ConfigError::Encoding)
    }

    /// Deserialise and validate a blob produced by [`encode`](Self::encode).
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Encoding)?;
        config.validate()?;
        Ok(config)
    }
}
