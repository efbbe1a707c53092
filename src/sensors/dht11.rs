//! DHT11 single-wire temperature/humidity sensor.
//!
//! ## Wire protocol
//!
//! ```text
//! host  ▔▔╲___________________╱▔▔▔▔╲
//!           start low ~20 ms   rel.  │
//! sensor                             ╲____╱▔▔▔▔╲__╱▔▔╲__╱▔▔▔▔▔▔╲ ...
//!                                     80µs  80µs  50µs 26µs 50µs  70µs
//!                                     ack         bit 0     bit 1
//! ```
//!
//! After the acknowledge the sensor sends 40 cells: a 50 µs low separator
//! followed by a high mark whose length is the bit (26–28 µs for `0`,
//! 70 µs for `1`).  Bytes on the wire: humidity, humidity decimal,
//! temperature, temperature decimal, parity.  Only bytes 0, 2 and 4 are
//! decoded; the validation rule is `humidity + temperature == parity`
//! in 8-bit arithmetic.
//!
//! ## State machine
//!
//! `Idle → Starting → AwaitingResponse → Sampling(n) → Validating → Done | Failed`
//!
//! Any wait that hits the counter's full scale lands in `Failed` with
//! [`DecodeError::Timeout`].  `Done`/`Failed` are left only by the next
//! [`acquire`](Dht11::acquire), which always runs a full cycle.

use embedded_hal::digital::PinState;
use log::{debug, warn};

use crate::classifier::{Bit, PulseClassifier};
use crate::config::SensorTiming;
use crate::error::{DecodeError, ProtocolStatus, Result};
use crate::frame::{FrameAssembler, SensorFrame};
use crate::ports::{LineMode, PulseCounter, SignalLine};
use crate::timer::EdgeTimer;

/// Frame positions of the decoded bytes.
const HUMIDITY_BIT: usize = 0;
const TEMPERATURE_BIT: usize = 16;
const PARITY_BIT: usize = 32;

/// Acquisition progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dht11State {
    Idle,
    Starting,
    AwaitingResponse,
    /// Number of bits collected so far.
    Sampling(u8),
    Validating,
    Done,
    Failed(DecodeError),
}

/// One validated packet, raw bytes as sent by the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SensorReading {
    /// Relative humidity, percent.
    pub humidity: u8,
    /// Temperature, degrees Celsius.
    pub temperature: u8,
    /// Parity byte from the wire.
    pub parity: u8,
}

impl SensorReading {
    /// Pull the three decoded bytes out of a complete frame.
    pub fn from_frame(frame: &SensorFrame) -> Self {
        Self {
            humidity: frame.byte(HUMIDITY_BIT),
            temperature: frame.byte(TEMPERATURE_BIT),
            parity: frame.byte(PARITY_BIT),
        }
    }

    /// `humidity + temperature == parity`, without carry past 8 bits.
    pub fn checksum_ok(&self) -> bool {
        self.humidity.wrapping_add(self.temperature) == self.parity
    }
}

/// DHT11 driver over an injected line and counter.
pub struct Dht11<L, C> {
    line: L,
    timer: EdgeTimer<C>,
    classifier: PulseClassifier,
    timing: SensorTiming,
    state: Dht11State,
    /// Outcome of the latest attempt; `None` until the first one.
    status: Option<ProtocolStatus>,
    /// Last validated packet; untouched by failed attempts.
    last: SensorReading,
    has_reading: bool,
}

impl<L, C> Dht11<L, C>
where
    L: SignalLine,
    C: PulseCounter,
{
    pub fn new(line: L, counter: C, timing: SensorTiming) -> Self {
        Self {
            line,
            timer: EdgeTimer::new(counter, timing.full_scale_ticks),
            classifier: PulseClassifier::new(timing.one_threshold_ticks),
            timing,
            state: Dht11State::Idle,
            status: None,
            last: SensorReading::default(),
            has_reading: false,
        }
    }

    /// Run one full acquisition cycle.
    ///
    /// Blocks for the start window plus the sensor's reply (~25 ms on real
    /// hardware); each individual wait is bounded by the counter's full
    /// scale.  Only an `Ok` result updates the stored bytes.
    pub fn acquire(&mut self) -> Result<SensorReading> {
        let result = self.run_cycle();
        self.status = Some(ProtocolStatus::from(&result));
        match result {
            Ok(reading) => {
                self.last = reading;
                self.has_reading = true;
                self.transition(Dht11State::Done);
                debug!(
                    "dht11: humidity={}% temperature={}C",
                    reading.humidity, reading.temperature
                );
            }
            Err(e) => {
                self.transition(Dht11State::Failed(e));
                warn!("dht11: acquisition failed: {}", e);
            }
        }
        result
    }

    /// Last decoded temperature byte.
    ///
    /// Only meaningful after an `Ok` acquisition; after a failure this is
    /// whatever the previous good packet held (zero if there never was one).
    pub fn read_temperature(&self) -> u8 {
        self.last.temperature
    }

    /// Last decoded humidity byte.  Same staleness rules as
    /// [`read_temperature`](Self::read_temperature).
    pub fn read_humidity(&self) -> u8 {
        self.last.humidity
    }

    /// The last validated packet, if any acquisition ever succeeded.
    pub fn last_reading(&self) -> Option<SensorReading> {
        self.has_reading.then_some(self.last)
    }

    /// Outcome of the latest acquisition, or `None` if none has run.
    pub fn last_status(&self) -> Option<ProtocolStatus> {
        self.status
    }

    pub fn state(&self) -> Dht11State {
        self.state
    }

    /// Hand the line and counter back.
    pub fn release(self) -> (L, C) {
        (self.line, self.timer.into_inner())
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn run_cycle(&mut self) -> Result<SensorReading> {
        self.transition(Dht11State::Starting);
        self.start_communication()?;

        self.transition(Dht11State::AwaitingResponse);
        self.line.set_mode(LineMode::InputPullUp)?;
        self.await_response()?;

        let frame = self.sample_frame()?;

        self.transition(Dht11State::Validating);
        let reading = SensorReading::from_frame(&frame);
        if !reading.checksum_ok() {
            debug!(
                "dht11: checksum {}+{} != {}",
                reading.humidity, reading.temperature, reading.parity
            );
            return Err(DecodeError::Checksum);
        }
        Ok(reading)
    }

    /// Hold the bus low long enough to wake the sensor, then release it.
    fn start_communication(&mut self) -> Result<()> {
        self.line.set_mode(LineMode::Output)?;
        self.line.write(PinState::Low)?;
        self.timer.hold(self.timing.start_low_ticks);
        self.line.write(PinState::High)?;
        self.timer.hold(self.timing.start_release_ticks);
        Ok(())
    }

    /// Released-high, ack low, ack high, first separator low.
    fn await_response(&mut self) -> Result<()> {
        for level in [PinState::High, PinState::Low, PinState::High, PinState::Low] {
            self.timer.measure(&mut self.line, level)?;
        }
        Ok(())
    }

    fn sample_frame(&mut self) -> Result<SensorFrame> {
        // Nothing is logged in here: every cycle spent outside the
        // measurement loop shortens the next measured mark.
        FrameAssembler::new().assemble(|n| -> Result<Bit> {
            self.state = Dht11State::Sampling(n as u8);
            let mark = self.timer.measure(&mut self.line, PinState::High)?;
            // Separator is measured only to find the next rising edge.
            self.timer.measure(&mut self.line, PinState::Low)?;
            Ok(self.classifier.classify(mark))
        })
    }

    fn transition(&mut self, next: Dht11State) {
        if self.state != next {
            debug!("dht11: {:?} -> {:?}", self.state, next);
        }
        self.state = next;
    }
}
