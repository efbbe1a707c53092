//! embedded-hal open-drain line adapter.
//!
//! Single-wire buses are normally wired open-drain with a pull-up: the MCU
//! can only pull the line low, and "releasing" it means driving the output
//! high so the pull-up (or the peripheral) decides the level.  Any HAL pin
//! that implements both `InputPin` and `OutputPin` in that configuration
//! can therefore serve as a [`SignalLine`] without a real mode switch.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::error::LineFault;
use crate::ports::{LineMode, SignalLine};

/// [`SignalLine`] over an open-drain embedded-hal pin.
pub struct OpenDrainLine<P> {
    pin: P,
    mode: LineMode,
}

impl<P> OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    /// Wrap `pin`.  The line starts released.
    pub fn new(mut pin: P) -> Result<Self, LineFault> {
        pin.set_high().map_err(|e| LineFault::from_pin(&e))?;
        Ok(Self {
            pin,
            mode: LineMode::InputPullUp,
        })
    }

    pub fn mode(&self) -> LineMode {
        self.mode
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P> SignalLine for OpenDrainLine<P>
where
    P: InputPin + OutputPin,
{
    fn set_mode(&mut self, mode: LineMode) -> Result<(), LineFault> {
        if mode.is_input() {
            // Let go of the bus; the pull-up takes over.
            self.pin.set_high().map_err(|e| LineFault::from_pin(&e))?;
        }
        self.mode = mode;
        Ok(())
    }

    fn write(&mut self, level: PinState) -> Result<(), LineFault> {
        if self.mode.is_input() {
            log::debug!("open_drain: write({:?}) ignored while sensing", level);
            return Ok(());
        }
        self.pin.set_state(level).map_err(|e| LineFault::from_pin(&e))
    }

    fn read(&mut self) -> Result<PinState, LineFault> {
        self.pin
            .is_high()
            .map(PinState::from)
            .map_err(|e| LineFault::from_pin(&e))
    }
}
