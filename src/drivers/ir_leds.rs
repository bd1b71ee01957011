//! IR LED bank behind the optical-density photodiodes.
//!
//! One GPIO drives the LED driver's enable input: high = lit.  The bank is
//! only lit while optical density is being sampled.

use embedded_hal::digital::OutputPin;

pub struct IrLeds<P: OutputPin> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> IrLeds<P> {
    /// Takes the pin and drives it low.
    pub fn new(mut pin: P) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self { pin, on: false })
    }

    pub fn on(&mut self) -> Result<(), P::Error> {
        self.pin.set_high()?;
        self.on = true;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.pin.set_low()?;
        self.on = false;
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
