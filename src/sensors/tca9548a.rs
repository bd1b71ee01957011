//! TCA9548A / PCA9546A I2C multiplexer.
//!
//! Every vial carries a BME280 at the same address, so each sits on its
//! own downstream channel.  Writing a one-hot byte to the mux connects that
//! channel to the main bus; writing zero disconnects all of them.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

/// Downstream channels on the 8-channel part.  The 4-channel PCA9546A
/// ignores the upper bits.
pub const CHANNELS: u8 = 8;

#[derive(Debug, Clone, Copy)]
pub struct Tca9548a {
    address: u8,
}

impl Tca9548a {
    pub fn new(address: u8) -> Self {
        Self { address }
    }

    /// Connect `channel` (0-based) to the main bus, disconnecting the others.
    pub fn select<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<(), SensorError> {
        if channel >= CHANNELS {
            return Err(SensorError::MuxSelect);
        }
        i2c.write(self.address, &[1 << channel])
            .map_err(|_| SensorError::MuxSelect)
    }

    /// Disconnect every downstream channel.
    pub fn disable<I: I2c>(&self, i2c: &mut I) -> Result<(), SensorError> {
        i2c.write(self.address, &[0]).map_err(|_| SensorError::MuxSelect)
    }

    /// Currently selected channel mask.  Used to check the part answers.
    pub fn probe<I: I2c>(&self, i2c: &mut I) -> Result<u8, SensorError> {
        let mut buf = [0u8; 1];
        i2c.read(self.address, &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(buf[0])
    }
}
