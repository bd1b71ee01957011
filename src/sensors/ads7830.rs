//! TI ADS7830 8-bit, 8-channel ADC, used for the optical-density photodiodes.
//!
//! The 8-bit result is widened to 16 bits (`raw << 8`) and scaled against
//! the external reference: `volts = (raw << 8) / 65535 * v_ref`.

use embedded_hal::i2c::I2c;

use crate::error::SensorError;

/// Single-ended input select.
const SINGLE_ENDED: u8 = 0x80;
/// Power-down bits: reference off, converter on between conversions.
const PD_ADC_ON: u8 = 0b01;

pub const CHANNELS: u8 = 8;

#[derive(Debug, Clone, Copy)]
pub struct Ads7830 {
    address: u8,
    ref_voltage: f64,
}

impl Ads7830 {
    pub fn new(address: u8, ref_voltage: f64) -> Self {
        Self {
            address,
            ref_voltage,
        }
    }

    /// Command byte for a single-ended conversion on `channel`.  The part
    /// numbers its inputs odd/even interleaved, hence the bit shuffle.
    pub fn command(channel: u8) -> u8 {
        let select = (channel >> 1) | ((channel & 0x01) << 2);
        SINGLE_ENDED | (select << 4) | (PD_ADC_ON << 2)
    }

    pub fn to_volts(&self, raw: u8) -> f64 {
        f64::from(u16::from(raw) << 8) / 65_535.0 * self.ref_voltage
    }

    pub fn read_channel<I: I2c>(&self, i2c: &mut I, channel: u8) -> Result<f64, SensorError> {
        if channel >= CHANNELS {
            return Err(SensorError::Parse);
        }
        let mut buf = [0u8; 1];
        i2c.write_read(self.address, &[Self::command(channel)], &mut buf)
            .map_err(|_| SensorError::Bus)?;
        Ok(self.to_volts(buf[0]))
    }
}
