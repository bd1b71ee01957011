//! TI ADS1115 16-bit ADC, used for the LED reference photodiodes.
//!
//! Driven through the `ads1x1x` crate: one-shot conversions on the four
//! single-ended inputs at ±4.096 V full scale.  The bus is shared with the
//! mux and the other sensors, so the device borrows it for one family read
//! at a time.

use ads1x1x::{Ads1x1x, FullScaleRange, TargetAddr, channel, ic, mode};
use embedded_hal::i2c::I2c;
use nb::block;

use crate::app::record::Readings;
use crate::error::SensorError;

const FULL_SCALE: FullScaleRange = FullScaleRange::Within4_096V;
const FULL_SCALE_V: f64 = 4.096;

pub const CHANNELS: usize = 4;

/// One-shot ADS1115 on a borrowed bus.
pub type Adc<'a, I> = Ads1x1x<&'a mut I, ic::Ads1115, ic::Resolution16Bit, mode::OneShot>;

#[derive(Debug, Clone, Copy)]
pub struct Ads1115 {
    address: TargetAddr,
}

impl Ads1115 {
    /// `None` unless `address` is one of the four the ADDR pin can select
    /// (0x48..=0x4B).
    pub fn new(address: u8) -> Option<Self> {
        let address = match address {
            0x48 => TargetAddr::Gnd,
            0x49 => TargetAddr::Vdd,
            0x4A => TargetAddr::Sda,
            0x4B => TargetAddr::Scl,
            _ => return None,
        };
        Some(Self { address })
    }

    /// Convert a conversion result to volts.
    pub fn to_volts(raw: i16) -> f64 {
        f64::from(raw) * FULL_SCALE_V / 32_768.0
    }

    /// Read AIN0..AIN3 in volts.  The first failing channel fails the read.
    pub fn read_all<I: I2c>(&self, i2c: &mut I) -> Result<Readings, SensorError> {
        let mut adc: Adc<'_, I> = Ads1x1x::new_ads1115(i2c, self.address);
        adc.set_full_scale_range(FULL_SCALE).map_err(adc_error)?;

        let raw = [
            block!(adc.read(channel::SingleA0)).map_err(adc_error)?,
            block!(adc.read(channel::SingleA1)).map_err(adc_error)?,
            block!(adc.read(channel::SingleA2)).map_err(adc_error)?,
            block!(adc.read(channel::SingleA3)).map_err(adc_error)?,
        ];

        let mut out = Readings::new();
        for value in raw {
            out.push(Self::to_volts(value))
                .map_err(|_| SensorError::WidthMismatch)?;
        }
        Ok(out)
    }
}

fn adc_error<E>(e: ads1x1x::Error<E>) -> SensorError {
    match e {
        ads1x1x::Error::I2C(_) => SensorError::Bus,
        _ => SensorError::Parse,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::testbus::FakeBus;

    const REG_CONVERSION: u8 = 0x00;
    const REG_CONFIG: u8 = 0x01;

    /// An idle converter holding a half-scale positive result.
    fn idle_bus() -> FakeBus {
        let mut bus = FakeBus::new();
        bus.respond(0x49, REG_CONFIG, &[0x80, 0x00]);
        bus.respond(0x49, REG_CONVERSION, &[0x40, 0x00]);
        bus
    }

    #[test]
    fn accepts_only_addr_pin_addresses() {
        assert!(Ads1115::new(0x48).is_some());
        assert!(Ads1115::new(0x4B).is_some());
        assert!(Ads1115::new(0x47).is_none());
        assert!(Ads1115::new(0x4C).is_none());
    }

    #[test]
    fn scales_to_volts() {
        assert!((Ads1115::to_volts(16_384) - 2.048).abs() < 1e-9);
        assert!((Ads1115::to_volts(-32_768) + 4.096).abs() < 1e-9);
    }

    #[test]
    fn reads_four_channels_in_volts() {
        let mut bus = idle_bus();
        let volts = Ads1115::new(0x49).unwrap().read_all(&mut bus).unwrap();
        assert_eq!(volts.len(), CHANNELS);
        assert!(volts.iter().all(|v| (v - 2.048).abs() < 1e-9));
    }

    #[test]
    fn selects_each_input_at_4v_range() {
        let mut bus = idle_bus();
        Ads1115::new(0x49).unwrap().read_all(&mut bus).unwrap();

        let configs: Vec<u8> = bus
            .writes()
            .into_iter()
            .filter(|(addr, bytes)| *addr == 0x49 && bytes.len() == 3 && bytes[0] == REG_CONFIG)
            .map(|(_, bytes)| bytes[1])
            .collect();
        // MUX (bits 14:12 of the config word) 0b100..0b111: AINx against GND.
        for mux in [0x40, 0x50, 0x60, 0x70] {
            assert!(configs.iter().any(|hi| hi & 0x70 == mux), "no write for mux {mux:#04x}");
        }
        // PGA (bits 11:9) 0b001: ±4.096 V.
        assert!(configs.iter().all(|hi| hi & 0x0E == 0x02));
    }

    #[test]
    fn missing_device_is_bus_error() {
        let mut bus = idle_bus();
        bus.fail_address(0x49);
        assert_eq!(
            Ads1115::new(0x49).unwrap().read_all(&mut bus),
            Err(SensorError::Bus)
        );
    }
}
