//! Sensor subsystem: individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns the I2C bus and every driver on it, plus the one-wire probe
//! bank, and implements [`SensorPort`] by reading one channel family at a
//! time.  [`worker::TimedSensorPort`] wraps any port to bound each read by a
//! timeout.
//!
//! ```text
//!            ┌── TCA9548A ──┬── ch0: BME280 (vial 1)
//!   I2C bus ─┤              ├── ch1: BME280 (vial 2) ...
//!            ├── BME280 (atmosphere)
//!            ├── ADS1115 (LED reference x4)
//!            └── ADS7830 (optical density x8)
//!   w1 sysfs ── DS18B20 x M (external temperature)
//! ```

pub mod ads1115;
pub mod ads7830;
pub mod bme280;
pub mod ds18b20;
pub mod tca9548a;
#[cfg(test)]
pub(crate) mod testbus;
pub mod worker;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::info;

use crate::app::ports::SensorPort;
use crate::app::record::{Family, Readings};
use crate::config::RunConfig;
use crate::error::{InitError, SensorError};

use ads1115::Ads1115;
use ads7830::Ads7830;
use bme280::{Bme280, Measurement};
use ds18b20::ProbeBank;
use tca9548a::Tca9548a;

/// Aggregates all sensor drivers on one bus.
pub struct SensorHub<I: I2c> {
    i2c: I,
    mux: Tca9548a,
    vials: Vec<Bme280>,
    atmosphere: Bme280,
    led_ref: Ads1115,
    optical: Ads7830,
    probes: ProbeBank,
}

impl<I: I2c> SensorHub<I> {
    /// Attach every sensor.  The first one that does not answer aborts
    /// startup with an [`InitError`] naming it.
    pub fn init<D: DelayNs>(
        config: &RunConfig,
        mut i2c: I,
        mut delay: D,
    ) -> Result<Self, InitError> {
        let mux = Tca9548a::new(config.mux_address);
        mux.probe(&mut i2c).map_err(|e| {
            InitError::new("tca9548a", format!("no answer at {:#04x}: {e}", config.mux_address))
        })?;

        let mut vials = Vec::with_capacity(config.vial_count);
        for ch in 0..config.vial_count {
            mux.select(&mut i2c, ch as u8)
                .map_err(|e| InitError::new("tca9548a", format!("channel {ch}: {e}")))?;
            let sensor = Bme280::init(&mut i2c, &mut delay, config.bme280_vial_address)
                .map_err(|e| InitError::new("bme280 vial", format!("vial {}: {e}", ch + 1)))?;
            vials.push(sensor);
        }
        mux.disable(&mut i2c)
            .map_err(|e| InitError::new("tca9548a", e))?;
        info!("BME280: {} vial sensors attached", vials.len());

        let atmosphere = Bme280::init(&mut i2c, &mut delay, config.bme280_atm_address)
            .map_err(|e| {
                InitError::new(
                    "bme280 atmosphere",
                    format!("{:#04x}: {e}", config.bme280_atm_address),
                )
            })?;

        let led_ref = Ads1115::new(config.ads1115_address).ok_or_else(|| {
            InitError::new("ads1115", format!("unsupported address {:#04x}", config.ads1115_address))
        })?;
        led_ref
            .read_all(&mut i2c)
            .map_err(|e| InitError::new("ads1115", format!("{:#04x}: {e}", config.ads1115_address)))?;

        let optical = Ads7830::new(config.ads7830_address, config.ads7830_ref_voltage);
        optical
            .read_channel(&mut i2c, 0)
            .map_err(|e| InitError::new("ads7830", format!("{:#04x}: {e}", config.ads7830_address)))?;

        let probes = ProbeBank::init(&config.w1_devices_dir, &config.external_sensor_order)?;
        info!("Sensors attached: {} vials, {} external probes", vials.len(), probes.len());

        Ok(Self {
            i2c,
            mux,
            vials,
            atmosphere,
            led_ref,
            optical,
            probes,
        })
    }

    /// Measure every vial through the mux and keep one quantity.
    fn read_vials(&mut self, pick: fn(&Measurement) -> f64) -> Result<Readings, SensorError> {
        let Self {
            i2c, mux, vials, ..
        } = self;
        let result = collect_readings(vials.iter().enumerate().map(|(ch, sensor)| {
            mux.select(i2c, ch as u8)?;
            sensor.measure(i2c).map(|m| pick(&m))
        }));
        let released = mux.disable(i2c);
        let readings = result?;
        released?;
        Ok(readings)
    }

    fn read_atmosphere(&mut self) -> Result<Measurement, SensorError> {
        self.atmosphere.measure(&mut self.i2c)
    }
}

impl<I: I2c> SensorPort for SensorHub<I> {
    fn read_family(&mut self, family: Family) -> Result<Readings, SensorError> {
        match family {
            Family::ExternalTemperature => self.probes.read_all(),
            Family::AtmosphericTemperature => {
                let m = self.read_atmosphere()?;
                single(m.temperature_c)
            }
            Family::AtmosphericPressure => {
                let m = self.read_atmosphere()?;
                single(m.pressure_hpa)
            }
            Family::InternalTemperature => self.read_vials(|m| m.temperature_c),
            Family::InternalPressure => self.read_vials(|m| m.pressure_hpa),
            Family::InternalHumidity => self.read_vials(|m| m.humidity_pct),
            Family::LedReference => self.led_ref.read_all(&mut self.i2c),
            Family::OpticalDensity => {
                let Self { i2c, optical, .. } = self;
                collect_readings((0..ads7830::CHANNELS).map(|ch| optical.read_channel(i2c, ch)))
            }
        }
    }
}

fn single(value: f64) -> Result<Readings, SensorError> {
    collect_readings(core::iter::once(Ok(value)))
}

/// All-or-nothing collection: the first failing channel fails the family.
fn collect_readings(
    values: impl Iterator<Item = Result<f64, SensorError>>,
) -> Result<Readings, SensorError> {
    let mut out = Readings::new();
    for value in values {
        out.push(value?).map_err(|_| SensorError::WidthMismatch)?;
    }
    Ok(out)
}
