//! Bosch BME280 temperature / pressure / humidity sensor.
//!
//! Runs in normal mode with x1 oversampling on all three channels and a
//! 1 s standby, so the data registers always hold a fresh conversion and a
//! read is a single burst.  Compensation uses the floating-point formulas
//! from the datasheet.
//!
//! Units: °C, hPa, %RH.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::error::SensorError;

const REG_CHIP_ID: u8 = 0xD0;
const REG_RESET: u8 = 0xE0;
const REG_CALIB_TP: u8 = 0x88;
const REG_CALIB_H: u8 = 0xE1;
const REG_CTRL_HUM: u8 = 0xF2;
const REG_CTRL_MEAS: u8 = 0xF4;
const REG_CONFIG: u8 = 0xF5;
const REG_DATA: u8 = 0xF7;

const CHIP_ID: u8 = 0x60;
const RESET_WORD: u8 = 0xB6;

/// Humidity oversampling x1.
const CTRL_HUM: u8 = 0x01;
/// Temperature x1, pressure x1, normal mode.
const CTRL_MEAS: u8 = 0x27;
/// 1000 ms standby, filter off.
const CONFIG: u8 = 0xA0;

/// Value the ADC reports for a skipped measurement.
const SKIPPED_20BIT: i32 = 0x80000;
const SKIPPED_16BIT: i32 = 0x8000;

/// Factory trimming parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Calibration {
    pub t1: u16,
    pub t2: i16,
    pub t3: i16,
    pub p1: u16,
    pub p2: i16,
    pub p3: i16,
    pub p4: i16,
    pub p5: i16,
    pub p6: i16,
    pub p7: i16,
    pub p8: i16,
    pub p9: i16,
    pub h1: u8,
    pub h2: i16,
    pub h3: u8,
    pub h4: i16,
    pub h5: i16,
    pub h6: i8,
}

impl Calibration {
    /// Decode the 0x88..=0xA1 block (26 bytes) and the 0xE1..=0xE7 block
    /// (7 bytes).
    pub fn parse(tp: &[u8; 26], h: &[u8; 7]) -> Self {
        let u16_at = |i: usize| u16::from_le_bytes([tp[i], tp[i + 1]]);
        let i16_at = |i: usize| i16::from_le_bytes([tp[i], tp[i + 1]]);
        Self {
            t1: u16_at(0),
            t2: i16_at(2),
            t3: i16_at(4),
            p1: u16_at(6),
            p2: i16_at(8),
            p3: i16_at(10),
            p4: i16_at(12),
            p5: i16_at(14),
            p6: i16_at(16),
            p7: i16_at(18),
            p8: i16_at(20),
            p9: i16_at(22),
            h1: tp[25],
            h2: i16::from_le_bytes([h[0], h[1]]),
            h3: h[2],
            h4: (i16::from(h[3] as i8) << 4) | i16::from(h[4] & 0x0F),
            h5: (i16::from(h[5] as i8) << 4) | i16::from(h[4] >> 4),
            h6: h[6] as i8,
        }
    }
}

/// One compensated sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub temperature_c: f64,
    pub pressure_hpa: f64,
    pub humidity_pct: f64,
}

/// Raw ADC counts from one data burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub temperature: i32,
    pub pressure: i32,
    pub humidity: i32,
}

impl RawSample {
    pub fn parse(data: &[u8; 8]) -> Self {
        let adc20 = |msb: u8, lsb: u8, xlsb: u8| {
            (i32::from(msb) << 12) | (i32::from(lsb) << 4) | (i32::from(xlsb) >> 4)
        };
        Self {
            pressure: adc20(data[0], data[1], data[2]),
            temperature: adc20(data[3], data[4], data[5]),
            humidity: (i32::from(data[6]) << 8) | i32::from(data[7]),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bme280 {
    address: u8,
    calibration: Calibration,
}

impl Bme280 {
    /// Check the chip id, reset, load calibration and start normal mode.
    pub fn init<I: I2c, D: DelayNs>(
        i2c: &mut I,
        delay: &mut D,
        address: u8,
    ) -> Result<Self, SensorError> {
        let mut id = [0u8; 1];
        i2c.write_read(address, &[REG_CHIP_ID], &mut id)
            .map_err(|_| SensorError::Bus)?;
        if id[0] != CHIP_ID {
            return Err(SensorError::Parse);
        }

        i2c.write(address, &[REG_RESET, RESET_WORD])
            .map_err(|_| SensorError::Bus)?;
        delay.delay_ms(5);

        let mut tp = [0u8; 26];
        let mut h = [0u8; 7];
        i2c.write_read(address, &[REG_CALIB_TP], &mut tp)
            .map_err(|_| SensorError::Bus)?;
        i2c.write_read(address, &[REG_CALIB_H], &mut h)
            .map_err(|_| SensorError::Bus)?;
        let calibration = Calibration::parse(&tp, &h);

        // ctrl_hum only takes effect after a ctrl_meas write.
        i2c.write(address, &[REG_CTRL_HUM, CTRL_HUM])
            .map_err(|_| SensorError::Bus)?;
        i2c.write(address, &[REG_CONFIG, CONFIG])
            .map_err(|_| SensorError::Bus)?;
        i2c.write(address, &[REG_CTRL_MEAS, CTRL_MEAS])
            .map_err(|_| SensorError::Bus)?;
        // First conversion at x1 oversampling takes under 10 ms.
        delay.delay_ms(10);

        Ok(Self {
            address,
            calibration,
        })
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Burst-read the data registers and compensate.
    pub fn measure<I: I2c>(&self, i2c: &mut I) -> Result<Measurement, SensorError> {
        let mut data = [0u8; 8];
        i2c.write_read(self.address, &[REG_DATA], &mut data)
            .map_err(|_| SensorError::Bus)?;
        compensate(&self.calibration, RawSample::parse(&data))
    }
}

/// Datasheet floating-point compensation.
pub fn compensate(cal: &Calibration, raw: RawSample) -> Result<Measurement, SensorError> {
    if raw.temperature == SKIPPED_20BIT || raw.pressure == SKIPPED_20BIT {
        return Err(SensorError::Parse);
    }

    let adc_t = f64::from(raw.temperature);
    let t1 = f64::from(cal.t1);
    let var1 = (adc_t / 16_384.0 - t1 / 1_024.0) * f64::from(cal.t2);
    let var2 = (adc_t / 131_072.0 - t1 / 8_192.0).powi(2) * f64::from(cal.t3);
    let t_fine = var1 + var2;
    let temperature_c = t_fine / 5_120.0;

    let pressure_hpa = compensate_pressure(cal, t_fine, f64::from(raw.pressure))? / 100.0;

    let humidity_pct = if raw.humidity == SKIPPED_16BIT {
        f64::NAN
    } else {
        compensate_humidity(cal, t_fine, f64::from(raw.humidity))
    };

    Ok(Measurement {
        temperature_c,
        pressure_hpa,
        humidity_pct,
    })
}

/// Pressure in Pa.
fn compensate_pressure(cal: &Calibration, t_fine: f64, adc_p: f64) -> Result<f64, SensorError> {
    let mut var1 = t_fine / 2.0 - 64_000.0;
    let mut var2 = var1 * var1 * f64::from(cal.p6) / 32_768.0;
    var2 += var1 * f64::from(cal.p5) * 2.0;
    var2 = var2 / 4.0 + f64::from(cal.p4) * 65_536.0;
    var1 = (f64::from(cal.p3) * var1 * var1 / 524_288.0 + f64::from(cal.p2) * var1) / 524_288.0;
    var1 = (1.0 + var1 / 32_768.0) * f64::from(cal.p1);
    if var1 == 0.0 {
        return Err(SensorError::Parse);
    }
    let mut p = 1_048_576.0 - adc_p;
    p = (p - var2 / 4_096.0) * 6_250.0 / var1;
    let var1 = f64::from(cal.p9) * p * p / 2_147_483_648.0;
    let var2 = p * f64::from(cal.p8) / 32_768.0;
    Ok(p + (var1 + var2 + f64::from(cal.p7)) / 16.0)
}

fn compensate_humidity(cal: &Calibration, t_fine: f64, adc_h: f64) -> f64 {
    let mut h = t_fine - 76_800.0;
    h = (adc_h - (f64::from(cal.h4) * 64.0 + f64::from(cal.h5) / 16_384.0 * h))
        * (f64::from(cal.h2) / 65_536.0
            * (1.0
                + f64::from(cal.h6) / 67_108_864.0
                    * h
                    * (1.0 + f64::from(cal.h3) / 67_108_864.0 * h)));
    h *= 1.0 - f64::from(cal.h1) * h / 524_288.0;
    h.clamp(0.0, 100.0)
}
