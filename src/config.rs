//! Run configuration.
//!
//! All tunable parameters for a sampling run.  Defaults describe the rig as
//! built; a JSON file and command-line flags can override them.  Everything
//! here is fixed once the run starts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::pins::{self, PinNumbering};

/// Most vials a single multiplexer can route to.
pub const MAX_VIALS: usize = 8;
/// Most external probes a record can carry.
pub const MAX_EXTERNAL_PROBES: usize = 8;

/// Longest accepted time value of any kind (ten years, in seconds).
/// Anything larger cannot be represented as a `Duration` reliably.
pub const MAX_SECS: f64 = 10.0 * 365.0 * 86_400.0;

/// Ring-light colour policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RingLightPolicy {
    /// No scheduler; the ring light stays dark unless overridden.
    Off,
    /// Continuous hue rotation, one full turn per `period_secs`.
    HueWheel { period_secs: f64 },
    /// White for `on_secs`, then dark for `off_secs`, repeating.
    DayNight { on_secs: f64, off_secs: f64 },
}

impl Default for RingLightPolicy {
    fn default() -> Self {
        Self::HueWheel {
            period_secs: 3_600.0,
        }
    }
}

/// Core run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    // --- Timing ---
    /// Total run duration (seconds).
    pub duration_secs: f64,
    /// Target period between cycle starts (seconds).
    pub interval_secs: f64,
    /// Delay after IR LEDs switch on before reading (seconds).
    pub settle_secs: f64,
    /// Extra time past the budget in which a cycle may still start (seconds).
    pub grace_secs: f64,
    /// Upper bound on a single family read (seconds).
    pub read_timeout_secs: f64,

    // --- Output ---
    /// CSV output file.  `None` = timestamped file under `data/`.
    pub output_path: Option<PathBuf>,
    /// Live plot file re-rendered after every cycle.  `None` = no plot.
    pub plot_path: Option<PathBuf>,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,

    // --- Sensors ---
    /// Number of vials, each with its own BME280 behind the multiplexer.
    pub vial_count: usize,
    /// Permutation applied to the discovered DS18B20 probes (sorted by id).
    pub external_sensor_order: Vec<usize>,
    pub i2c_bus: String,
    pub mux_address: u8,
    pub ads1115_address: u8,
    pub ads7830_address: u8,
    pub ads7830_ref_voltage: f64,
    pub bme280_vial_address: u8,
    pub bme280_atm_address: u8,
    pub w1_devices_dir: PathBuf,

    // --- Actuators ---
    pub pin_numbering: PinNumbering,
    pub ir_led_pin: u8,
    pub ring_light_pins: [u8; 3],
    pub stirrer_pin: u8,
    /// Stirrer duty (0-100 %) applied before the first cycle.
    pub stirrer_duty: u8,

    // --- Ring light ---
    pub ring_light: RingLightPolicy,
    /// Seconds between ring-light scheduler ticks.
    pub ring_tick_secs: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            // Timing
            duration_secs: 600.0,
            interval_secs: 30.0,
            settle_secs: 1.0,
            grace_secs: 1.0,
            read_timeout_secs: 10.0,

            // Output
            output_path: None,
            plot_path: None,
            log_level: "info".into(),

            // Sensors
            vial_count: 4,
            external_sensor_order: vec![2, 0, 3, 1],
            i2c_bus: pins::I2C_BUS_PATH.into(),
            mux_address: pins::MUX_ADDRESS,
            ads1115_address: pins::ADS1115_ADDRESS,
            ads7830_address: pins::ADS7830_ADDRESS,
            ads7830_ref_voltage: pins::ADS7830_REF_VOLTAGE,
            bme280_vial_address: pins::BME280_VIAL_ADDRESS,
            bme280_atm_address: pins::BME280_ATM_ADDRESS,
            w1_devices_dir: pins::W1_DEVICES_DIR.into(),

            // Actuators
            pin_numbering: PinNumbering::Board,
            ir_led_pin: 37,
            ring_light_pins: [11, 13, 15],
            stirrer_pin: 12,
            stirrer_duty: 0,

            // Ring light
            ring_light: RingLightPolicy::default(),
            ring_tick_secs: 10.0,
        }
    }
}

impl RunConfig {
    /// Load a config file.  Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&text).map_err(ConfigError::Malformed)
    }

    /// Number of external temperature probes in every record.
    pub fn probe_count(&self) -> usize {
        self.external_sensor_order.len()
    }

    /// Reject values that would make the run meaningless or unsafe.
    /// Nothing is clamped: a bad value is an error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use ConfigError::ValidationFailed;

        if !within_range(self.duration_secs) {
            return Err(ValidationFailed("duration_secs must be a non-negative number of at most ten years"));
        }
        if !(within_range(self.interval_secs) && self.interval_secs > 0.0) {
            return Err(ValidationFailed("interval_secs must be positive and at most ten years"));
        }
        if !within_range(self.settle_secs) {
            return Err(ValidationFailed("settle_secs must be non-negative"));
        }
        if self.settle_secs >= self.interval_secs {
            return Err(ValidationFailed("settle_secs must be shorter than interval_secs"));
        }
        if !within_range(self.grace_secs) {
            return Err(ValidationFailed("grace_secs must be non-negative and at most ten years"));
        }
        if !(within_range(self.read_timeout_secs) && self.read_timeout_secs > 0.0) {
            return Err(ValidationFailed("read_timeout_secs must be positive and at most ten years"));
        }
        if self.vial_count == 0 || self.vial_count > MAX_VIALS {
            return Err(ValidationFailed("vial_count must be 1..=8"));
        }
        if self.probe_count() > MAX_EXTERNAL_PROBES {
            return Err(ValidationFailed("external_sensor_order lists more than 8 probes"));
        }
        if !is_permutation(&self.external_sensor_order) {
            return Err(ValidationFailed(
                "external_sensor_order must be a permutation of 0..n",
            ));
        }
        if !(self.ads7830_ref_voltage.is_finite() && self.ads7830_ref_voltage > 0.0) {
            return Err(ValidationFailed("ads7830_ref_voltage must be positive"));
        }
        if self.stirrer_duty > 100 {
            return Err(ValidationFailed("stirrer_duty must be 0..=100"));
        }
        if !(0x48..=0x4B).contains(&self.ads1115_address) {
            return Err(ValidationFailed("ads1115_address must be 0x48..=0x4B"));
        }
        if !(within_range(self.ring_tick_secs) && self.ring_tick_secs > 0.0) {
            return Err(ValidationFailed("ring_tick_secs must be positive and at most ten years"));
        }
        match self.ring_light {
            RingLightPolicy::Off => {}
            RingLightPolicy::HueWheel { period_secs } => {
                if !(within_range(period_secs) && period_secs > 0.0) {
                    return Err(ValidationFailed("hue wheel period must be positive"));
                }
            }
            RingLightPolicy::DayNight { on_secs, off_secs } => {
                if !(within_range(on_secs) && within_range(off_secs) && on_secs + off_secs > 0.0) {
                    return Err(ValidationFailed("day/night durations must be non-negative and not both zero"));
                }
            }
        }
        for pin in [self.ir_led_pin, self.stirrer_pin]
            .into_iter()
            .chain(self.ring_light_pins)
        {
            if self.pin_numbering.resolve(pin).is_none() {
                return Err(ValidationFailed("pin is not a usable GPIO in the chosen numbering"));
            }
        }
        Ok(())
    }
}

/// Finite, non-negative and no longer than [`MAX_SECS`].
fn within_range(secs: f64) -> bool {
    secs.is_finite() && (0.0..=MAX_SECS).contains(&secs)
}

fn is_permutation(order: &[usize]) -> bool {
    let mut seen = [false; MAX_EXTERNAL_PROBES];
    order.iter().all(|&i| {
        if i >= order.len() || i >= MAX_EXTERNAL_PROBES || seen[i] {
            return false;
        }
        seen[i] = true;
        true
    })
}
