//! GPIO pin and I2C address assignments for the bioreactor rig.
//!
//! Single source of truth for the defaults in [`RunConfig`](crate::config::RunConfig).
//! Pins are BCM numbers unless stated otherwise.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Pin numbering
// ---------------------------------------------------------------------------

/// How pin numbers in the config are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinNumbering {
    /// Broadcom SoC GPIO numbers.
    Bcm,
    /// Physical header positions (1..=40).
    Board,
}

/// Physical header position to BCM GPIO number.
/// Header positions that are power, ground or ID EEPROM pins have no entry.
const BOARD_TO_BCM: [(u8, u8); 17] = [
    (7, 4),
    (11, 17),
    (12, 18),
    (13, 27),
    (15, 22),
    (16, 23),
    (18, 24),
    (22, 25),
    (29, 5),
    (31, 6),
    (32, 12),
    (33, 13),
    (35, 19),
    (36, 16),
    (37, 26),
    (38, 20),
    (40, 21),
];

/// Translate a header position into a BCM number.
pub fn board_to_bcm(board_pin: u8) -> Option<u8> {
    BOARD_TO_BCM
        .iter()
        .find(|(board, _)| *board == board_pin)
        .map(|(_, bcm)| *bcm)
}

impl PinNumbering {
    /// Resolve `pin` to a BCM number under this numbering scheme.
    pub fn resolve(self, pin: u8) -> Option<u8> {
        match self {
            Self::Bcm => Some(pin),
            Self::Board => board_to_bcm(pin),
        }
    }
}

// ---------------------------------------------------------------------------
// Actuators (BCM)
// ---------------------------------------------------------------------------

/// IR LED bank driver enable (header pin 37).
pub const IR_LED_GPIO: u8 = 26;
/// Ring light red channel (software PWM).
pub const RING_RED_GPIO: u8 = 17;
/// Ring light green channel (software PWM).
pub const RING_GREEN_GPIO: u8 = 27;
/// Ring light blue channel (software PWM).
pub const RING_BLUE_GPIO: u8 = 22;
/// Stirrer motor driver PWM input.
pub const STIRRER_GPIO: u8 = 18;

/// Software PWM frequency for the ring light channels.
pub const RING_PWM_FREQ_HZ: f64 = 500.0;
/// Software PWM frequency for the stirrer motor.
pub const STIRRER_PWM_FREQ_HZ: f64 = 1_000.0;

// ---------------------------------------------------------------------------
// I2C bus
// ---------------------------------------------------------------------------

/// Default I2C character device.
pub const I2C_BUS_PATH: &str = "/dev/i2c-1";

/// PCA9546A / TCA9548A multiplexer in front of the vial BME280s.
pub const MUX_ADDRESS: u8 = 0x70;
/// ADS1115 reading the LED reference photodiodes.
pub const ADS1115_ADDRESS: u8 = 0x49;
/// ADS7830 reading the optical-density photodiodes.
pub const ADS7830_ADDRESS: u8 = 0x48;
/// Reference voltage the ADS7830 readings are scaled against.
pub const ADS7830_REF_VOLTAGE: f64 = 4.2;
/// BME280 in each vial, one per multiplexer channel.
pub const BME280_VIAL_ADDRESS: u8 = 0x76;
/// BME280 measuring the room, directly on the main bus.
pub const BME280_ATM_ADDRESS: u8 = 0x77;

// ---------------------------------------------------------------------------
// One-wire
// ---------------------------------------------------------------------------

/// Linux w1 sysfs tree holding the DS18B20 probes.
pub const W1_DEVICES_DIR: &str = "/sys/bus/w1/devices";
