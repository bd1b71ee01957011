//! Actuator drivers on `embedded-hal` pin traits.

pub mod ir_leds;
pub mod ring_light;
pub mod stirrer;
#[cfg(test)]
pub(crate) mod testpins;
