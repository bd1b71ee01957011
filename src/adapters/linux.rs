//! Raspberry Pi bindings: `/dev/i2c-*` through `linux-embedded-hal`, GPIO
//! and software PWM through `rppal`.
//!
//! `rppal` pins are wrapped in small newtypes implementing the
//! `embedded-hal` 1.0 traits the drivers are written against.

use core::convert::Infallible;
use core::fmt;

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};
use linux_embedded_hal::{Delay, I2cdev};
use log::info;
use rppal::gpio::{self, Gpio};

use crate::adapters::hardware::HardwareActuators;
use crate::config::RunConfig;
use crate::drivers::ir_leds::IrLeds;
use crate::drivers::ring_light::RingLight;
use crate::drivers::stirrer::Stirrer;
use crate::error::InitError;
use crate::pins;
use crate::sensors::SensorHub;

pub type LinuxSensors = SensorHub<I2cdev>;
pub type LinuxActuators = HardwareActuators<GpioOut, SoftPwm, SoftPwm>;

// ── GPIO output ───────────────────────────────────────────────

pub struct GpioOut(gpio::OutputPin);

impl digital::ErrorType for GpioOut {
    type Error = Infallible;
}

impl OutputPin for GpioOut {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

// ── Software PWM ──────────────────────────────────────────────

const PWM_STEPS: u16 = 1_000;

#[derive(Debug)]
pub struct PwmError(gpio::Error);

impl fmt::Display for PwmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "software PWM: {}", self.0)
    }
}

impl pwm::Error for PwmError {
    fn kind(&self) -> pwm::ErrorKind {
        pwm::ErrorKind::Other
    }
}

/// A GPIO driven by `rppal`'s software PWM thread.
pub struct SoftPwm {
    pin: gpio::OutputPin,
    frequency_hz: f64,
}

impl pwm::ErrorType for SoftPwm {
    type Error = PwmError;
}

impl SetDutyCycle for SoftPwm {
    fn max_duty_cycle(&self) -> u16 {
        PWM_STEPS
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let duty = duty.min(PWM_STEPS);
        if duty == 0 {
            self.pin.clear_pwm().map_err(PwmError)?;
            self.pin.set_low();
            return Ok(());
        }
        self.pin
            .set_pwm_frequency(self.frequency_hz, f64::from(duty) / f64::from(PWM_STEPS))
            .map_err(PwmError)
    }
}

// ── Rig assembly ──────────────────────────────────────────────

/// Open the I2C bus and attach every sensor.
pub fn open_sensors(config: &RunConfig) -> Result<LinuxSensors, InitError> {
    let i2c = I2cdev::new(&config.i2c_bus)
        .map_err(|e| InitError::new("i2c", format!("{}: {e}", config.i2c_bus)))?;
    info!("I2C bus {} opened", config.i2c_bus);
    SensorHub::init(config, i2c, Delay)
}

/// Claim the actuator GPIOs, all switched off.
pub fn open_actuators(config: &RunConfig) -> Result<LinuxActuators, InitError> {
    let gpio = Gpio::new().map_err(|e| InitError::new("gpio", e))?;
    let claim = |pin: u8| -> Result<gpio::OutputPin, InitError> {
        let bcm = config
            .pin_numbering
            .resolve(pin)
            .ok_or_else(|| InitError::new("gpio", format!("pin {pin} is not a GPIO")))?;
        let claimed = gpio
            .get(bcm)
            .map_err(|e| InitError::new("gpio", format!("BCM {bcm}: {e}")))?;
        Ok(claimed.into_output_low())
    };
    let pwm = |pin: u8, frequency_hz: f64| -> Result<SoftPwm, InitError> {
        Ok(SoftPwm {
            pin: claim(pin)?,
            frequency_hz,
        })
    };

    let ir = match IrLeds::new(GpioOut(claim(config.ir_led_pin)?)) {
        Ok(ir) => ir,
        Err(never) => match never {},
    };
    let [r, g, b] = config.ring_light_pins;
    let ring = RingLight::new(
        pwm(r, pins::RING_PWM_FREQ_HZ)?,
        pwm(g, pins::RING_PWM_FREQ_HZ)?,
        pwm(b, pins::RING_PWM_FREQ_HZ)?,
    )
    .map_err(|e| InitError::new("ring light", e))?;
    let stirrer = Stirrer::new(pwm(config.stirrer_pin, pins::STIRRER_PWM_FREQ_HZ)?)
        .map_err(|e| InitError::new("stirrer", e))?;

    info!(
        "GPIO claimed ({:?} numbering): IR {}, ring {:?}, stirrer {}",
        config.pin_numbering, config.ir_led_pin, config.ring_light_pins, config.stirrer_pin
    );
    Ok(HardwareActuators::new(ir, ring, stirrer))
}
