//! In-memory pins for driver tests.

use embedded_hal::digital::{self, OutputPin};
use embedded_hal::pwm::{self, SetDutyCycle};

/// Output pin that records every level it is driven to.
#[derive(Default)]
pub struct FakePin {
    pub levels: Vec<bool>,
    pub broken: bool,
}

impl digital::ErrorType for FakePin {
    type Error = digital::ErrorKind;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

impl FakePin {
    fn drive(&mut self, level: bool) -> Result<(), digital::ErrorKind> {
        if self.broken {
            return Err(digital::ErrorKind::Other);
        }
        self.levels.push(level);
        Ok(())
    }

    pub fn level(&self) -> Option<bool> {
        self.levels.last().copied()
    }
}

/// PWM channel with a 0..=1000 duty range.
#[derive(Default)]
pub struct FakePwm {
    pub duty: u16,
    pub writes: usize,
}

impl pwm::ErrorType for FakePwm {
    type Error = pwm::ErrorKind;
}

impl SetDutyCycle for FakePwm {
    fn max_duty_cycle(&self) -> u16 {
        1_000
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        self.duty = duty;
        self.writes += 1;
        Ok(())
    }
}
