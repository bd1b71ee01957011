//! RGB ring light on three PWM channels.
//!
//! Each channel's 0–255 level maps linearly onto the PWM duty range.

use embedded_hal::pwm::SetDutyCycle;

use crate::app::commands::{RGB_OFF, Rgb};

pub struct RingLight<C: SetDutyCycle> {
    red: C,
    green: C,
    blue: C,
    colour: Rgb,
}

impl<C: SetDutyCycle> RingLight<C> {
    /// Takes the three channels and switches them off.
    pub fn new(red: C, green: C, blue: C) -> Result<Self, C::Error> {
        let mut light = Self {
            red,
            green,
            blue,
            colour: RGB_OFF,
        };
        light.set(RGB_OFF)?;
        Ok(light)
    }

    pub fn set(&mut self, (r, g, b): Rgb) -> Result<(), C::Error> {
        self.red.set_duty_cycle_fraction(u16::from(r), 255)?;
        self.green.set_duty_cycle_fraction(u16::from(g), 255)?;
        self.blue.set_duty_cycle_fraction(u16::from(b), 255)?;
        self.colour = (r, g, b);
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), C::Error> {
        self.set(RGB_OFF)
    }

    /// Last colour written successfully.
    pub fn colour(&self) -> Rgb {
        self.colour
    }
}
