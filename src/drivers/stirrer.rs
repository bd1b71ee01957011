//! Magnetic stirrer motor, speed set by PWM duty.

use embedded_hal::pwm::SetDutyCycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StirrerState {
    Stopped,
    Running { duty: u8 },
}

pub struct Stirrer<P: SetDutyCycle> {
    pwm: P,
    state: StirrerState,
}

impl<P: SetDutyCycle> Stirrer<P> {
    /// Takes the PWM channel and stops the motor.
    pub fn new(mut pwm: P) -> Result<Self, P::Error> {
        pwm.set_duty_cycle_fully_off()?;
        Ok(Self {
            pwm,
            state: StirrerState::Stopped,
        })
    }

    /// Duty in percent; values above 100 are treated as 100.
    pub fn set(&mut self, duty: u8) -> Result<(), P::Error> {
        let duty = duty.min(100);
        if duty == 0 {
            return self.stop();
        }
        self.pwm.set_duty_cycle_percent(duty)?;
        self.state = StirrerState::Running { duty };
        Ok(())
    }

    pub fn stop(&mut self) -> Result<(), P::Error> {
        self.pwm.set_duty_cycle_fully_off()?;
        self.state = StirrerState::Stopped;
        Ok(())
    }

    pub fn state(&self) -> StirrerState {
        self.state
    }

    pub fn duty(&self) -> u8 {
        match self.state {
            StirrerState::Stopped => 0,
            StirrerState::Running { duty } => duty,
        }
    }
}
