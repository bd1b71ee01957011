//! Hardware adapter: bridges the real actuators to [`ActuatorPort`].
//!
//! Owns the IR LED bank, the ring light and the stirrer.  Write failures
//! are logged here and never reach the sampling loop; a flaky GPIO must not
//! end a run.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::{debug, info, warn};

use crate::app::commands::Rgb;
use crate::app::ports::ActuatorPort;
use crate::drivers::ir_leds::IrLeds;
use crate::drivers::ring_light::RingLight;
use crate::drivers::stirrer::Stirrer;

/// Concrete adapter that combines all actuators behind the port trait.
pub struct HardwareActuators<P: OutputPin, C: SetDutyCycle, M: SetDutyCycle> {
    ir: IrLeds<P>,
    ring: RingLight<C>,
    stirrer: Stirrer<M>,
    shut_down: bool,
}

impl<P: OutputPin, C: SetDutyCycle, M: SetDutyCycle> HardwareActuators<P, C, M> {
    pub fn new(ir: IrLeds<P>, ring: RingLight<C>, stirrer: Stirrer<M>) -> Self {
        Self {
            ir,
            ring,
            stirrer,
            shut_down: false,
        }
    }

    pub fn ir_on(&self) -> bool {
        self.ir.is_on()
    }

    pub fn ring_colour(&self) -> Rgb {
        self.ring.colour()
    }

    pub fn stirrer_duty(&self) -> u8 {
        self.stirrer.duty()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, C: SetDutyCycle, M: SetDutyCycle> ActuatorPort for HardwareActuators<P, C, M> {
    fn illumination_on(&mut self) {
        self.shut_down = false;
        if let Err(e) = self.ir.on() {
            warn!("IR LEDs: switch-on failed: {:?}", e);
        }
    }

    fn illumination_off(&mut self) {
        if let Err(e) = self.ir.off() {
            warn!("IR LEDs: switch-off failed: {:?}", e);
        }
    }

    fn set_ring_light(&mut self, rgb: Rgb) {
        self.shut_down = false;
        match self.ring.set(rgb) {
            Ok(()) => debug!("Ring light -> {:?}", rgb),
            Err(e) => warn!("Ring light: write failed: {:?}", e),
        }
    }

    fn set_stirrer(&mut self, duty: u8) {
        self.shut_down = false;
        match self.stirrer.set(duty) {
            Ok(()) => info!("Stirrer -> {}%", self.stirrer.duty()),
            Err(e) => warn!("Stirrer: write failed: {:?}", e),
        }
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            debug!("Actuators already shut down");
            return;
        }
        self.illumination_off();
        if let Err(e) = self.stirrer.stop() {
            warn!("Stirrer: stop failed: {:?}", e);
        }
        if let Err(e) = self.ring.off() {
            warn!("Ring light: off failed: {:?}", e);
        }
        self.shut_down = true;
    }
}
