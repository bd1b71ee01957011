//! Simulated rig for `--simulate` runs and tests.
//!
//! [`SimulatedRig`] produces plausible readings for every family, with
//! optional per-family fault injection and read latency.  [`SimActuators`]
//! tracks actuator state in memory.

use core::time::Duration;
use std::thread;

use log::debug;

use crate::app::commands::{RGB_OFF, Rgb};
use crate::app::ports::{ActuatorPort, SensorPort};
use crate::app::record::{Family, Readings, RecordLayout};
use crate::error::SensorError;

use super::time::SimClock;

// ───────────────────────────────────────────────────────────────
// Sensors
// ───────────────────────────────────────────────────────────────

pub struct SimulatedRig {
    layout: RecordLayout,
    latency: Duration,
    clock: Option<SimClock>,
    failing: Vec<Family>,
    cycle: u64,
    noise: u64,
}

impl SimulatedRig {
    pub fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            latency: Duration::ZERO,
            clock: None,
            failing: Vec::new(),
            cycle: 0,
            noise: 0x2545_F491_4F6C_DD1D,
        }
    }

    /// Each family read takes `latency`.  With a [`SimClock`] the latency is
    /// charged to virtual time, otherwise the thread sleeps.
    pub fn with_latency(mut self, latency: Duration, clock: Option<SimClock>) -> Self {
        self.latency = latency;
        self.clock = clock;
        self
    }

    /// Make every read of `family` fail.
    pub fn with_fault(mut self, family: Family) -> Self {
        self.set_failing(family, true);
        self
    }

    pub fn set_failing(&mut self, family: Family, failing: bool) {
        self.failing.retain(|f| *f != family);
        if failing {
            self.failing.push(family);
        }
    }

    fn pass_time(&self) {
        if self.latency.is_zero() {
            return;
        }
        match &self.clock {
            Some(clock) => clock.advance(self.latency),
            None => thread::sleep(self.latency),
        }
    }

    /// Uniform noise in `-1.0..1.0` (xorshift64).
    fn jitter(&mut self) -> f64 {
        self.noise ^= self.noise << 13;
        self.noise ^= self.noise >> 7;
        self.noise ^= self.noise << 17;
        (self.noise >> 11) as f64 / (1u64 << 52) as f64 - 1.0
    }

    fn value(&mut self, family: Family, channel: usize) -> f64 {
        let t = self.cycle as f64;
        let ch = channel as f64;
        let base = match family {
            // Culture density rises slowly; photodiode voltage falls with it.
            Family::OpticalDensity => 3.6 - 0.05 * ch - 0.002 * t,
            Family::LedReference => 2.45 + 0.01 * ch,
            Family::InternalTemperature => 30.0 + 0.1 * ch,
            // Headspace pressure builds with gas production.
            Family::InternalPressure => 1_013.0 + 0.5 * ch + 0.05 * t,
            Family::InternalHumidity => 85.0 + ch,
            Family::ExternalTemperature => 29.5 + 0.2 * ch,
            Family::AtmosphericTemperature => 22.0,
            Family::AtmosphericPressure => 1_013.25,
        };
        base + 0.01 * self.jitter()
    }
}

impl SensorPort for SimulatedRig {
    fn read_family(&mut self, family: Family) -> Result<Readings, SensorError> {
        self.pass_time();
        if family == Family::OpticalDensity {
            self.cycle += 1;
        }
        if self.failing.contains(&family) {
            debug!("Simulated fault on {}", family);
            return Err(SensorError::Simulated);
        }
        let mut out = Readings::new();
        for ch in 0..self.layout.width(family) {
            let v = self.value(family, ch);
            out.push(v).map_err(|_| SensorError::WidthMismatch)?;
        }
        Ok(out)
    }
}

// ───────────────────────────────────────────────────────────────
// Actuators
// ───────────────────────────────────────────────────────────────

/// Snapshot of simulated actuator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuatorState {
    pub ir_leds_on: bool,
    /// Number of IR LED on/off transitions.
    pub ir_switches: u32,
    pub ring: Rgb,
    pub stirrer_duty: u8,
    pub shutdowns: u32,
}

#[derive(Debug)]
pub struct SimActuators {
    state: ActuatorState,
    shut_down: bool,
}

impl Default for SimActuators {
    fn default() -> Self {
        Self::new()
    }
}

impl SimActuators {
    pub fn new() -> Self {
        Self {
            state: ActuatorState {
                ir_leds_on: false,
                ir_switches: 0,
                ring: RGB_OFF,
                stirrer_duty: 0,
                shutdowns: 0,
            },
            shut_down: false,
        }
    }

    pub fn state(&self) -> ActuatorState {
        self.state
    }

    fn switch_ir(&mut self, on: bool) {
        if self.state.ir_leds_on != on {
            self.state.ir_leds_on = on;
            self.state.ir_switches += 1;
        }
    }
}

impl ActuatorPort for SimActuators {
    fn illumination_on(&mut self) {
        self.shut_down = false;
        self.switch_ir(true);
    }

    fn illumination_off(&mut self) {
        self.switch_ir(false);
    }

    fn set_ring_light(&mut self, rgb: Rgb) {
        self.shut_down = false;
        debug!("Simulated ring light -> {:?}", rgb);
        self.state.ring = rgb;
    }

    fn set_stirrer(&mut self, duty: u8) {
        self.shut_down = false;
        self.state.stirrer_duty = duty.min(100);
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.switch_ir(false);
        self.state.ring = RGB_OFF;
        self.state.stirrer_duty = 0;
        self.state.shutdowns += 1;
        self.shut_down = true;
    }
}
