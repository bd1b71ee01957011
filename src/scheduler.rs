//! Ring-light scheduler.
//!
//! Runs on its own timeline, independent of the sampling cadence.  Every
//! tick it works out the colour the ring light should show from elapsed
//! wall-clock time alone and hands it to a [`RingLightDelegate`].  The
//! thread version's delegate is a channel to the sampling thread, which
//! owns the actuators and applies the colour during its waits.
//!
//! ```text
//! ┌─────────────┐  RingControl   ┌──────────────────┐  ActuatorCommand  ┌──────────────┐
//! │   console   │ ─────────────▶ │ ring-light thread │ ────────────────▶ │ SamplingLoop │
//! └─────────────┘                └──────────────────┘                   └──────────────┘
//! ```

use core::time::Duration;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, info, warn};

use crate::app::commands::{ActuatorCommand, RGB_OFF, RGB_WHITE, RingControl, Rgb};
use crate::app::ports::RingLightDelegate;
use crate::config::RingLightPolicy;

// ═══════════════════════════════════════════════════════════════
//  Colour policies
// ═══════════════════════════════════════════════════════════════

/// Colour the policy prescribes at `elapsed_secs` into the run.
pub fn scheduled_colour(policy: RingLightPolicy, elapsed_secs: f64) -> Rgb {
    match policy {
        RingLightPolicy::Off => RGB_OFF,
        RingLightPolicy::HueWheel { period_secs } => {
            let phase = elapsed_secs.rem_euclid(period_secs) / period_secs;
            hsv_to_rgb(360.0 * phase, 1.0, 1.0)
        }
        RingLightPolicy::DayNight { on_secs, off_secs } => {
            if elapsed_secs.rem_euclid(on_secs + off_secs) < on_secs {
                RGB_WHITE
            } else {
                RGB_OFF
            }
        }
    }
}

/// HSV (hue in degrees, saturation and value in `0.0..=1.0`) to 8-bit RGB.
pub fn hsv_to_rgb(h_degrees: f64, s: f64, v: f64) -> Rgb {
    let c = v * s;
    let h_prime = h_degrees.rem_euclid(360.0) / 60.0;
    let x = c * (1.0 - (h_prime % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h_prime as u8 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |f: f64| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    (to_byte(r1), to_byte(g1), to_byte(b1))
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Policy plus manual override.  Delivers a colour only when it changes.
#[derive(Debug, Clone)]
pub struct RingLightScheduler {
    policy: RingLightPolicy,
    override_colour: Option<Rgb>,
    last_sent: Option<Rgb>,
}

impl RingLightScheduler {
    pub fn new(policy: RingLightPolicy) -> Self {
        Self {
            policy,
            override_colour: None,
            last_sent: None,
        }
    }

    pub fn handle(&mut self, ctl: RingControl) {
        match ctl {
            RingControl::Override(rgb) => {
                info!("Ring light: override {:?}", rgb);
                self.override_colour = Some(rgb);
            }
            RingControl::Resume => {
                info!("Ring light: schedule resumed");
                self.override_colour = None;
            }
        }
    }

    /// Colour that should be showing now.
    pub fn current(&self, elapsed_secs: f64) -> Rgb {
        self.override_colour
            .unwrap_or_else(|| scheduled_colour(self.policy, elapsed_secs))
    }

    /// Evaluate the policy and deliver the colour if it changed.
    /// Returns `false` when the delegate has hung up.
    pub fn tick(&mut self, elapsed_secs: f64, delegate: &mut dyn RingLightDelegate) -> bool {
        let rgb = self.current(elapsed_secs);
        if self.last_sent == Some(rgb) {
            return true;
        }
        debug!("Ring light: {:?} at {:.0}s", rgb, elapsed_secs);
        self.last_sent = Some(rgb);
        delegate.on_colour(rgb)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Thread
// ═══════════════════════════════════════════════════════════════

/// Forwards colours to the actuator owner.
pub struct CommandDelegate(pub Sender<ActuatorCommand>);

impl RingLightDelegate for CommandDelegate {
    fn on_colour(&mut self, rgb: Rgb) -> bool {
        self.0.send(ActuatorCommand::RingLight(rgb)).is_ok()
    }
}

enum Msg {
    Control(RingControl),
    Stop,
}

/// Cloneable sender of [`RingControl`]s to a running scheduler.
#[derive(Clone)]
pub struct RingLightRemote(Sender<Msg>);

impl RingLightRemote {
    /// Returns `false` if the scheduler has already stopped.
    pub fn send(&self, ctl: RingControl) -> bool {
        self.0.send(Msg::Control(ctl)).is_ok()
    }
}

/// Owner of the scheduler thread.
pub struct RingLightHandle {
    tx: Sender<Msg>,
    thread: Option<JoinHandle<()>>,
}

impl RingLightHandle {
    pub fn remote(&self) -> RingLightRemote {
        RingLightRemote(self.tx.clone())
    }

    /// Stop the thread and wait for it.
    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        let _ = self.tx.send(Msg::Stop);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Ring-light thread panicked");
            }
        }
    }
}

impl Drop for RingLightHandle {
    fn drop(&mut self) {
        self.halt();
    }
}

/// Start the scheduler on a thread named `ring-light`, ticking every
/// `tick`.  Control messages are handled as they arrive.
pub fn spawn_ring_light(
    policy: RingLightPolicy,
    tick: Duration,
    commands: Sender<ActuatorCommand>,
) -> io::Result<RingLightHandle> {
    let (tx, rx) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("ring-light".into())
        .spawn(move || run(policy, tick, rx, CommandDelegate(commands)))?;
    info!("Ring light: {:?}, tick {:.1}s", policy, tick.as_secs_f64());
    Ok(RingLightHandle {
        tx,
        thread: Some(thread),
    })
}

fn run(policy: RingLightPolicy, tick: Duration, rx: Receiver<Msg>, mut delegate: CommandDelegate) {
    let start = Instant::now();
    let mut scheduler = RingLightScheduler::new(policy);
    let mut next_tick = start;

    loop {
        let now = Instant::now();
        if now >= next_tick {
            if !scheduler.tick(now.duration_since(start).as_secs_f64(), &mut delegate) {
                debug!("Ring light: actuator owner gone");
                return;
            }
            next_tick += tick;
            continue;
        }

        match rx.recv_timeout(next_tick - now) {
            Ok(Msg::Control(ctl)) => {
                scheduler.handle(ctl);
                // Apply the change now rather than on the next tick.
                next_tick = Instant::now();
            }
            Ok(Msg::Stop) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
