//! Port traits: the hexagonal boundary between the sampling loop and the rig.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ SamplingLoop (domain)
//! ```
//!
//! Driven adapters (sensor hub, actuators, recorders, clocks, event sinks)
//! implement these traits.  The [`SamplingLoop`](super::service::SamplingLoop)
//! consumes them via generics, so the domain core never touches hardware or
//! files directly and runs unchanged against the simulated rig.

use core::time::Duration;
use std::sync::mpsc::Receiver;

use crate::error::{RecordError, SensorError};

use super::commands::{ActuatorCommand, Rgb};
use super::record::{Family, Readings, SampleRecord};
use super::series::TimeSeries;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one operation per channel family.
///
/// A family is read as a unit: either every value is returned or the whole
/// family fails.  Implementations do not retry; the next cycle is the retry.
pub trait SensorPort {
    fn read_family(&mut self, family: Family) -> Result<Readings, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port.  Every call is fire-and-forget: adapters log their own
/// write failures instead of returning them.
pub trait ActuatorPort {
    /// Switch the IR LED bank on.
    fn illumination_on(&mut self);

    /// Switch the IR LED bank off.
    fn illumination_off(&mut self);

    /// Set the ring light colour.
    fn set_ring_light(&mut self, rgb: Rgb);

    /// Set stirrer duty (0–100 %).
    fn set_stirrer(&mut self, duty: u8);

    /// IR LEDs off, stirrer stopped, ring light dark.  Idempotent.
    fn shutdown(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Record sink port (driven adapter: domain → durable storage)
// ───────────────────────────────────────────────────────────────

/// Append-only record storage.  Each accepted record must be durable
/// (flushed) before `append` returns.
pub trait RecordSink {
    fn append(&mut self, record: &SampleRecord) -> Result<(), RecordError>;
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → live view)
// ───────────────────────────────────────────────────────────────

/// Live view of the time series, refreshed once per cycle.  Failures are
/// the adapter's business; the run never stops for a stale plot.
pub trait DisplayPort {
    fn refresh(&mut self, series: &TimeSeries);
}

/// No live view.
impl DisplayPort for () {
    fn refresh(&mut self, _series: &TimeSeries) {}
}

impl<D: DisplayPort> DisplayPort for Option<D> {
    fn refresh(&mut self, series: &TimeSeries) {
        if let Some(display) = self {
            display.refresh(series);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus a wait that can be interrupted by actuator commands.
pub trait Clock {
    /// Time since the clock's epoch.  Only differences are meaningful.
    fn now(&self) -> Duration;

    /// Block for at most `timeout`.  Returns early with the first command
    /// that arrives on `inbox`; returns `None` once the timeout has passed.
    fn wait(
        &mut self,
        timeout: Duration,
        inbox: Option<&Receiver<ActuatorCommand>>,
    ) -> Option<ActuatorCommand>;
}

// ───────────────────────────────────────────────────────────────
// Ring-light delegate (decouples the scheduler from delivery)
// ───────────────────────────────────────────────────────────────

/// Callback the ring-light scheduler invokes with every colour it computes.
///
/// The scheduler thread implements this over a channel sender; tests
/// implement it by recording colours.
pub trait RingLightDelegate {
    /// Deliver a colour.  Returns `false` when nobody is listening any more,
    /// which stops the scheduler.
    fn on_colour(&mut self, rgb: Rgb) -> bool;
}
