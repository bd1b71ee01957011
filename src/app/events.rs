//! Outbound application events.
//!
//! The [`SamplingLoop`](super::service::SamplingLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them; the stock one logs them.

use crate::error::SensorError;

use super::record::Family;
use super::service::CycleState;

/// Structured events emitted by the sampling loop.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The loop has started; carries the fixed shape of the run.
    Started {
        vials: usize,
        probes: usize,
        budget_secs: f64,
        interval_secs: f64,
    },

    /// The loop moved between cycle states.
    StateChanged { from: CycleState, to: CycleState },

    /// A family failed and was NaN-filled for this cycle.
    ReadDegraded {
        cycle: u64,
        family: Family,
        error: SensorError,
    },

    /// A record was persisted.
    CycleRecorded(CycleReport),

    /// Processing took longer than the interval; the pause was clamped to 0.
    CycleOverrun {
        cycle: u64,
        processing_secs: f64,
        interval_secs: f64,
    },

    /// Elapsed time against the run budget, once per cycle.
    Progress { elapsed_secs: f64, budget_secs: f64 },

    /// The run is over and the actuators have been shut down.
    Finished(RunSummary),
}

/// What happened in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub elapsed_secs: f64,
    /// Families NaN-filled this cycle.
    pub degraded: usize,
    pub processing_secs: f64,
}

/// Totals for the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub cycles: u64,
    pub degraded_reads: u64,
    pub overruns: u64,
    pub elapsed_secs: f64,
}
