//! Cycle pacing: drift-corrected pause and the run budget.
//!
//! Pure arithmetic, no clocks.  The sampling loop measures, these
//! functions decide.

use core::time::Duration;

/// Outcome of [`plan_pause`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PausePlan {
    /// Time the cycle spent actuating, settling, reading and recording.
    pub processing_secs: f64,
    /// `ceil(processing) - processing`: the fraction that would be needed to
    /// round the processing time up to whole seconds.
    pub alignment_secs: f64,
    /// How long to sleep before the next cycle starts.  Never negative.
    pub pause: Duration,
    /// Set when processing took longer than the interval and the pause had
    /// to be clamped to zero.
    pub overrun: bool,
}

impl PausePlan {
    /// Start-to-start period this plan produces.
    pub fn period_secs(&self) -> f64 {
        self.processing_secs + self.pause.as_secs_f64()
    }
}

/// Pause that puts the next cycle start exactly `interval_secs` after this
/// one.
///
/// The processing time is split into whole seconds plus an alignment
/// remainder `dt`; the pause is the interval minus the aligned processing
/// time, plus `dt` back again.  The alignment terms cancel, so every cycle
/// starts on the interval grid and fractional processing times never
/// accumulate into drift.
pub fn plan_pause(interval_secs: f64, processing_secs: f64) -> PausePlan {
    let processing_secs = processing_secs.max(0.0);
    let alignment_secs = processing_secs.ceil() - processing_secs;
    let aligned = processing_secs + alignment_secs;
    let raw = interval_secs - aligned + alignment_secs;

    let overrun = raw < 0.0;
    let pause = if overrun {
        Duration::ZERO
    } else {
        Duration::try_from_secs_f64(raw).unwrap_or(Duration::MAX)
    };

    PausePlan {
        processing_secs,
        alignment_secs,
        pause,
        overrun,
    }
}

/// Elapsed-time budget of a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunBudget {
    pub budget_secs: f64,
    pub grace_secs: f64,
}

impl RunBudget {
    pub fn new(budget_secs: f64, grace_secs: f64) -> Self {
        Self {
            budget_secs,
            grace_secs,
        }
    }

    /// Whether a cycle may start at `elapsed_secs`.
    pub fn permits(&self, elapsed_secs: f64) -> bool {
        elapsed_secs <= self.budget_secs + self.grace_secs
    }

    /// Progress in `0.0..=1.0` for the user-facing indicator.
    pub fn fraction(&self, elapsed_secs: f64) -> f64 {
        if self.budget_secs <= 0.0 {
            return 1.0;
        }
        (elapsed_secs / self.budget_secs).clamp(0.0, 1.0)
    }
}
