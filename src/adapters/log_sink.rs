//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to the
//! `log` facade as one-line tagged records.  `grep '^.*CYCLE |'` on the log
//! recovers the per-cycle history.

use log::{debug, info};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::app::timing::RunBudget;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                vials,
                probes,
                budget_secs,
                interval_secs,
            } => {
                info!(
                    "START | vials={} probes={} | budget={:.0}s interval={:.1}s",
                    vials, probes, budget_secs, interval_secs
                );
            }
            AppEvent::StateChanged { from, to } => {
                debug!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ReadDegraded {
                cycle,
                family,
                error,
            } => {
                info!("DEGRADE | cycle={} | {} -> NaN ({})", cycle, family, error);
            }
            AppEvent::CycleRecorded(r) => {
                info!(
                    "CYCLE | #{} | t={:.3}s | degraded={} | processing={:.3}s",
                    r.cycle, r.elapsed_secs, r.degraded, r.processing_secs
                );
            }
            AppEvent::CycleOverrun {
                cycle,
                processing_secs,
                interval_secs,
            } => {
                info!(
                    "OVERRUN | cycle={} | processing={:.3}s > interval={:.3}s",
                    cycle, processing_secs, interval_secs
                );
            }
            AppEvent::Progress {
                elapsed_secs,
                budget_secs,
            } => {
                let pct = RunBudget::new(*budget_secs, 0.0).fraction(*elapsed_secs) * 100.0;
                info!(
                    "PROGRESS | {:.0}/{:.0}s ({:.0}%)",
                    elapsed_secs, budget_secs, pct
                );
            }
            AppEvent::Finished(s) => {
                info!(
                    "FINISH | cycles={} degraded={} overruns={} | elapsed={:.1}s",
                    s.cycles, s.degraded_reads, s.overruns, s.elapsed_secs
                );
            }
        }
    }
}
