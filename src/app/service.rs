//! Sampling loop, the hexagonal core.
//!
//! [`SamplingLoop`] owns the sensors, the actuators and the clock, and runs
//! fixed-cadence measurement cycles until the run budget is spent.  All I/O
//! flows through port traits, so the whole loop is testable with mock
//! adapters and a simulated clock.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ RecordSink
//!                 │       SamplingLoop        │ ──▶ DisplayPort
//! ActuatorPort ◀──│ actuate · settle · read   │ ──▶ EventSink
//!        Clock ◀─▶│ record · drift-corrected  │
//!                 │ sleep                     │◀── ActuatorCommand inbox
//!                 └──────────────────────────┘
//! ```
//!
//! One cycle:
//!
//! ```text
//! Idle ─▶ Actuating ─▶ Settling ─▶ Reading ─▶ Recording ─▶ Sleeping ─┐
//!            ▲                                                       │
//!            └───────────────────── budget left ◀────────────────────┘
//!                                       │ spent
//!                                       ▼
//!                                     Done (actuators shut down)
//! ```

use core::time::Duration;
use std::sync::mpsc::Receiver;

use log::{debug, error, info, warn};

use crate::config::RunConfig;
use crate::error::Result;

use super::commands::ActuatorCommand;
use super::events::{AppEvent, CycleReport, RunSummary};
use super::ports::{ActuatorPort, Clock, DisplayPort, EventSink, RecordSink, SensorPort};
use super::record::{Family, RecordLayout, SampleRecord};
use super::series::TimeSeries;
use super::timing::{RunBudget, plan_pause};

// ───────────────────────────────────────────────────────────────
// Cycle state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Actuating,
    Settling,
    Reading,
    Recording,
    Sleeping,
    Done,
}

// ───────────────────────────────────────────────────────────────
// Illumination guard
// ───────────────────────────────────────────────────────────────

/// IR LEDs on for the guard's lifetime.  They go off when the guard is
/// dropped, whichever way the scope is left.
pub struct Illuminated<'a, A: ActuatorPort> {
    actuators: &'a mut A,
}

impl<'a, A: ActuatorPort> Illuminated<'a, A> {
    pub fn new(actuators: &'a mut A) -> Self {
        actuators.illumination_on();
        Self { actuators }
    }

    /// The actuators, for commands that arrive while lit.
    pub fn actuators(&mut self) -> &mut A {
        self.actuators
    }
}

impl<A: ActuatorPort> Drop for Illuminated<'_, A> {
    fn drop(&mut self) {
        self.actuators.illumination_off();
    }
}

// ───────────────────────────────────────────────────────────────
// SamplingLoop
// ───────────────────────────────────────────────────────────────

pub struct SamplingLoop<S: SensorPort, A: ActuatorPort, C: Clock> {
    sensors: S,
    actuators: A,
    clock: C,
    inbox: Option<Receiver<ActuatorCommand>>,

    layout: RecordLayout,
    interval_secs: f64,
    settle: Duration,
    budget: RunBudget,
    stirrer_duty: u8,

    state: CycleState,
    series: TimeSeries,
    summary: RunSummary,
    shut_down: bool,
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> SamplingLoop<S, A, C> {
    /// Build the loop.  `config` must already be validated.
    pub fn new(config: &RunConfig, sensors: S, actuators: A, clock: C) -> Self {
        let layout = RecordLayout::new(config.vial_count, config.probe_count());
        Self {
            sensors,
            actuators,
            clock,
            inbox: None,
            layout,
            interval_secs: config.interval_secs,
            settle: Duration::from_secs_f64(config.settle_secs),
            budget: RunBudget::new(config.duration_secs, config.grace_secs),
            stirrer_duty: config.stirrer_duty,
            state: CycleState::Idle,
            series: TimeSeries::new(layout),
            summary: RunSummary::default(),
            shut_down: false,
        }
    }

    /// Accept actuator commands (ring light, stirrer) from other threads.
    /// They are applied during settle and pause waits.
    pub fn with_inbox(mut self, inbox: Receiver<ActuatorCommand>) -> Self {
        self.inbox = Some(inbox);
        self
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn actuators(&self) -> &A {
        &self.actuators
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Run cycles until the budget is spent, then shut the actuators down.
    ///
    /// Read failures never end the run.  A record that cannot be persisted
    /// does; the shutdown still happens before the error is returned.
    pub fn run(
        &mut self,
        recorder: &mut impl RecordSink,
        display: &mut impl DisplayPort,
        events: &mut impl EventSink,
    ) -> Result<RunSummary> {
        let outcome = self.run_cycles(recorder, display, events);

        transition(&mut self.state, CycleState::Done, events);
        self.shutdown();

        match &outcome {
            Ok(summary) => {
                info!(
                    "Run complete: {} cycles, {} degraded reads, {} overruns",
                    summary.cycles, summary.degraded_reads, summary.overruns
                );
                events.emit(&AppEvent::Finished(*summary));
            }
            Err(e) => error!("Run aborted after {} cycles: {}", self.summary.cycles, e),
        }
        outcome
    }

    /// IR LEDs off, stirrer stopped, ring light dark.  Runs at most once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.actuators.shutdown();
        info!("Actuators shut down");
    }

    // ── Internal ──────────────────────────────────────────────

    fn run_cycles(
        &mut self,
        recorder: &mut impl RecordSink,
        display: &mut impl DisplayPort,
        events: &mut impl EventSink,
    ) -> Result<RunSummary> {
        let start = self.clock.now();
        events.emit(&AppEvent::Started {
            vials: self.layout.vials(),
            probes: self.layout.probes(),
            budget_secs: self.budget.budget_secs,
            interval_secs: self.interval_secs,
        });

        if self.stirrer_duty > 0 {
            self.actuators.set_stirrer(self.stirrer_duty);
        }

        loop {
            let cycle_start = self.clock.now();
            let elapsed = cycle_start.saturating_sub(start).as_secs_f64();
            if !self.budget.permits(elapsed) {
                break;
            }

            self.summary.cycles += 1;
            let cycle = self.summary.cycles;
            events.emit(&AppEvent::Progress {
                elapsed_secs: elapsed,
                budget_secs: self.budget.budget_secs,
            });

            let (record, degraded) = self.sample(cycle, elapsed, events);

            transition(&mut self.state, CycleState::Recording, events);
            recorder.append(&record)?;
            self.series.push(&record);
            display.refresh(&self.series);

            let processing_time = self.clock.now().saturating_sub(cycle_start);
            let processing = processing_time.as_secs_f64();
            events.emit(&AppEvent::CycleRecorded(CycleReport {
                cycle,
                elapsed_secs: elapsed,
                degraded,
                processing_secs: processing,
            }));

            let plan = plan_pause(self.interval_secs, processing);
            if plan.overrun {
                warn!(
                    "Cycle overrun: cycle {} took {:.3}s against a {:.3}s interval",
                    cycle, processing, self.interval_secs
                );
                self.summary.overruns += 1;
                events.emit(&AppEvent::CycleOverrun {
                    cycle,
                    processing_secs: processing,
                    interval_secs: self.interval_secs,
                });
            }

            // No point sleeping into a cycle that will not run.
            if !self.budget.permits(elapsed + plan.period_secs()) {
                break;
            }

            transition(&mut self.state, CycleState::Sleeping, events);
            debug!(
                "Cycle {}: processing {:.3}s, alignment {:.3}s, pause {:.3}s",
                cycle,
                plan.processing_secs,
                plan.alignment_secs,
                plan.pause.as_secs_f64()
            );
            // Anchored to the cycle start, so time spent on events and
            // logging after the measurement does not push the next start.
            let next_start = cycle_start
                .saturating_add(processing_time)
                .saturating_add(plan.pause);
            wait_applying(
                &mut self.clock,
                self.inbox.as_ref(),
                &mut self.actuators,
                next_start,
            );
        }

        self.summary.elapsed_secs = self.clock.now().saturating_sub(start).as_secs_f64();
        Ok(self.summary)
    }

    /// Actuate, settle and read every family once.  IR LEDs are off again
    /// when this returns.
    fn sample(
        &mut self,
        cycle: u64,
        elapsed: f64,
        events: &mut impl EventSink,
    ) -> (SampleRecord, usize) {
        let mut record = SampleRecord::new(self.layout, elapsed);
        let mut degraded = 0;

        transition(&mut self.state, CycleState::Actuating, events);
        let mut lit = Illuminated::new(&mut self.actuators);

        transition(&mut self.state, CycleState::Settling, events);
        let settled = self.clock.now().saturating_add(self.settle);
        wait_applying(&mut self.clock, self.inbox.as_ref(), lit.actuators(), settled);

        transition(&mut self.state, CycleState::Reading, events);
        for family in Family::READ_ORDER {
            let result = self
                .sensors
                .read_family(family)
                .and_then(|readings| record.set(family, &readings));
            if let Err(error) = result {
                warn!("Cycle {}: {} read failed ({}), recording NaN", cycle, family, error);
                degraded += 1;
                self.summary.degraded_reads += 1;
                events.emit(&AppEvent::ReadDegraded {
                    cycle,
                    family,
                    error,
                });
            }
        }

        drop(lit);
        (record, degraded)
    }
}

impl<S: SensorPort, A: ActuatorPort, C: Clock> Drop for SamplingLoop<S, A, C> {
    fn drop(&mut self) {
        if !self.shut_down {
            warn!("Sampling loop left without a clean shutdown");
            self.shutdown();
        }
    }
}

fn transition(state: &mut CycleState, to: CycleState, events: &mut impl EventSink) {
    if *state != to {
        events.emit(&AppEvent::StateChanged { from: *state, to });
        *state = to;
    }
}

/// Wait until the clock reads `deadline`, applying any actuator commands
/// that arrive meanwhile.  Returns at once if the deadline has passed.
fn wait_applying<C: Clock, A: ActuatorPort>(
    clock: &mut C,
    inbox: Option<&Receiver<ActuatorCommand>>,
    actuators: &mut A,
    deadline: Duration,
) {
    loop {
        let now = clock.now();
        if now >= deadline {
            break;
        }
        match clock.wait(deadline - now, inbox) {
            Some(cmd) => apply_command(actuators, cmd),
            None => break,
        }
    }
}

fn apply_command(actuators: &mut impl ActuatorPort, cmd: ActuatorCommand) {
    debug!("Applying {:?}", cmd);
    match cmd {
        ActuatorCommand::RingLight(rgb) => actuators.set_ring_light(rgb),
        ActuatorCommand::Stirrer(duty) => actuators.set_stirrer(duty),
    }
}
