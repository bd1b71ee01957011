//! Mock adapters for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history, scripts sensor failures per cycle, and captures records and
//! events in memory.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use bioreactor::adapters::time::SimClock;
use bioreactor::app::commands::Rgb;
use bioreactor::app::events::AppEvent;
use bioreactor::app::ports::{ActuatorPort, EventSink, RecordSink, SensorPort};
use bioreactor::app::record::{Family, Readings, RecordLayout, SampleRecord};
use bioreactor::error::{RecordError, SensorError};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    IlluminationOn,
    IlluminationOff,
    RingLight(Rgb),
    Stirrer(u8),
    Shutdown,
}

// ── MockActuators ─────────────────────────────────────────────

/// The call log is shared so it survives the loop that owns the mock.
#[derive(Clone, Default)]
pub struct MockActuators {
    pub calls: Rc<RefCell<Vec<ActuatorCall>>>,
}

#[allow(dead_code)]
impl MockActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<ActuatorCall> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: ActuatorCall) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    pub fn ir_on(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                ActuatorCall::IlluminationOn => Some(true),
                ActuatorCall::IlluminationOff | ActuatorCall::Shutdown => Some(false),
                _ => None,
            })
            .unwrap_or(false)
    }
}

impl ActuatorPort for MockActuators {
    fn illumination_on(&mut self) {
        self.calls.borrow_mut().push(ActuatorCall::IlluminationOn);
    }

    fn illumination_off(&mut self) {
        self.calls.borrow_mut().push(ActuatorCall::IlluminationOff);
    }

    fn set_ring_light(&mut self, rgb: Rgb) {
        self.calls.borrow_mut().push(ActuatorCall::RingLight(rgb));
    }

    fn set_stirrer(&mut self, duty: u8) {
        self.calls.borrow_mut().push(ActuatorCall::Stirrer(duty));
    }

    fn shutdown(&mut self) {
        self.calls.borrow_mut().push(ActuatorCall::Shutdown);
    }
}

// ── ScriptedSensors ───────────────────────────────────────────

/// Deterministic sensors: channel `c` of a family reads
/// `100 * column_index + c`.  Failures are scripted per cycle; a cycle
/// begins with the first family in read order.
pub struct ScriptedSensors {
    layout: RecordLayout,
    clock: Option<SimClock>,
    latency: Duration,
    failures: Vec<(u64, Family)>,
    hangs: Vec<(u64, Family, Duration)>,
    cycle: u64,
}

#[allow(dead_code)]
impl ScriptedSensors {
    pub fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            clock: None,
            latency: Duration::ZERO,
            failures: Vec::new(),
            hangs: Vec::new(),
            cycle: 0,
        }
    }

    /// Every family read advances `clock` by `latency`.
    pub fn with_latency(mut self, clock: SimClock, latency: Duration) -> Self {
        self.clock = Some(clock);
        self.latency = latency;
        self
    }

    /// Fail `family` in the given 1-based cycle.
    pub fn fail_on(mut self, cycle: u64, family: Family) -> Self {
        self.failures.push((cycle, family));
        self
    }

    /// Block the calling thread for `stall` (wall time) when reading
    /// `family` in the given 1-based cycle.  The read then succeeds.
    pub fn hang_on(mut self, cycle: u64, family: Family, stall: Duration) -> Self {
        self.hangs.push((cycle, family, stall));
        self
    }

    pub fn expected(family: Family, channel: usize) -> f64 {
        let index = Family::COLUMN_ORDER
            .iter()
            .position(|f| *f == family)
            .unwrap();
        (100 * index + channel) as f64
    }
}

impl SensorPort for ScriptedSensors {
    fn read_family(&mut self, family: Family) -> Result<Readings, SensorError> {
        if family == Family::READ_ORDER[0] {
            self.cycle += 1;
        }
        if let Some(clock) = &self.clock {
            clock.advance(self.latency);
        }
        if let Some((_, _, stall)) = self
            .hangs
            .iter()
            .find(|(cycle, f, _)| *cycle == self.cycle && *f == family)
        {
            std::thread::sleep(*stall);
        }
        if self.failures.contains(&(self.cycle, family)) {
            return Err(SensorError::Bus);
        }
        let mut out = Readings::new();
        for ch in 0..self.layout.width(family) {
            out.push(Self::expected(family, ch)).unwrap();
        }
        Ok(out)
    }
}

// ── Record and event capture ──────────────────────────────────

/// Keeps every record; fails the append numbered `fail_at` (1-based).
#[derive(Default)]
pub struct MemorySink {
    pub records: Vec<SampleRecord>,
    pub fail_at: Option<usize>,
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &SampleRecord) -> Result<(), RecordError> {
        if self.fail_at == Some(self.records.len() + 1) {
            return Err(RecordError::Io(std::io::Error::other("disk full")));
        }
        self.records.push(record.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

/// Event sink that costs simulated time: every cycle report it handles
/// advances `clock` by `cost`, the way a slow log or console would.
pub struct SlowEventLog {
    pub events: Vec<AppEvent>,
    clock: SimClock,
    cost: Duration,
}

impl SlowEventLog {
    pub fn new(clock: SimClock, cost: Duration) -> Self {
        Self {
            events: Vec::new(),
            clock,
            cost,
        }
    }
}

impl EventSink for SlowEventLog {
    fn emit(&mut self, event: &AppEvent) {
        if matches!(event, AppEvent::CycleRecorded(_)) {
            self.clock.advance(self.cost);
        }
        self.events.push(event.clone());
    }
}
