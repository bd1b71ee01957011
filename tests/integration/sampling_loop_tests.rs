//! Integration tests for the full sampling pipeline: sensors → record →
//! sink, with actuator sequencing and pause timing on a simulated clock.

use std::sync::mpsc;
use std::time::Duration;

use crate::mock_hw::{
    ActuatorCall, EventLog, MemorySink, MockActuators, ScriptedSensors, SlowEventLog,
};

use bioreactor::adapters::csv_sink::CsvRecorder;
use bioreactor::adapters::sim::{SimActuators, SimulatedRig};
use bioreactor::adapters::time::{SimClock, SystemClock};
use bioreactor::app::commands::ActuatorCommand;
use bioreactor::app::events::AppEvent;
use bioreactor::app::record::{Family, RecordLayout};
use bioreactor::app::service::{CycleState, SamplingLoop};
use bioreactor::config::RunConfig;
use bioreactor::error::{Error, SensorError};
use bioreactor::sensors::worker::TimedSensorPort;

fn config(duration_secs: f64, interval_secs: f64, settle_secs: f64) -> RunConfig {
    RunConfig {
        duration_secs,
        interval_secs,
        settle_secs,
        grace_secs: 1.0,
        ..Default::default()
    }
}

fn layout(cfg: &RunConfig) -> RecordLayout {
    RecordLayout::new(cfg.vial_count, cfg.probe_count())
}

fn starts(sink: &MemorySink) -> Vec<f64> {
    sink.records.iter().map(|r| r.elapsed_rounded()).collect()
}

// ── Cycle timing ──────────────────────────────────────────────

#[test]
fn ninety_second_run_records_four_aligned_rows() {
    let cfg = config(90.0, 30.0, 1.0);
    let hw = MockActuators::new();
    let mut sink = MemorySink::default();
    let mut events = EventLog::default();

    let mut sampling = SamplingLoop::new(
        &cfg,
        ScriptedSensors::new(layout(&cfg)),
        hw.clone(),
        SimClock::new(),
    );
    let summary = sampling.run(&mut sink, &mut (), &mut events).unwrap();

    assert_eq!(starts(&sink), vec![0.0, 30.0, 60.0, 90.0]);
    assert_eq!(summary.cycles, 4);
    assert_eq!(summary.degraded_reads, 0);
    assert_eq!(summary.overruns, 0);
    assert_eq!(sampling.state(), CycleState::Done);
    assert_eq!(sampling.series().len(), 4);
}

#[test]
fn ten_minute_run_stays_within_grace() {
    let cfg = config(600.0, 30.0, 1.0);
    let mut sink = MemorySink::default();
    let mut sampling = SamplingLoop::new(
        &cfg,
        ScriptedSensors::new(layout(&cfg)),
        MockActuators::new(),
        SimClock::new(),
    );
    sampling
        .run(&mut sink, &mut (), &mut EventLog::default())
        .unwrap();

    assert_eq!(sink.records.len(), 21);
    assert!(sink.records.iter().all(|r| r.elapsed_secs <= 601.0));
    assert_eq!(sink.records.last().unwrap().elapsed_rounded(), 600.0);
}

#[test]
fn fractional_processing_time_does_not_drift() {
    // 8 reads x 0.3 s = 2.4 s of processing per cycle.
    let cfg = config(120.0, 30.0, 0.0);
    let clock = SimClock::new();
    let sensors =
        ScriptedSensors::new(layout(&cfg)).with_latency(clock.clone(), Duration::from_millis(300));
    let mut sink = MemorySink::default();
    let mut sampling = SamplingLoop::new(&cfg, sensors, MockActuators::new(), clock);
    sampling
        .run(&mut sink, &mut (), &mut EventLog::default())
        .unwrap();

    let times = starts(&sink);
    assert_eq!(times.len(), 5);
    for (i, t) in times.iter().enumerate() {
        assert!((t - 30.0 * i as f64).abs() < 1e-3, "cycle {} started at {}", i + 1, t);
    }
}

#[test]
fn work_after_the_measurement_does_not_delay_the_next_start() {
    // 1.2 s of reads measured, then 0.7 s spent handing the cycle report on.
    let cfg = config(120.0, 30.0, 0.0);
    let clock = SimClock::new();
    let sensors =
        ScriptedSensors::new(layout(&cfg)).with_latency(clock.clone(), Duration::from_millis(150));
    let mut events = SlowEventLog::new(clock.clone(), Duration::from_millis(700));
    let mut sink = MemorySink::default();
    let mut sampling = SamplingLoop::new(&cfg, sensors, MockActuators::new(), clock);
    let summary = sampling.run(&mut sink, &mut (), &mut events).unwrap();

    let times = starts(&sink);
    assert_eq!(times.len(), 5);
    for (i, t) in times.iter().enumerate() {
        assert!((t - 30.0 * i as f64).abs() < 1e-3, "cycle {} started at {}", i + 1, t);
    }
    assert_eq!(summary.overruns, 0);
}

#[test]
fn overrun_clamps_pause_and_keeps_running() {
    // 8 reads x 5 s = 40 s of processing against a 30 s interval.
    let cfg = config(90.0, 30.0, 0.0);
    let clock = SimClock::new();
    let sensors =
        ScriptedSensors::new(layout(&cfg)).with_latency(clock.clone(), Duration::from_secs(5));
    let mut sink = MemorySink::default();
    let mut events = EventLog::default();
    let mut sampling = SamplingLoop::new(&cfg, sensors, MockActuators::new(), clock);
    let summary = sampling.run(&mut sink, &mut (), &mut events).unwrap();

    assert_eq!(starts(&sink), vec![0.0, 40.0, 80.0]);
    assert_eq!(summary.overruns, 3);
    let overruns = events
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::CycleOverrun { .. }))
        .count();
    assert_eq!(overruns, 3);
}

#[test]
fn zero_budget_runs_exactly_one_cycle() {
    let cfg = config(0.0, 30.0, 1.0);
    let mut sink = MemorySink::default();
    let mut sampling = SamplingLoop::new(
        &cfg,
        ScriptedSensors::new(layout(&cfg)),
        MockActuators::new(),
        SimClock::new(),
    );
    sampling
        .run(&mut sink, &mut (), &mut EventLog::default())
        .unwrap();
    assert_eq!(starts(&sink), vec![0.0]);
}

// ── Records ───────────────────────────────────────────────────

#[test]
fn failed_family_is_nan_for_that_cycle_only() {
    let cfg = config(60.0, 30.0, 1.0);
    let sensors = ScriptedSensors::new(layout(&cfg)).fail_on(2, Family::OpticalDensity);
    let mut sink = MemorySink::default();
    let mut events = EventLog::default();
    let mut sampling = SamplingLoop::new(&cfg, sensors, MockActuators::new(), SimClock::new());
    let summary = sampling.run(&mut sink, &mut (), &mut events).unwrap();

    assert_eq!(sink.records.len(), 3);
    assert_eq!(summary.degraded_reads, 1);

    let degraded = &sink.records[1];
    assert!(degraded.family(Family::OpticalDensity).iter().all(|v| v.is_nan()));
    for family in Family::COLUMN_ORDER {
        if family == Family::OpticalDensity {
            continue;
        }
        for (ch, v) in degraded.family(family).iter().enumerate() {
            assert_eq!(*v, ScriptedSensors::expected(family, ch), "{family} ch{ch}");
        }
    }
    for healthy in [&sink.records[0], &sink.records[2]] {
        assert!(healthy.values().iter().all(|v| v.is_finite()));
    }

    assert!(events.events.iter().any(|e| matches!(
        e,
        AppEvent::ReadDegraded {
            cycle: 2,
            family: Family::OpticalDensity,
            ..
        }
    )));
}

#[test]
fn hung_family_times_out_and_later_cycles_recover() {
    // Real time: 0.5 s interval, cycles at 0, 0.5 and 1.0 s.  The first
    // optical-density read hangs 200 ms against a 50 ms read timeout; the
    // worker is free again well before the next cycle.
    let cfg = RunConfig {
        duration_secs: 1.0,
        interval_secs: 0.5,
        settle_secs: 0.0,
        grace_secs: 0.25,
        ..Default::default()
    };
    let sensors = ScriptedSensors::new(layout(&cfg)).hang_on(
        1,
        Family::OpticalDensity,
        Duration::from_millis(200),
    );
    let timed = TimedSensorPort::spawn(sensors, Duration::from_millis(50)).unwrap();
    let mut sink = MemorySink::default();
    let mut events = EventLog::default();
    let mut sampling = SamplingLoop::new(&cfg, timed, MockActuators::new(), SystemClock::new());
    let summary = sampling.run(&mut sink, &mut (), &mut events).unwrap();

    assert!(sink.records.len() >= 2, "only {} rows", sink.records.len());
    assert_eq!(summary.degraded_reads, 1);

    let first = &sink.records[0];
    assert!(first.family(Family::OpticalDensity).iter().all(|v| v.is_nan()));
    for family in Family::COLUMN_ORDER {
        if family == Family::OpticalDensity {
            continue;
        }
        for (ch, v) in first.family(family).iter().enumerate() {
            assert_eq!(*v, ScriptedSensors::expected(family, ch), "{family} ch{ch}");
        }
    }
    for later in &sink.records[1..] {
        assert!(later.values().iter().all(|v| v.is_finite()));
    }

    assert!(events.events.iter().any(|e| matches!(
        e,
        AppEvent::ReadDegraded {
            cycle: 1,
            family: Family::OpticalDensity,
            error: SensorError::Timeout,
        }
    )));
}

#[test]
fn csv_rows_have_header_width() {
    let cfg = config(60.0, 30.0, 1.0);
    let layout = layout(&cfg);
    let mut recorder = CsvRecorder::new(Vec::new(), layout).unwrap();
    let sensors = ScriptedSensors::new(layout).fail_on(1, Family::ExternalTemperature);
    let mut sampling = SamplingLoop::new(&cfg, sensors, MockActuators::new(), SimClock::new());
    sampling
        .run(&mut recorder, &mut (), &mut EventLog::default())
        .unwrap();
    drop(sampling);

    let text = String::from_utf8(recorder.into_inner().unwrap()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("elapsed,opt_dens1,"));
    assert!(lines[0].ends_with(",atm_temp,atm_press"));
    for line in &lines {
        assert_eq!(line.split(',').count(), 31);
    }
    assert!(lines[1].starts_with("0.000,"));
    assert!(lines[1].contains("NaN"));
    assert!(!lines[2].contains("NaN"));
}

#[test]
fn simulated_rig_with_fault_fills_every_row() {
    let cfg = config(60.0, 30.0, 1.0);
    let layout = layout(&cfg);
    let rig = SimulatedRig::new(layout).with_fault(Family::LedReference);
    let mut sink = MemorySink::default();
    let mut sampling = SamplingLoop::new(&cfg, rig, SimActuators::new(), SimClock::new());
    let summary = sampling
        .run(&mut sink, &mut (), &mut EventLog::default())
        .unwrap();

    assert_eq!(summary.degraded_reads, 3);
    for record in &sink.records {
        assert!(record.family(Family::LedReference).iter().all(|v| v.is_nan()));
        assert!(record.family(Family::OpticalDensity).iter().all(|v| v.is_finite()));
    }
    assert_eq!(sampling.actuators().state().shutdowns, 1);
}

// ── Actuators ─────────────────────────────────────────────────

#[test]
fn leds_bracket_every_read_and_shutdown_runs_once() {
    let cfg = config(60.0, 30.0, 1.0);
    let hw = MockActuators::new();
    {
        let mut sampling = SamplingLoop::new(
            &cfg,
            ScriptedSensors::new(layout(&cfg)),
            hw.clone(),
            SimClock::new(),
        );
        sampling
            .run(&mut MemorySink::default(), &mut (), &mut EventLog::default())
            .unwrap();
    }

    assert_eq!(hw.count(ActuatorCall::IlluminationOn), 3);
    assert_eq!(hw.count(ActuatorCall::IlluminationOff), 3);
    assert_eq!(hw.count(ActuatorCall::Shutdown), 1);
    assert_eq!(hw.history().last(), Some(&ActuatorCall::Shutdown));
    assert!(!hw.ir_on());
}

#[test]
fn record_failure_aborts_after_shutdown() {
    let cfg = config(120.0, 30.0, 1.0);
    let hw = MockActuators::new();
    let mut sink = MemorySink {
        fail_at: Some(2),
        ..Default::default()
    };
    let mut events = EventLog::default();
    {
        let mut sampling = SamplingLoop::new(
            &cfg,
            ScriptedSensors::new(layout(&cfg)),
            hw.clone(),
            SimClock::new(),
        );
        let err = sampling.run(&mut sink, &mut (), &mut events).unwrap_err();
        assert!(matches!(err, Error::Record(_)));
        assert_eq!(sampling.state(), CycleState::Done);
    }

    assert_eq!(sink.records.len(), 1);
    assert_eq!(hw.count(ActuatorCall::Shutdown), 1);
    assert!(!hw.ir_on());
    assert!(!events
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::Finished(_))));
}

#[test]
fn queued_commands_apply_during_first_settle() {
    let mut cfg = config(0.0, 30.0, 1.0);
    cfg.stirrer_duty = 25;
    let hw = MockActuators::new();
    let (tx, inbox) = mpsc::channel();
    tx.send(ActuatorCommand::Stirrer(60)).unwrap();
    tx.send(ActuatorCommand::RingLight((0, 0, 255))).unwrap();

    let mut sampling = SamplingLoop::new(
        &cfg,
        ScriptedSensors::new(layout(&cfg)),
        hw.clone(),
        SimClock::new(),
    )
    .with_inbox(inbox);
    sampling
        .run(&mut MemorySink::default(), &mut (), &mut EventLog::default())
        .unwrap();

    assert_eq!(
        hw.history(),
        vec![
            ActuatorCall::Stirrer(25),
            ActuatorCall::IlluminationOn,
            ActuatorCall::Stirrer(60),
            ActuatorCall::RingLight((0, 0, 255)),
            ActuatorCall::IlluminationOff,
            ActuatorCall::Shutdown,
        ]
    );
}

#[test]
fn events_walk_the_cycle_states() {
    let cfg = config(0.0, 30.0, 1.0);
    let mut events = EventLog::default();
    let mut sampling = SamplingLoop::new(
        &cfg,
        ScriptedSensors::new(layout(&cfg)),
        MockActuators::new(),
        SimClock::new(),
    );
    sampling
        .run(&mut MemorySink::default(), &mut (), &mut events)
        .unwrap();

    let states: Vec<CycleState> = events
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::StateChanged { to, .. } => Some(*to),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            CycleState::Actuating,
            CycleState::Settling,
            CycleState::Reading,
            CycleState::Recording,
            CycleState::Done,
        ]
    );
    assert!(matches!(events.events.first(), Some(AppEvent::Started { vials: 4, probes: 4, .. })));
    assert!(matches!(events.events.last(), Some(AppEvent::Finished(s)) if s.cycles == 1));
}
