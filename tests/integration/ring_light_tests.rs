//! Integration tests for the ring-light scheduler thread, the console
//! router and delivery of their commands through the sampling loop.

use std::sync::mpsc;
use std::time::Duration;

use crate::mock_hw::{ActuatorCall, EventLog, MemorySink, MockActuators, ScriptedSensors};

use bioreactor::adapters::console::ConsoleRouter;
use bioreactor::adapters::time::SimClock;
use bioreactor::app::commands::{ActuatorCommand, RGB_WHITE, RingControl};
use bioreactor::app::record::RecordLayout;
use bioreactor::app::service::SamplingLoop;
use bioreactor::config::{RingLightPolicy, RunConfig};
use bioreactor::scheduler::spawn_ring_light;

const HOUR_WHEEL: RingLightPolicy = RingLightPolicy::HueWheel {
    period_secs: 3_600.0,
};

const DAY_NIGHT: RingLightPolicy = RingLightPolicy::DayNight {
    on_secs: 43_200.0,
    off_secs: 43_200.0,
};

#[test]
fn scheduler_sends_first_colour_then_override_then_resume() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_ring_light(DAY_NIGHT, Duration::from_secs(60), tx).unwrap();
    let remote = handle.remote();
    assert!(remote.send(RingControl::Override((1, 2, 3))));
    assert!(remote.send(RingControl::Resume));
    handle.stop();

    let got: Vec<_> = rx.try_iter().collect();
    assert_eq!(
        got,
        vec![
            ActuatorCommand::RingLight(RGB_WHITE),
            ActuatorCommand::RingLight((1, 2, 3)),
            ActuatorCommand::RingLight(RGB_WHITE),
        ]
    );
}

#[test]
fn remote_reports_stopped_scheduler() {
    let (tx, _rx) = mpsc::channel();
    let handle = spawn_ring_light(HOUR_WHEEL, Duration::from_secs(60), tx).unwrap();
    let remote = handle.remote();
    handle.stop();
    assert!(!remote.send(RingControl::Resume));
}

#[test]
fn console_ring_commands_go_through_scheduler() {
    let (tx, rx) = mpsc::channel();
    let handle = spawn_ring_light(HOUR_WHEEL, Duration::from_secs(60), tx.clone()).unwrap();
    let router = ConsoleRouter::new(tx, Some(handle.remote()));
    router.serve("ring 9 9 9\nstir 30\n".as_bytes());
    handle.stop();

    let got: Vec<_> = rx.try_iter().collect();
    assert!(got.contains(&ActuatorCommand::RingLight((255, 0, 0))));
    assert!(got.contains(&ActuatorCommand::RingLight((9, 9, 9))));
    assert!(got.contains(&ActuatorCommand::Stirrer(30)));
    let red = got
        .iter()
        .position(|c| *c == ActuatorCommand::RingLight((255, 0, 0)))
        .unwrap();
    let held = got
        .iter()
        .position(|c| *c == ActuatorCommand::RingLight((9, 9, 9)))
        .unwrap();
    assert!(red < held);
}

#[test]
fn sampling_loop_applies_scheduler_colours() {
    let (tx, inbox) = mpsc::channel();
    let handle = spawn_ring_light(HOUR_WHEEL, Duration::from_secs(60), tx).unwrap();
    handle.remote().send(RingControl::Override((5, 5, 5)));
    handle.stop();

    let cfg = RunConfig {
        duration_secs: 0.0,
        ..Default::default()
    };
    let layout = RecordLayout::new(cfg.vial_count, cfg.probe_count());
    let hw = MockActuators::new();
    let mut sampling =
        SamplingLoop::new(&cfg, ScriptedSensors::new(layout), hw.clone(), SimClock::new())
            .with_inbox(inbox);
    sampling
        .run(&mut MemorySink::default(), &mut (), &mut EventLog::default())
        .unwrap();

    assert_eq!(
        hw.history(),
        vec![
            ActuatorCall::IlluminationOn,
            ActuatorCall::RingLight((255, 0, 0)),
            ActuatorCall::RingLight((5, 5, 5)),
            ActuatorCall::IlluminationOff,
            ActuatorCall::Shutdown,
        ]
    );
}
