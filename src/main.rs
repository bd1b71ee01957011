//! Bioreactor DAQ: main entry point
//!
//! Composition root: every adapter is built here and handed to the
//! sampling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SensorHub / SimulatedRig   HardwareActuators / SimActuators   │
//! │  (SensorPort, timed)        (ActuatorPort)                     │
//! │  CsvRecorder   SvgPlot      LogEventSink   SystemClock         │
//! │  (RecordSink)  (Display)    (EventSink)    (Clock)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            SamplingLoop (pure logic)                   │    │
//! │  │  actuate · settle · read · record · pause              │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Ring-light scheduler thread · console thread ── commands ──▶  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use core::time::Duration;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use log::info;

use bioreactor::adapters::console::{ConsoleRouter, spawn_console};
use bioreactor::adapters::csv_sink::{CsvRecorder, DEFAULT_DATA_DIR, timestamped_path};
use bioreactor::adapters::log_sink::LogEventSink;
use bioreactor::adapters::sim::{SimActuators, SimulatedRig};
use bioreactor::adapters::time::SystemClock;
use bioreactor::app::events::RunSummary;
use bioreactor::app::ports::{ActuatorPort, RecordSink, SensorPort};
use bioreactor::app::record::RecordLayout;
use bioreactor::app::service::SamplingLoop;
use bioreactor::config::{RingLightPolicy, RunConfig};
use bioreactor::scheduler::{RingLightHandle, spawn_ring_light};
use bioreactor::sensors::worker::TimedSensorPort;

// ── Command line ──────────────────────────────────────────────

fn cli() -> Command {
    Command::new("bioreactor")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Periodic sampling of the bioreactor rig into a CSV file")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON run configuration; missing fields take defaults"),
        )
        .arg(
            Arg::new("duration")
                .short('d')
                .long("duration")
                .value_name("SECS")
                .value_parser(value_parser!(f64))
                .help("Total run duration"),
        )
        .arg(
            Arg::new("interval")
                .short('i')
                .long("interval")
                .value_name("SECS")
                .value_parser(value_parser!(f64))
                .help("Period between cycle starts"),
        )
        .arg(
            Arg::new("settle")
                .long("settle")
                .value_name("SECS")
                .value_parser(value_parser!(f64))
                .help("Delay between IR LEDs on and the first read"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("CSV output file [default: data/bioreactor-<timestamp>.csv]"),
        )
        .arg(
            Arg::new("plot")
                .long("plot")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("SVG live plot, re-rendered after every cycle"),
        )
        .arg(
            Arg::new("simulate")
                .long("simulate")
                .action(ArgAction::SetTrue)
                .help("Run against the simulated rig instead of hardware"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level when RUST_LOG is unset (error, warn, info, debug, trace)"),
        )
}

fn apply_overrides(config: &mut RunConfig, matches: &ArgMatches) {
    if let Some(v) = matches.get_one::<f64>("duration") {
        config.duration_secs = *v;
    }
    if let Some(v) = matches.get_one::<f64>("interval") {
        config.interval_secs = *v;
    }
    if let Some(v) = matches.get_one::<f64>("settle") {
        config.settle_secs = *v;
    }
    if let Some(v) = matches.get_one::<PathBuf>("output") {
        config.output_path = Some(v.clone());
    }
    if let Some(v) = matches.get_one::<PathBuf>("plot") {
        config.plot_path = Some(v.clone());
    }
    if let Some(v) = matches.get_one::<String>("log-level") {
        config.log_level = v.clone();
    }
}

fn init_logging(level: &str) {
    env_logger::Builder::new()
        .parse_filters(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Configuration ──────────────────────────────────────
    let matches = cli().get_matches();
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunConfig::default(),
    };
    apply_overrides(&mut config, &matches);

    // ── 2. Logging ────────────────────────────────────────────
    init_logging(&config.log_level);
    info!("╔══════════════════════════════════════╗");
    info!("║  Bioreactor DAQ v{}                ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    config.validate().context("invalid configuration")?;
    info!(
        "Run: {:.0}s budget, {:.1}s interval, {:.1}s settle, {} vials, {} probes",
        config.duration_secs,
        config.interval_secs,
        config.settle_secs,
        config.vial_count,
        config.probe_count()
    );

    // ── 3. Rig + run ──────────────────────────────────────────
    let summary = if matches.get_flag("simulate") {
        info!("Simulated rig");
        let layout = RecordLayout::new(config.vial_count, config.probe_count());
        run(&config, SimulatedRig::new(layout), SimActuators::new())?
    } else {
        run_on_hardware(&config)?
    };

    info!(
        "Done: {} rows in {:.1}s ({} degraded reads, {} overruns)",
        summary.cycles, summary.elapsed_secs, summary.degraded_reads, summary.overruns
    );
    Ok(())
}

#[cfg(feature = "linux")]
fn run_on_hardware(config: &RunConfig) -> Result<RunSummary> {
    use bioreactor::adapters::linux;

    let sensors = linux::open_sensors(config).context("sensor initialisation failed")?;
    let actuators = linux::open_actuators(config).context("actuator initialisation failed")?;
    run(config, sensors, actuators)
}

#[cfg(not(feature = "linux"))]
fn run_on_hardware(_config: &RunConfig) -> Result<RunSummary> {
    anyhow::bail!("built without board support; rebuild with `--features linux` or pass --simulate")
}

/// Wire the threads and adapters around one rig and run it to completion.
fn run<S, A>(config: &RunConfig, sensors: S, actuators: A) -> Result<RunSummary>
where
    S: SensorPort + Send + 'static,
    A: ActuatorPort,
{
    let layout = RecordLayout::new(config.vial_count, config.probe_count());

    // ── Output ────────────────────────────────────────────────
    let output = config
        .output_path
        .clone()
        .unwrap_or_else(|| timestamped_path(Path::new(DEFAULT_DATA_DIR)));
    let mut recorder = CsvRecorder::create(&output, layout)
        .with_context(|| format!("creating {}", output.display()))?;
    let mut display = live_plot(config);

    // ── Sensor worker ─────────────────────────────────────────
    let sensors = TimedSensorPort::spawn(sensors, Duration::from_secs_f64(config.read_timeout_secs))
        .context("spawning sensor worker")?;

    // ── Command threads ───────────────────────────────────────
    let (commands, inbox) = mpsc::channel();
    let ring = match config.ring_light {
        RingLightPolicy::Off => None,
        policy => Some(
            spawn_ring_light(
                policy,
                Duration::from_secs_f64(config.ring_tick_secs),
                commands.clone(),
            )
            .context("spawning ring-light scheduler")?,
        ),
    };
    let router = ConsoleRouter::new(commands, ring.as_ref().map(RingLightHandle::remote));
    spawn_console(router).context("spawning console")?;

    // ── Sampling ──────────────────────────────────────────────
    let mut sampling =
        SamplingLoop::new(config, sensors, actuators, SystemClock::new()).with_inbox(inbox);
    let outcome = sampling.run(&mut recorder, &mut display, &mut LogEventSink::new());

    if let Some(ring) = ring {
        ring.stop();
    }
    let summary = outcome.with_context(|| format!("recording to {}", output.display()))?;
    info!("{} rows written to {}", recorder.rows(), output.display());
    Ok(summary)
}

#[cfg(feature = "plot")]
fn live_plot(config: &RunConfig) -> Option<bioreactor::adapters::plot::SvgPlot> {
    config.plot_path.as_ref().map(|path| {
        info!("Live plot: {}", path.display());
        bioreactor::adapters::plot::SvgPlot::new(path)
    })
}

#[cfg(not(feature = "plot"))]
fn live_plot(config: &RunConfig) -> Option<()> {
    if config.plot_path.is_some() {
        log::warn!("Built without the `plot` feature; no live plot");
    }
    None
}
