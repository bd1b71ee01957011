//! Operator console: line commands on stdin.
//!
//! Ring-light commands go to the scheduler when one is running, so an
//! override survives its next tick.  Without a scheduler the colour is sent
//! straight to the actuator owner.  Stirrer commands always go straight
//! there.

use std::io::{self, BufRead};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use log::{info, warn};

use crate::app::commands::{parse_console_line, ActuatorCommand, ConsoleCommand, RingControl};
use crate::scheduler::RingLightRemote;

/// Where parsed console commands end up.
pub struct ConsoleRouter {
    commands: Sender<ActuatorCommand>,
    ring: Option<RingLightRemote>,
}

impl ConsoleRouter {
    pub fn new(commands: Sender<ActuatorCommand>, ring: Option<RingLightRemote>) -> Self {
        Self { commands, ring }
    }

    /// Deliver one command.  Returns `false` once the sampling thread has
    /// gone away and nothing further can be applied.
    pub fn route(&self, cmd: ConsoleCommand) -> bool {
        match cmd {
            ConsoleCommand::Ring(ctl) => match (&self.ring, ctl) {
                (Some(remote), ctl) => {
                    if !remote.send(ctl) {
                        warn!("Console: ring-light scheduler has stopped");
                    }
                    true
                }
                (None, RingControl::Override(rgb)) => {
                    self.commands.send(ActuatorCommand::RingLight(rgb)).is_ok()
                }
                (None, RingControl::Resume) => {
                    info!("Console: no ring-light schedule to resume");
                    true
                }
            },
            ConsoleCommand::Stir(duty) => self.commands.send(ActuatorCommand::Stirrer(duty)).is_ok(),
        }
    }

    /// Parse and route every line of `input` until it ends or the
    /// sampling thread goes away.
    pub fn serve(&self, input: impl BufRead) {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Console: read failed: {}", e);
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_console_line(&line) {
                Ok(cmd) => {
                    info!("Console: {:?}", cmd);
                    if !self.route(cmd) {
                        return;
                    }
                }
                Err(e) => warn!("Console: {:?}: {}", line.trim(), e),
            }
        }
    }
}

/// Serve stdin on a thread named `console`.  The thread is left detached;
/// it blocks in `read` and ends with the process.
pub fn spawn_console(router: ConsoleRouter) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("console".into())
        .spawn(move || router.serve(io::stdin().lock()))
}
