//! Clock adapters.
//!
//! - [`SystemClock`]: `std::time::Instant` plus channel-interruptible
//!   sleeps, for real runs.
//! - [`SimClock`]: virtual time that only moves when something waits on
//!   it, so a ten-minute run finishes in microseconds under test.

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread;
use std::time::Instant;

use crate::app::commands::ActuatorCommand;
use crate::app::ports::Clock;

// ───────────────────────────────────────────────────────────────
// Wall clock
// ───────────────────────────────────────────────────────────────

/// Monotonic wall clock.
pub struct SystemClock {
    epoch: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }

    fn wait(
        &mut self,
        timeout: Duration,
        inbox: Option<&Receiver<ActuatorCommand>>,
    ) -> Option<ActuatorCommand> {
        let deadline = Instant::now() + timeout;
        if let Some(rx) = inbox {
            match rx.recv_timeout(timeout) {
                Ok(cmd) => return Some(cmd),
                Err(RecvTimeoutError::Timeout) => return None,
                // Every sender is gone; fall through to a plain sleep.
                Err(RecvTimeoutError::Disconnected) => {}
            }
        }
        thread::sleep(deadline.saturating_duration_since(Instant::now()));
        None
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated clock
// ───────────────────────────────────────────────────────────────

/// Virtual clock.  Clones share the same time, so a simulated sensor can
/// charge its read latency to the loop's clock.
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    nanos: Arc<AtomicU64>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(by.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Clock for SimClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    /// A pending command is returned at once without moving time;
    /// otherwise time jumps by the full timeout.
    fn wait(
        &mut self,
        timeout: Duration,
        inbox: Option<&Receiver<ActuatorCommand>>,
    ) -> Option<ActuatorCommand> {
        if let Some(cmd) = inbox.and_then(|rx| rx.try_recv().ok()) {
            return Some(cmd);
        }
        self.advance(timeout);
        None
    }
}
