//! Timeout-bounded sensor reads on a dedicated worker thread.
//!
//! A wedged I2C transaction or a hung one-wire read would otherwise stall
//! the sampling loop indefinitely.  [`TimedSensorPort`] moves the real port
//! onto a `sensor-worker` thread and waits at most `timeout` for each reply.
//!
//! - A read that misses its deadline fails with [`SensorError::Timeout`].
//! - Replies are tagged with a request id; a late reply to an abandoned
//!   request is discarded, never attributed to a later read.
//! - While the worker is still stuck on an earlier read, new requests fail
//!   fast with [`SensorError::Stalled`] instead of queueing up.

use core::time::Duration;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use log::{debug, warn};

use crate::app::ports::SensorPort;
use crate::app::record::{Family, Readings};
use crate::error::SensorError;

type Reply = (u64, Result<Readings, SensorError>);

pub struct TimedSensorPort {
    requests: SyncSender<(u64, Family)>,
    replies: Receiver<Reply>,
    next_id: u64,
    timeout: Duration,
    // Detached on drop: a worker stuck in a read cannot be joined.
    _worker: JoinHandle<()>,
}

impl TimedSensorPort {
    pub fn spawn<S>(mut inner: S, timeout: Duration) -> io::Result<Self>
    where
        S: SensorPort + Send + 'static,
    {
        // One slot: a request can wait behind a stalled read, a second cannot.
        let (requests, request_rx) = mpsc::sync_channel::<(u64, Family)>(1);
        let (reply_tx, replies) = mpsc::channel::<Reply>();

        let worker = thread::Builder::new()
            .name("sensor-worker".into())
            .spawn(move || {
                for (id, family) in request_rx {
                    let result = inner.read_family(family);
                    if reply_tx.send((id, result)).is_err() {
                        break;
                    }
                }
                debug!("Sensor worker exiting");
            })?;

        Ok(Self {
            requests,
            replies,
            next_id: 0,
            timeout,
            _worker: worker,
        })
    }
}

impl SensorPort for TimedSensorPort {
    fn read_family(&mut self, family: Family) -> Result<Readings, SensorError> {
        let id = self.next_id;
        self.next_id += 1;

        match self.requests.try_send((id, family)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => return Err(SensorError::Stalled),
            Err(TrySendError::Disconnected(_)) => return Err(SensorError::Unavailable),
        }

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.replies.recv_timeout(remaining) {
                Ok((reply_id, result)) if reply_id == id => return result,
                Ok((stale, _)) => debug!("Discarding late reply to request {}", stale),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "{} read exceeded {:.1}s timeout",
                        family,
                        self.timeout.as_secs_f64()
                    );
                    return Err(SensorError::Timeout);
                }
                Err(RecvTimeoutError::Disconnected) => return Err(SensorError::Unavailable),
            }
        }
    }
}
