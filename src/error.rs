//! Unified error types for the bioreactor harness.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! sampling loop's error handling uniform.  Sensor errors are `Copy` so they
//! travel through the degrade path and the event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the harness funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// A sensor family could not be read.
    Sensor(SensorError),
    /// A sensor or actuator failed to attach at startup.
    Init(InitError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// An output record could not be persisted.
    Record(RecordError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::Record(e) => write!(f, "record: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// Why a single family read failed.  Always recovered locally: the loop
/// substitutes NaN for the family and carries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The I2C transaction failed (NACK, arbitration loss, bus error).
    Bus,
    /// The multiplexer could not route to the requested channel.
    MuxSelect,
    /// A one-wire probe file could not be read.
    Probe,
    /// A one-wire probe reported a CRC mismatch.
    Checksum,
    /// Raw data could not be decoded into a value.
    Parse,
    /// The read did not return within the configured timeout.
    Timeout,
    /// The sensor worker is still busy with an earlier stalled read.
    Stalled,
    /// The sensor worker thread has gone away.
    Unavailable,
    /// The family produced a different number of values than the layout expects.
    WidthMismatch,
    /// Injected failure (simulation only).
    Simulated,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus => write!(f, "I2C bus error"),
            Self::MuxSelect => write!(f, "multiplexer channel select failed"),
            Self::Probe => write!(f, "one-wire probe read failed"),
            Self::Checksum => write!(f, "one-wire CRC mismatch"),
            Self::Parse => write!(f, "unparseable reading"),
            Self::Timeout => write!(f, "read timed out"),
            Self::Stalled => write!(f, "sensor worker stalled"),
            Self::Unavailable => write!(f, "sensor worker unavailable"),
            Self::WidthMismatch => write!(f, "unexpected number of channels"),
            Self::Simulated => write!(f, "simulated fault"),
        }
    }
}

impl std::error::Error for SensorError {}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Initialisation errors
// ---------------------------------------------------------------------------

/// Fatal startup failure.  Names the subsystem that failed to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitError {
    pub subsystem: &'static str,
    pub reason: String,
}

impl InitError {
    pub fn new(subsystem: &'static str, reason: impl fmt::Display) -> Self {
        Self {
            subsystem,
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed to attach: {}", self.subsystem, self.reason)
    }
}

impl std::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file is not valid JSON for [`RunConfig`](crate::config::RunConfig).
    Malformed(serde_json::Error),
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "cannot read config: {e}"),
            Self::Malformed(e) => write!(f, "malformed config: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Record errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RecordError {
    /// Writing or flushing the output failed.
    Io(std::io::Error),
    /// The CSV encoder rejected the row.
    Csv(csv::Error),
    /// The record does not match the header width.
    Width { expected: usize, actual: usize },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Csv(e) => write!(f, "CSV error: {e}"),
            Self::Width { expected, actual } => {
                write!(f, "row has {actual} fields, header has {expected}")
            }
        }
    }
}

impl std::error::Error for RecordError {}

impl From<std::io::Error> for RecordError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for RecordError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e)
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_error_names_subsystem() {
        let e = Error::from(InitError::new("BME280 vial 2", "no ACK at 0x76"));
        assert_eq!(e.to_string(), "init: BME280 vial 2 failed to attach: no ACK at 0x76");
    }

    #[test]
    fn width_error_reports_both_sides() {
        let e = RecordError::Width { expected: 31, actual: 30 };
        assert_eq!(e.to_string(), "row has 30 fields, header has 31");
    }
}
