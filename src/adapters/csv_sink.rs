//! CSV record sink.
//!
//! Header row on creation, then one row per cycle, flushed before
//! [`RecordSink::append`] returns so a crash loses at most the cycle in
//! flight.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::app::ports::RecordSink;
use crate::app::record::{RecordLayout, SampleRecord};
use crate::error::RecordError;

/// Directory used when no output path is configured.
pub const DEFAULT_DATA_DIR: &str = "data";

/// `<dir>/bioreactor-YYYY-MM-DDTHH-MM-SS.csv` for the current local time.
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let ts = Local::now().format("%Y-%m-%dT%H-%M-%S");
    dir.join(format!("bioreactor-{ts}.csv"))
}

pub struct CsvRecorder<W: Write> {
    writer: csv::Writer<W>,
    width: usize,
    rows: u64,
}

impl CsvRecorder<File> {
    /// Create (or truncate) `path`, creating parent directories as needed.
    pub fn create(path: &Path, layout: RecordLayout) -> Result<Self, RecordError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        info!("Recording to {}", path.display());
        Self::new(file, layout)
    }
}

impl<W: Write> CsvRecorder<W> {
    /// Write the header for `layout` and flush it.
    pub fn new(inner: W, layout: RecordLayout) -> Result<Self, RecordError> {
        let mut writer = csv::Writer::from_writer(inner);
        let header = layout.header();
        writer.write_record(&header)?;
        writer.flush()?;
        Ok(Self {
            writer,
            width: header.len(),
            rows: 0,
        })
    }

    /// Data rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    pub fn into_inner(self) -> Result<W, RecordError> {
        self.writer
            .into_inner()
            .map_err(|e| RecordError::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvRecorder<W> {
    fn append(&mut self, record: &SampleRecord) -> Result<(), RecordError> {
        let fields = record.fields();
        if fields.len() != self.width {
            return Err(RecordError::Width {
                expected: self.width,
                actual: fields.len(),
            });
        }
        self.writer.write_record(&fields)?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }
}
