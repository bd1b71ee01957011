//! DS18B20 one-wire temperature probes via the Linux `w1` sysfs tree.
//!
//! The kernel's `w1_therm` driver exposes each probe as
//! `<devices>/28-<serial>/w1_slave`; reading that file triggers a
//! conversion (~750 ms) and returns
//!
//! ```text
//! 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
//! 72 01 4b 46 7f ff 0e 10 57 t=23125
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::app::record::Readings;
use crate::error::{InitError, SensorError};

/// Family code prefix of DS18B20 device directories.
const FAMILY_PREFIX: &str = "28-";

/// Parse a `w1_slave` file into °C.
pub fn parse_w1_slave(text: &str) -> Result<f64, SensorError> {
    let mut lines = text.lines();
    let crc_line = lines.next().ok_or(SensorError::Parse)?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(SensorError::Checksum);
    }
    let data_line = lines.next().ok_or(SensorError::Parse)?;
    let (_, milli) = data_line.rsplit_once("t=").ok_or(SensorError::Parse)?;
    let milli: i32 = milli.trim().parse().map_err(|_| SensorError::Parse)?;
    Ok(f64::from(milli) / 1_000.0)
}

/// Probe directories under `devices_dir`, sorted by serial number.
pub fn discover(devices_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut probes: Vec<PathBuf> = fs::read_dir(devices_dir)?
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(FAMILY_PREFIX))
        .map(|e| e.path())
        .collect();
    probes.sort();
    Ok(probes)
}

/// The probes of one run, in output order.
#[derive(Debug, Clone)]
pub struct ProbeBank {
    probes: Vec<PathBuf>,
}

impl ProbeBank {
    /// Discover probes and arrange them so that output position `i` is the
    /// discovered probe `order[i]`.
    pub fn init(devices_dir: &Path, order: &[usize]) -> Result<Self, InitError> {
        if order.is_empty() {
            return Ok(Self { probes: Vec::new() });
        }
        let found = discover(devices_dir).map_err(|e| InitError::new("ds18b20", e))?;
        if found.len() < order.len() {
            return Err(InitError::new(
                "ds18b20",
                format!(
                    "expected {} probes under {}, found {}",
                    order.len(),
                    devices_dir.display(),
                    found.len()
                ),
            ));
        }
        if found.len() > order.len() {
            warn!(
                "DS18B20: {} probes present, only {} are recorded",
                found.len(),
                order.len()
            );
        }
        let probes = order.iter().map(|&i| found[i].clone()).collect::<Vec<_>>();
        for (i, p) in probes.iter().enumerate() {
            info!("DS18B20: ext_temp{} <- {}", i + 1, p.display());
        }
        Ok(Self { probes })
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Read every probe.  One bad probe fails the whole family.
    pub fn read_all(&self) -> Result<Readings, SensorError> {
        let mut out = Readings::new();
        for dir in &self.probes {
            let text =
                fs::read_to_string(dir.join("w1_slave")).map_err(|_| SensorError::Probe)?;
            out.push(parse_w1_slave(&text)?)
                .map_err(|_| SensorError::WidthMismatch)?;
        }
        Ok(out)
    }
}
