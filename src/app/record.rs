//! Channel families and the fixed-width sample record.
//!
//! A record is one output row: the cycle's start time plus every channel
//! value in a fixed column order.  Families are the atomic unit of reading
//! and of failure: a family either delivers all of its values or is
//! NaN-filled as a whole.

use core::fmt;

use heapless::Vec as HVec;

use crate::error::SensorError;

/// Widest family (optical density, 8 photodiodes).
pub const MAX_FAMILY_WIDTH: usize = 8;

/// Values produced by one family read.
pub type Readings = HVec<f64, MAX_FAMILY_WIDTH>;

/// A named group of related channels, read and degraded as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    OpticalDensity,
    LedReference,
    InternalTemperature,
    InternalPressure,
    InternalHumidity,
    ExternalTemperature,
    AtmosphericTemperature,
    AtmosphericPressure,
}

impl Family {
    pub const COUNT: usize = 8;

    /// Column order in the output record.
    pub const COLUMN_ORDER: [Family; Family::COUNT] = [
        Family::OpticalDensity,
        Family::LedReference,
        Family::InternalTemperature,
        Family::InternalPressure,
        Family::InternalHumidity,
        Family::ExternalTemperature,
        Family::AtmosphericTemperature,
        Family::AtmosphericPressure,
    ];

    /// Order in which the loop reads families.  One-wire probes are the
    /// slowest, so they go first while the LEDs settle further.
    pub const READ_ORDER: [Family; Family::COUNT] = [
        Family::ExternalTemperature,
        Family::AtmosphericTemperature,
        Family::AtmosphericPressure,
        Family::InternalTemperature,
        Family::InternalPressure,
        Family::InternalHumidity,
        Family::LedReference,
        Family::OpticalDensity,
    ];

    /// Column-name stem.  Multi-channel families append a 1-based index.
    pub fn stem(self) -> &'static str {
        match self {
            Self::OpticalDensity => "opt_dens",
            Self::LedReference => "led_ref",
            Self::InternalTemperature => "int_temp",
            Self::InternalPressure => "int_press",
            Self::InternalHumidity => "int_humid",
            Self::ExternalTemperature => "ext_temp",
            Self::AtmosphericTemperature => "atm_temp",
            Self::AtmosphericPressure => "atm_press",
        }
    }

    fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::AtmosphericTemperature | Self::AtmosphericPressure
        )
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OpticalDensity => "optical density",
            Self::LedReference => "LED reference",
            Self::InternalTemperature => "internal temperature",
            Self::InternalPressure => "internal pressure",
            Self::InternalHumidity => "internal humidity",
            Self::ExternalTemperature => "external temperature",
            Self::AtmosphericTemperature => "atmospheric temperature",
            Self::AtmosphericPressure => "atmospheric pressure",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Fixed shape of every record in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    vials: usize,
    probes: usize,
}

impl RecordLayout {
    /// `vials` and `probes` are capped at [`MAX_FAMILY_WIDTH`].
    pub fn new(vials: usize, probes: usize) -> Self {
        Self {
            vials: vials.min(MAX_FAMILY_WIDTH),
            probes: probes.min(MAX_FAMILY_WIDTH),
        }
    }

    pub fn vials(&self) -> usize {
        self.vials
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    /// Number of values a family contributes.
    pub fn width(&self, family: Family) -> usize {
        match family {
            Family::OpticalDensity => 8,
            Family::LedReference => 4,
            Family::InternalTemperature | Family::InternalPressure | Family::InternalHumidity => {
                self.vials
            }
            Family::ExternalTemperature => self.probes,
            Family::AtmosphericTemperature | Family::AtmosphericPressure => 1,
        }
    }

    /// Index of the family's first value within the record's value slice.
    pub fn offset(&self, family: Family) -> usize {
        Family::COLUMN_ORDER
            .iter()
            .take_while(|f| **f != family)
            .map(|f| self.width(*f))
            .sum()
    }

    /// Number of channel values per record (excluding `elapsed`).
    pub fn value_count(&self) -> usize {
        Family::COLUMN_ORDER.iter().map(|f| self.width(*f)).sum()
    }

    /// Number of fields per output row (including `elapsed`).
    pub fn field_count(&self) -> usize {
        1 + self.value_count()
    }

    /// Header names, `elapsed` first.
    pub fn header(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.field_count());
        names.push("elapsed".to_string());
        for family in Family::COLUMN_ORDER {
            if family.is_scalar() {
                names.push(family.stem().to_string());
            } else {
                for i in 1..=self.width(family) {
                    names.push(format!("{}{}", family.stem(), i));
                }
            }
        }
        names
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row of output.  The value vector always has `layout.value_count()`
/// entries; a family that was not read successfully stays NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRecord {
    pub elapsed_secs: f64,
    layout: RecordLayout,
    values: Vec<f64>,
}

impl SampleRecord {
    /// A record with every channel NaN.
    pub fn new(layout: RecordLayout, elapsed_secs: f64) -> Self {
        Self {
            elapsed_secs,
            layout,
            values: vec![f64::NAN; layout.value_count()],
        }
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    /// Store a family's readings.  A reading of the wrong width is rejected
    /// and leaves the family NaN.
    pub fn set(&mut self, family: Family, readings: &[f64]) -> Result<(), SensorError> {
        let width = self.layout.width(family);
        if readings.len() != width {
            return Err(SensorError::WidthMismatch);
        }
        let start = self.layout.offset(family);
        self.values[start..start + width].copy_from_slice(readings);
        Ok(())
    }

    /// Values of one family, in channel order.
    pub fn family(&self, family: Family) -> &[f64] {
        let start = self.layout.offset(family);
        &self.values[start..start + self.layout.width(family)]
    }

    /// All channel values in column order (excluding `elapsed`).
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `elapsed` rounded to milliseconds, as written to the output.
    pub fn elapsed_rounded(&self) -> f64 {
        (self.elapsed_secs * 1000.0).round() / 1000.0
    }

    /// Output fields as text: `elapsed` with 3 decimals, `NaN` for failed
    /// channels.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.layout.field_count());
        out.push(format!("{:.3}", self.elapsed_rounded()));
        out.extend(self.values.iter().map(|v| format_value(*v)));
        out
    }
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else {
        v.to_string()
    }
}
