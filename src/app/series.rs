//! In-memory time series retained for live display.

use super::record::{Family, RecordLayout, SampleRecord};

/// Column-oriented copy of every record in the run.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    layout: RecordLayout,
    elapsed: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl TimeSeries {
    pub fn new(layout: RecordLayout) -> Self {
        Self {
            layout,
            elapsed: Vec::new(),
            columns: vec![Vec::new(); layout.value_count()],
        }
    }

    pub fn push(&mut self, record: &SampleRecord) {
        debug_assert_eq!(record.layout(), self.layout);
        self.elapsed.push(record.elapsed_secs);
        for (column, value) in self.columns.iter_mut().zip(record.values()) {
            column.push(*value);
        }
    }

    pub fn len(&self) -> usize {
        self.elapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elapsed.is_empty()
    }

    pub fn layout(&self) -> RecordLayout {
        self.layout
    }

    pub fn elapsed(&self) -> &[f64] {
        &self.elapsed
    }

    /// History of one channel of a family (`channel` is 0-based).
    pub fn channel(&self, family: Family, channel: usize) -> Option<&[f64]> {
        if channel >= self.layout.width(family) {
            return None;
        }
        let index = self.layout.offset(family) + channel;
        self.columns.get(index).map(Vec::as_slice)
    }

    /// `(elapsed, value)` pairs for one channel, skipping NaN gaps.
    pub fn points(&self, family: Family, channel: usize) -> Vec<(f64, f64)> {
        self.channel(family, channel)
            .map(|values| {
                self.elapsed
                    .iter()
                    .zip(values)
                    .filter(|(_, v)| !v.is_nan())
                    .map(|(t, v)| (*t, *v))
                    .collect()
            })
            .unwrap_or_default()
    }
}
