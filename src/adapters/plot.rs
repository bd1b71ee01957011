//! Live plot: an SVG of headspace pressure re-rendered after every cycle.
//!
//! Each vial's internal pressure plus the atmospheric reference, against
//! elapsed time.  The file is written beside the target and renamed over
//! it, so a viewer polling the file never sees a half-written plot.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use plotters::prelude::*;

use crate::app::ports::DisplayPort;
use crate::app::record::Family;
use crate::app::series::TimeSeries;

const SIZE: (u32, u32) = (1024, 600);

const PALETTE: [RGBColor; 9] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(188, 189, 34),
    RGBColor(0, 0, 0),
];

pub struct SvgPlot {
    path: PathBuf,
}

impl SvgPlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn render(&self, series: &TimeSeries) -> Result<(), Box<dyn Error>> {
        let mut lines: Vec<(String, Vec<(f64, f64)>)> = (0..series.layout().vials())
            .map(|v| {
                (
                    format!("vial {}", v + 1),
                    series.points(Family::InternalPressure, v),
                )
            })
            .collect();
        lines.push((
            "atmosphere".to_string(),
            series.points(Family::AtmosphericPressure, 0),
        ));

        let x_max = series.elapsed().last().copied().unwrap_or(0.0).max(1.0);
        let (y_min, y_max) = y_bounds(lines.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)));

        let tmp = self.path.with_extension("svg.tmp");
        {
            let root = SVGBackend::new(&tmp, SIZE).into_drawing_area();
            root.fill(&WHITE)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("Headspace pressure", ("sans-serif", 20))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(60)
                .build_cartesian_2d(0.0..x_max, y_min..y_max)?;

            chart
                .configure_mesh()
                .x_desc("elapsed (s)")
                .y_desc("pressure (hPa)")
                .draw()?;

            for (i, (label, data)) in lines.into_iter().enumerate() {
                if data.is_empty() {
                    continue;
                }
                let colour = PALETTE[i % PALETTE.len()];
                chart
                    .draw_series(LineSeries::new(data, colour.stroke_width(2)))?
                    .label(label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], colour));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;

            root.present()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl DisplayPort for SvgPlot {
    fn refresh(&mut self, series: &TimeSeries) {
        if let Err(e) = self.render(series) {
            warn!("Plot {}: render failed: {}", self.path.display(), e);
        }
    }
}

/// Padded y range over finite values, or a sea-level default when empty.
fn y_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return (1_000.0, 1_030.0);
    }
    let pad = ((hi - lo) * 0.1).max(0.5);
    (lo - pad, hi + pad)
}
