//! Static Chart Renderer
//! Generates PNG charts of the analysis results with plotters.
//!
//! Charts:
//! 1. Top countries: horizontal bars, largest at the top
//! 2. Trends: population over time, one line per country
//! 3. Distribution: 30-bin histogram of every population value
//! 4. Comparison: min / average / max bars per country

use crate::stats::CountryAggregate;
use plotters::prelude::*;
use std::fs;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

pub const TOP_COUNTRIES_FILE: &str = "top_countries.png";
pub const TRENDS_FILE: &str = "population_trends.png";
pub const DISTRIBUTION_FILE: &str = "population_distribution.png";
pub const COMPARISON_FILE: &str = "population_comparison.png";

/// Histogram bucket count
pub const HISTOGRAM_BINS: usize = 30;

const WIDE: (u32, u32) = (1400, 700);
const STANDARD: (u32, u32) = (1200, 600);
const BAR_WIDTH: f64 = 0.25;

// Colors (RGB)
const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180); // Bars, average
const LIGHT_BLUE: RGBColor = RGBColor(173, 216, 230); // Minimum
const DARK_BLUE: RGBColor = RGBColor(0, 0, 139); // Maximum
const CORAL: RGBColor = RGBColor(255, 127, 80); // Histogram fill

/// Line colors for country trends
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Render(String),
    #[error("Chart output error: {0}")]
    Io(#[from] std::io::Error),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

/// One histogram bucket: `[lower, upper)` and the number of values in it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: u32,
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Create the chart output directory if needed.
    pub fn prepare_output_dir(dir: &Path) -> Result<(), ChartError> {
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// Horizontal bar chart of `(country, population)` pairs in rank order.
    pub fn render_top_countries(
        entries: &[(String, u64)],
        title: &str,
        path: &Path,
    ) -> Result<(), ChartError> {
        if entries.is_empty() {
            warn!("No data for top countries chart, skipping");
            return Ok(());
        }

        let n = entries.len();
        let max = entries.iter().map(|(_, p)| *p).max().unwrap_or(0) as f64;
        let labels: Vec<&str> = entries.iter().map(|(c, _)| c.as_str()).collect();

        let root = BitMapBackend::new(path, STANDARD).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(170)
            .build_cartesian_2d(0f64..max * 1.05 + 1.0, Self::category_axis(n))?;

        // Rank 0 is drawn at the top
        chart
            .configure_mesh()
            .disable_y_mesh()
            .x_desc("Population")
            .y_desc("Country")
            .y_labels(n)
            .x_label_formatter(&|v: &f64| format_population(*v))
            .y_label_formatter(&|v: &f64| {
                Self::category_index(*v, n)
                    .and_then(|idx| labels.get(n - 1 - idx))
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            })
            .draw()?;

        chart.draw_series(entries.iter().enumerate().map(|(rank, (_, population))| {
            let y = (n - 1 - rank) as f64;
            Rectangle::new(
                [(0.0, y - 0.35), (*population as f64, y + 0.35)],
                STEEL_BLUE.filled(),
            )
        }))?;

        root.present()?;
        info!("Top countries chart written to {}", path.display());
        Ok(())
    }

    /// Line chart with point markers, one series per country.
    pub fn render_trends(series: &[(String, Vec<(i32, u64)>)], path: &Path) -> Result<(), ChartError> {
        let points = series.iter().flat_map(|(_, pts)| pts.iter());
        let (Some(first_year), Some(last_year), Some(max_pop)) = (
            points.clone().map(|&(y, _)| y).min(),
            points.clone().map(|&(y, _)| y).max(),
            points.map(|&(_, p)| p).max(),
        ) else {
            warn!("No data for trend chart, skipping");
            return Ok(());
        };
        let last_year = last_year.max(first_year + 1);

        let root = BitMapBackend::new(path, WIDE).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Population Trends", ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(first_year..last_year, 0f64..max_pop as f64 * 1.05 + 1.0)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Population")
            .x_labels(((last_year - first_year + 1) as usize).min(12))
            .y_label_formatter(&|v: &f64| format_population(*v))
            .draw()?;

        for (idx, (country, pts)) in series.iter().enumerate() {
            if pts.is_empty() {
                continue;
            }
            let color = PALETTE[idx % PALETTE.len()];
            let data: Vec<(i32, f64)> = pts.iter().map(|&(y, p)| (y, p as f64)).collect();

            chart
                .draw_series(LineSeries::new(data.clone(), color.stroke_width(2)))?
                .label(country.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart.draw_series(data.into_iter().map(|point| Circle::new(point, 3, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        info!("Trend chart written to {}", path.display());
        Ok(())
    }

    /// Histogram of population values.
    pub fn render_distribution(values: &[f64], path: &Path) -> Result<(), ChartError> {
        let bins = histogram_bins(values, HISTOGRAM_BINS);
        let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
            warn!("No data for distribution chart, skipping");
            return Ok(());
        };
        let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);

        let root = BitMapBackend::new(path, STANDARD).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Distribution of Population Values", ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(first.lower..last.upper, 0u32..max_count + 1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Population")
            .y_desc("Frequency")
            .x_label_formatter(&|v: &f64| format_population(*v))
            .draw()?;

        chart.draw_series(
            bins.iter()
                .map(|b| Rectangle::new([(b.lower, 0), (b.upper, b.count)], CORAL.mix(0.7).filled())),
        )?;
        chart.draw_series(
            bins.iter()
                .map(|b| Rectangle::new([(b.lower, 0), (b.upper, b.count)], BLACK.stroke_width(1))),
        )?;

        root.present()?;
        info!("Distribution chart written to {}", path.display());
        Ok(())
    }

    /// Grouped min / average / max bars per country.
    pub fn render_comparison(aggregates: &[CountryAggregate], path: &Path) -> Result<(), ChartError> {
        if aggregates.is_empty() {
            warn!("No data for comparison chart, skipping");
            return Ok(());
        }

        let n = aggregates.len();
        let max = aggregates.iter().map(|a| a.max).max().unwrap_or(0) as f64;
        let labels: Vec<&str> = aggregates.iter().map(|a| a.country.as_str()).collect();

        let root = BitMapBackend::new(path, STANDARD).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Population Comparison: Min, Avg, Max", ("sans-serif", 26))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(80)
            .build_cartesian_2d(Self::category_axis(n), 0f64..max * 1.05 + 1.0)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc("Country")
            .y_desc("Population")
            .x_labels(n)
            .x_label_style(("sans-serif", 12))
            .x_label_formatter(&|v: &f64| {
                Self::category_index(*v, n)
                    .and_then(|idx| labels.get(idx))
                    .map(|s| s.to_string())
                    .unwrap_or_default()
            })
            .y_label_formatter(&|v: &f64| format_population(*v))
            .draw()?;

        let metrics: [(&str, RGBColor, fn(&CountryAggregate) -> f64); 3] = [
            ("Minimum", LIGHT_BLUE, |a| a.min as f64),
            ("Average", STEEL_BLUE, |a| a.mean),
            ("Maximum", DARK_BLUE, |a| a.max as f64),
        ];

        for (offset, (label, color, value)) in metrics.into_iter().enumerate() {
            let shift = (offset as f64 - 1.0) * BAR_WIDTH;
            chart
                .draw_series(aggregates.iter().enumerate().map(|(i, agg)| {
                    let x = i as f64 + shift;
                    Rectangle::new(
                        [(x - BAR_WIDTH / 2.0, 0.0), (x + BAR_WIDTH / 2.0, value(agg))],
                        color.filled(),
                    )
                }))?
                .label(label)
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        info!("Comparison chart written to {}", path.display());
        Ok(())
    }

    /// Continuous axis with categories centered on integers.
    fn category_axis(n: usize) -> Range<f64> {
        -0.5f64..n as f64 - 0.5
    }

    /// Category under an axis label; labels off the integer grid stay blank.
    fn category_index(value: f64, n: usize) -> Option<usize> {
        let idx = value.round();
        ((value - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < n).then_some(idx as usize)
    }
}

/// Split values into `bins` equal-width buckets spanning min..=max.
///
/// All values equal: buckets are one unit wide starting at that value.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0u32; bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: min + i as f64 * width,
            upper: min + (i + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Compact axis label: 83.1M, 2.4B, 950K.
pub fn format_population(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.0}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}
