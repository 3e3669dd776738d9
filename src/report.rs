//! Report Generator Module
//! Formats analysis results as a plain-text report and a JSON summary.

use crate::stats::StatisticsSummary;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const REPORT_FILE: &str = "report.txt";
pub const SUMMARY_FILE: &str = "summary.json";

const RULE_WIDTH: usize = 60;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Growth of one country between its first and last year in the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryGrowth {
    pub country: String,
    pub start_year: i32,
    pub end_year: i32,
    pub rate: f64,
    /// Change over the final year, in percent
    pub latest_change_pct: Option<f64>,
}

/// Everything the report shows, computed before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub records: usize,
    pub year_span: (i32, i32),
    pub statistics: Vec<StatisticsSummary>,
    pub top_year: i32,
    pub top_countries: Vec<(String, u64)>,
    pub growth: Vec<CountryGrowth>,
}

pub struct ReportGenerator;

impl ReportGenerator {
    /// Render the text report.
    pub fn render(report: &AnalysisReport) -> String {
        let rule = "=".repeat(RULE_WIDTH);
        let mut out = String::new();

        // Writing into a String cannot fail
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "{}", report.title.to_uppercase());
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Generated on: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "Total records analyzed: {}", report.records);
        let _ = writeln!(out, "Years covered: {} - {}", report.year_span.0, report.year_span.1);

        let _ = writeln!(out);
        let _ = writeln!(out, "--- STATISTICAL SUMMARY ---");
        for stats in &report.statistics {
            let _ = writeln!(out);
            let _ = writeln!(out, "{}:", stats.column.label());
            let _ = writeln!(out, "  Mean: {}", format_decimal(stats.mean));
            let _ = writeln!(out, "  Median: {}", format_decimal(stats.median));
            let _ = writeln!(out, "  Std Dev: {}", format_decimal(stats.std_dev));
            let _ = writeln!(
                out,
                "  Range: {} - {}",
                format_decimal(stats.min),
                format_decimal(stats.max)
            );
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "--- TOP {} COUNTRIES BY POPULATION ({}) ---",
            report.top_countries.len(),
            report.top_year
        );
        for (rank, (country, population)) in report.top_countries.iter().enumerate() {
            let _ = writeln!(out, "{:>2}. {}: {}", rank + 1, country, group_thousands(*population));
        }

        if !report.growth.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "--- POPULATION GROWTH ---");
            for g in &report.growth {
                let _ = write!(
                    out,
                    "{}: {:+.2}% ({} - {})",
                    g.country,
                    g.rate * 100.0,
                    g.start_year,
                    g.end_year
                );
                match g.latest_change_pct {
                    Some(pct) => {
                        let _ = writeln!(out, ", last year {:+.2}%", pct);
                    }
                    None => {
                        let _ = writeln!(out);
                    }
                }
            }
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "{rule}");
        out
    }

    /// Write the text report to `path`.
    pub fn write_text(report: &AnalysisReport, path: &Path) -> Result<(), ReportError> {
        fs::write(path, Self::render(report))?;
        Ok(())
    }

    /// Write the report data as pretty-printed JSON.
    pub fn write_json(report: &AnalysisReport, path: &Path) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// `1234567` -> `1,234,567`
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two decimals with thousands separators: `1234567.891` -> `1,234,567.89`
pub fn format_decimal(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let grouped = int_part
        .parse::<u64>()
        .map(group_thousands)
        .unwrap_or_else(|_| int_part.to_string());
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::StatColumn;

    fn report() -> AnalysisReport {
        AnalysisReport {
            title: "European Population Analysis Report".to_string(),
            generated_at: Local::now(),
            records: 4,
            year_span: (2020, 2021),
            statistics: vec![
                StatisticsSummary {
                    column: StatColumn::Population,
                    count: 4,
                    mean: 75_000_000.0,
                    median: 75_050_000.0,
                    std_dev: 8_000_000.5,
                    min: 67_000_000.0,
                    max: 83_100_000.0,
                },
                StatisticsSummary {
                    column: StatColumn::Year,
                    count: 4,
                    mean: 2020.5,
                    median: 2020.5,
                    std_dev: 0.5,
                    min: 2020.0,
                    max: 2021.0,
                },
            ],
            top_year: 2021,
            top_countries: vec![
                ("Germany".to_string(), 83_100_000),
                ("France".to_string(), 67_000_000),
            ],
            growth: vec![CountryGrowth {
                country: "Germany".to_string(),
                start_year: 2020,
                end_year: 2021,
                rate: 0.001_204_8,
                latest_change_pct: Some(0.120_48),
            }],
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(83_100_000), "83,100,000");
    }

    #[test]
    fn decimal_formatting() {
        assert_eq!(format_decimal(1_234_567.891), "1,234,567.89");
        assert_eq!(format_decimal(-1_500.0), "-1,500.00");
        assert_eq!(format_decimal(0.5), "0.50");
    }

    #[test]
    fn render_contains_every_section() {
        let text = ReportGenerator::render(&report());

        assert!(text.contains("EUROPEAN POPULATION ANALYSIS REPORT"));
        assert!(text.contains("Total records analyzed: 4"));
        assert!(text.contains("  Mean: 75,000,000.00"));
        assert!(text.contains("  Range: 67,000,000.00 - 83,100,000.00"));
        assert!(text.contains("--- TOP 2 COUNTRIES BY POPULATION (2021) ---"));
        assert!(text.contains(" 1. Germany: 83,100,000"));
        assert!(text.contains("Year:\n  Mean: 2,020.50"));
        assert!(text.contains("Germany: +0.12% (2020 - 2021), last year +0.12%"));
    }

    #[test]
    fn writes_text_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let text_path = dir.path().join(REPORT_FILE);
        let json_path = dir.path().join(SUMMARY_FILE);

        ReportGenerator::write_text(&report(), &text_path).unwrap();
        ReportGenerator::write_json(&report(), &json_path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(json["records"], 4);
        assert_eq!(json["top_countries"][0][0], "Germany");
        assert_eq!(json["statistics"][0]["column"], "Population");
        assert_eq!(json["statistics"][1]["column"], "Year");
        assert!(fs::read_to_string(&text_path).unwrap().contains("POPULATION GROWTH"));
    }
}
