//! Data Processor Module
//! Handles data cleaning and filtering (raw Dataset -> CleanedTable).

use crate::data::{CleanedTable, Dataset, Record, SUPPORTED_YEARS};
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{info, warn};

/// Accepted header names for each mandatory column, first match wins.
pub const COUNTRY_COLUMNS: &[&str] = &["Country Name", "Country", "country", "geo", "GEO"];
pub const YEAR_COLUMNS: &[&str] = &["Year", "year", "TIME_PERIOD", "time"];
pub const VALUE_COLUMNS: &[&str] = &["Value", "value", "Population", "population", "OBS_VALUE"];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required {role} column (expected one of: {expected})")]
    DataFormat { role: &'static str, expected: String },
    #[error("Invalid year range: start {start} is after end {end}")]
    InvalidRange { start: i32, end: i32 },
}

/// Rows removed by [`DataProcessor::clean`], by reason.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CleanCounts {
    missing: usize,
    out_of_range: usize,
    invalid_population: usize,
    duplicates: usize,
}

/// Handles data cleaning and filtering operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Turn a raw dataset into a cleaned table.
    ///
    /// Rows with a missing country, year or population are dropped, as are
    /// rows with a negative population or a year outside [`SUPPORTED_YEARS`].
    /// Fractional populations are rounded. For duplicate (country, year)
    /// pairs the first occurrence is kept.
    pub fn clean(dataset: &Dataset) -> Result<CleanedTable, ProcessorError> {
        let df = dataset.frame();
        let country_col = Self::resolve_column(df, COUNTRY_COLUMNS, "country")?;
        let year_col = Self::resolve_column(df, YEAR_COLUMNS, "year")?;
        let value_col = Self::resolve_column(df, VALUE_COLUMNS, "population")?;

        let country_series = df.column(country_col)?.cast(&DataType::String)?;
        let country_ca = country_series.str()?;
        let year_series = df.column(year_col)?.cast(&DataType::Int64)?;
        let year_ca = year_series.i64()?;
        let value_series = df.column(value_col)?.cast(&DataType::Float64)?;
        let value_ca = value_series.f64()?;

        let mut counts = CleanCounts::default();
        let mut records: Vec<Record> = Vec::with_capacity(df.height());

        for i in 0..df.height() {
            let (Some(country), Some(year), Some(value)) =
                (country_ca.get(i), year_ca.get(i), value_ca.get(i))
            else {
                counts.missing += 1;
                continue;
            };

            let country = country.trim();
            if country.is_empty() {
                counts.missing += 1;
                continue;
            }

            let Some(year) = i32::try_from(year).ok().filter(|y| SUPPORTED_YEARS.contains(y))
            else {
                counts.out_of_range += 1;
                continue;
            };

            if !value.is_finite() || value < 0.0 {
                counts.invalid_population += 1;
                continue;
            }

            records.push(Record::new(country, year, value.round() as u64));
        }

        let kept_before_dedup = records.len();
        let table = CleanedTable::from_records(records);
        counts.duplicates = kept_before_dedup - table.len();

        let removed = df.height() - table.len();
        info!(
            "Data cleaning removed {} rows (missing: {}, year out of range: {}, invalid population: {}, duplicates: {})",
            removed, counts.missing, counts.out_of_range, counts.invalid_population, counts.duplicates
        );
        info!("Final dataset size: {} rows", table.len());

        Ok(table)
    }

    /// Keep records with `start <= year <= end`.
    pub fn filter_by_year_range(
        table: &CleanedTable,
        start: i32,
        end: i32,
    ) -> Result<CleanedTable, ProcessorError> {
        if start > end {
            return Err(ProcessorError::InvalidRange { start, end });
        }

        let filtered = CleanedTable::from_records(
            table
                .records()
                .iter()
                .filter(|r| (start..=end).contains(&r.year))
                .cloned(),
        );
        info!("Filtered data by year {}..={}: {} rows", start, end, filtered.len());
        Ok(filtered)
    }

    /// Keep records for the listed countries. Names with no match are logged, not rejected.
    pub fn filter_by_countries<S: AsRef<str>>(table: &CleanedTable, countries: &[S]) -> CleanedTable {
        for name in Self::unmatched_countries(table, countries) {
            warn!("Country '{}' not found in dataset", name);
        }

        let wanted: HashSet<&str> = countries.iter().map(|c| c.as_ref()).collect();
        let filtered = CleanedTable::from_records(
            table
                .records()
                .iter()
                .filter(|r| wanted.contains(r.country.as_str()))
                .cloned(),
        );
        info!("Filtered countries: {} rows", filtered.len());
        filtered
    }

    /// Listed names that match no record in the table, in input order.
    pub fn unmatched_countries<S: AsRef<str>>(table: &CleanedTable, countries: &[S]) -> Vec<String> {
        let present: HashSet<&str> = table.records().iter().map(|r| r.country.as_str()).collect();
        countries
            .iter()
            .map(|c| c.as_ref())
            .filter(|c| !present.contains(c))
            .map(str::to_string)
            .collect()
    }

    /// Most recent record per country, ordered by country name.
    pub fn latest_per_country(table: &CleanedTable) -> CleanedTable {
        let mut latest: BTreeMap<&str, &Record> = BTreeMap::new();
        for record in table.records() {
            latest
                .entry(record.country.as_str())
                .and_modify(|current| {
                    if record.year > current.year {
                        *current = record;
                    }
                })
                .or_insert(record);
        }
        CleanedTable::from_records(latest.into_values().cloned())
    }

    fn resolve_column<'a>(
        df: &DataFrame,
        aliases: &[&'a str],
        role: &'static str,
    ) -> Result<&'a str, ProcessorError> {
        let names = df.get_column_names();
        aliases
            .iter()
            .copied()
            .find(|alias| names.iter().any(|name| name.as_str() == *alias))
            .ok_or_else(|| ProcessorError::DataFormat {
                role,
                expected: aliases.join(", "),
            })
    }
}
