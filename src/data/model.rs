//! Population Data Model
//! Raw dataset wrapper and the cleaned record table shared by all stages.

use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::ops::RangeInclusive;

/// Years accepted in a cleaned table (four-digit calendar years).
pub const SUPPORTED_YEARS: RangeInclusive<i32> = 1000..=9999;

/// One complete (country, year, population) observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub country: String,
    pub year: i32,
    pub population: u64,
}

impl Record {
    pub fn new(country: impl Into<String>, year: i32, population: u64) -> Self {
        Self {
            country: country.into(),
            year,
            population,
        }
    }
}

/// Raw table as loaded, before any cleaning.
///
/// May contain missing values, duplicate (country, year) pairs and columns
/// the pipeline never reads.
#[derive(Debug, Clone)]
pub struct Dataset {
    df: DataFrame,
}

impl Dataset {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    /// Get a reference to the underlying DataFrame.
    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn row_count(&self) -> usize {
        self.df.height()
    }

    pub fn column_count(&self) -> usize {
        self.df.width()
    }

    /// Get list of column names.
    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    /// First `n` rows, for the dataset information log.
    pub fn preview(&self, n: usize) -> DataFrame {
        self.df.head(Some(n))
    }
}

/// Deduplicated, missing-value-free record set.
///
/// Every record carries a population and each (country, year) pair occurs
/// at most once. Construction keeps the first occurrence of a duplicate pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanedTable {
    records: Vec<Record>,
}

impl CleanedTable {
    /// Build a table from records, dropping later duplicates of a (country, year) pair.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut seen: HashSet<(String, i32)> = HashSet::new();
        let records = records
            .into_iter()
            .filter(|r| seen.insert((r.country.clone(), r.year)))
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted unique country names.
    pub fn countries(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.country.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted unique years.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest year present, `None` for an empty table.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let min = self.records.iter().map(|r| r.year).min()?;
        let max = self.records.iter().map(|r| r.year).max()?;
        Some((min, max))
    }

    pub fn contains_country(&self, country: &str) -> bool {
        self.records.iter().any(|r| r.country == country)
    }

    /// Population for one (country, year) pair.
    pub fn population(&self, country: &str, year: i32) -> Option<u64> {
        self.records
            .iter()
            .find(|r| r.country == country && r.year == year)
            .map(|r| r.population)
    }

    /// Year-ordered (year, population) points for one country.
    pub fn series(&self, country: &str) -> Vec<(i32, u64)> {
        let mut points: Vec<(i32, u64)> = self
            .records
            .iter()
            .filter(|r| r.country == country)
            .map(|r| (r.year, r.population))
            .collect();
        points.sort_by_key(|&(year, _)| year);
        points
    }

    /// All population values as floats, in table order.
    pub fn population_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.population as f64).collect()
    }
}
