//! Statistics Analyzer Module
//! Rankings, growth rates and descriptive statistics over a cleaned table.

use crate::data::{CleanedTable, Record};
use serde::Serialize;
use statrs::statistics::Statistics;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AnalyzerError {
    #[error("No data for year {0}")]
    NoData(i32),
    #[error("No record for {country} in {year}")]
    MissingData { country: String, year: i32 },
    #[error("Cannot compute statistics on an empty dataset")]
    EmptyDataset,
    #[error("Growth rate undefined for {country}: population in {year} is zero")]
    DivisionByZero { country: String, year: i32 },
}

/// Numeric column of a cleaned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatColumn {
    Population,
    Year,
}

impl StatColumn {
    pub fn label(self) -> &'static str {
        match self {
            StatColumn::Population => "Population",
            StatColumn::Year => "Year",
        }
    }
}

/// Descriptive statistics for one column.
///
/// `std_dev` is the population standard deviation (divisor `n`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSummary {
    pub column: StatColumn,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Per-country aggregate across all years in the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountryAggregate {
    pub country: String,
    pub years: usize,
    pub min: u64,
    pub mean: f64,
    pub max: u64,
    pub total: u64,
}

/// Year-over-year change for one country; `change_pct` is `None` for the
/// first year and after a zero population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyGrowth {
    pub year: i32,
    pub population: u64,
    pub change_pct: Option<f64>,
}

/// Stateless statistics over [`CleanedTable`]s.
pub struct Analyzer;

impl Analyzer {
    /// Top `n` countries for `year`, by population descending then name ascending.
    pub fn top_countries(
        table: &CleanedTable,
        n: usize,
        year: i32,
    ) -> Result<Vec<(String, u64)>, AnalyzerError> {
        let in_year: Vec<&Record> = table.records().iter().filter(|r| r.year == year).collect();
        if in_year.is_empty() {
            return Err(AnalyzerError::NoData(year));
        }
        Ok(Self::rank(in_year, n))
    }

    /// Rank records by population descending, ties by country name ascending.
    pub fn rank<'a>(records: impl IntoIterator<Item = &'a Record>, n: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<&Record> = records.into_iter().collect();
        ranked.sort_by(|a, b| {
            Reverse(a.population)
                .cmp(&Reverse(b.population))
                .then_with(|| a.country.cmp(&b.country))
        });
        ranked
            .into_iter()
            .take(n)
            .map(|r| (r.country.clone(), r.population))
            .collect()
    }

    /// Fractional change `(pop(end) - pop(start)) / pop(start)`.
    pub fn growth_rate(
        table: &CleanedTable,
        country: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<f64, AnalyzerError> {
        let lookup = |year: i32| {
            table
                .population(country, year)
                .ok_or_else(|| AnalyzerError::MissingData {
                    country: country.to_string(),
                    year,
                })
        };
        let start = lookup(start_year)?;
        let end = lookup(end_year)?;

        if start == 0 {
            return Err(AnalyzerError::DivisionByZero {
                country: country.to_string(),
                year: start_year,
            });
        }

        Ok((end as f64 - start as f64) / start as f64)
    }

    /// Mean, median, population std dev, min and max of a column.
    pub fn describe(table: &CleanedTable, column: StatColumn) -> Result<StatisticsSummary, AnalyzerError> {
        let values: Vec<f64> = match column {
            StatColumn::Population => table.population_values(),
            StatColumn::Year => table.records().iter().map(|r| f64::from(r.year)).collect(),
        };
        if values.is_empty() {
            return Err(AnalyzerError::EmptyDataset);
        }

        Ok(StatisticsSummary {
            column,
            count: values.len(),
            mean: Statistics::mean(&values),
            median: Self::median(&values),
            std_dev: Statistics::population_std_dev(&values),
            min: Statistics::min(&values),
            max: Statistics::max(&values),
        })
    }

    /// Min/mean/max/total per country, ordered by country name.
    pub fn describe_by_country(table: &CleanedTable) -> Vec<CountryAggregate> {
        let mut by_country: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
        for record in table.records() {
            by_country
                .entry(record.country.as_str())
                .or_default()
                .push(record.population);
        }

        by_country
            .into_iter()
            .map(|(country, values)| {
                let total: u64 = values.iter().sum();
                CountryAggregate {
                    country: country.to_string(),
                    years: values.len(),
                    min: values.iter().copied().min().unwrap_or(0),
                    mean: total as f64 / values.len() as f64,
                    max: values.iter().copied().max().unwrap_or(0),
                    total,
                }
            })
            .collect()
    }

    /// Countries with the largest mean population, largest first.
    pub fn top_by_mean(table: &CleanedTable, n: usize) -> Vec<CountryAggregate> {
        let mut aggregates = Self::describe_by_country(table);
        aggregates.sort_by(|a, b| {
            b.mean
                .total_cmp(&a.mean)
                .then_with(|| a.country.cmp(&b.country))
        });
        aggregates.truncate(n);
        aggregates
    }

    /// Year-over-year percentage change for one country.
    pub fn yearly_growth(table: &CleanedTable, country: &str) -> Vec<YearlyGrowth> {
        let series = table.series(country);
        let mut previous: Option<u64> = None;

        series
            .into_iter()
            .map(|(year, population)| {
                let change_pct = previous
                    .filter(|&prev| prev > 0)
                    .map(|prev| (population as f64 - prev as f64) / prev as f64 * 100.0);
                previous = Some(population);
                YearlyGrowth {
                    year,
                    population,
                    change_pct,
                }
            })
            .collect()
    }

    fn median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn table() -> CleanedTable {
        CleanedTable::from_records(vec![
            Record::new("DE", 2020, 83_000_000),
            Record::new("DE", 2021, 83_100_000),
            Record::new("FR", 2020, 67_000_000),
            Record::new("FR", 2021, 67_000_000),
            Record::new("AT", 2021, 67_000_000),
            Record::new("ZZ", 2020, 0),
            Record::new("ZZ", 2021, 10),
        ])
    }

    fn values_table(values: &[u64]) -> CleanedTable {
        CleanedTable::from_records(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| Record::new("X", 2000 + i as i32, v)),
        )
    }

    #[test]
    fn top_countries_sorts_desc_with_name_tiebreak() {
        let top = Analyzer::top_countries(&table(), 3, 2021).unwrap();
        assert_eq!(
            top,
            vec![
                ("DE".to_string(), 83_100_000),
                ("AT".to_string(), 67_000_000),
                ("FR".to_string(), 67_000_000),
            ]
        );
    }

    #[test]
    fn top_countries_returns_at_most_n() {
        assert_eq!(Analyzer::top_countries(&table(), 1, 2020).unwrap().len(), 1);
        assert_eq!(Analyzer::top_countries(&table(), 50, 2020).unwrap().len(), 3);
    }

    #[test]
    fn top_countries_missing_year_is_no_data() {
        assert_eq!(
            Analyzer::top_countries(&table(), 5, 1999),
            Err(AnalyzerError::NoData(1999))
        );
    }

    #[test]
    fn growth_rate_matches_expected_fraction() {
        let rate = Analyzer::growth_rate(&table(), "DE", 2020, 2021).unwrap();
        assert!((rate - 0.001_204_819).abs() < 1e-6);
    }

    #[test]
    fn growth_rate_same_year_is_zero() {
        for record in table().records().iter().filter(|r| r.population > 0) {
            let rate = Analyzer::growth_rate(&table(), &record.country, record.year, record.year).unwrap();
            assert_eq!(rate, 0.0);
        }
    }

    #[test]
    fn growth_rate_errors() {
        assert_eq!(
            Analyzer::growth_rate(&table(), "ZZ", 2020, 2021),
            Err(AnalyzerError::DivisionByZero {
                country: "ZZ".to_string(),
                year: 2020
            })
        );
        assert_eq!(
            Analyzer::growth_rate(&table(), "AT", 2020, 2021),
            Err(AnalyzerError::MissingData {
                country: "AT".to_string(),
                year: 2020
            })
        );
    }

    #[test]
    fn describe_population() {
        let summary = Analyzer::describe(&values_table(&[10, 20, 30]), StatColumn::Population).unwrap();
        assert_eq!(summary.count, 3);
        assert!((summary.mean - 20.0).abs() < EPS);
        assert!((summary.median - 20.0).abs() < EPS);
        assert!((summary.min - 10.0).abs() < EPS);
        assert!((summary.max - 30.0).abs() < EPS);
        assert!((summary.std_dev - (200.0f64 / 3.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn describe_even_count_median_and_year_column() {
        let summary = Analyzer::describe(&values_table(&[4, 1, 3, 2]), StatColumn::Population).unwrap();
        assert!((summary.median - 2.5).abs() < EPS);

        let years = Analyzer::describe(&values_table(&[4, 1, 3]), StatColumn::Year).unwrap();
        assert!((years.min - 2000.0).abs() < EPS);
        assert!((years.max - 2002.0).abs() < EPS);
    }

    #[test]
    fn describe_empty_table_fails() {
        assert_eq!(
            Analyzer::describe(&CleanedTable::default(), StatColumn::Population),
            Err(AnalyzerError::EmptyDataset)
        );
    }

    #[test]
    fn country_aggregates_and_mean_ranking() {
        let aggregates = Analyzer::describe_by_country(&table());
        let de = aggregates.iter().find(|a| a.country == "DE").unwrap();
        assert_eq!(de.years, 2);
        assert_eq!(de.min, 83_000_000);
        assert_eq!(de.max, 83_100_000);
        assert_eq!(de.total, 166_100_000);
        assert!((de.mean - 83_050_000.0).abs() < EPS);

        let top: Vec<String> = Analyzer::top_by_mean(&table(), 2)
            .into_iter()
            .map(|a| a.country)
            .collect();
        assert_eq!(top, vec!["DE".to_string(), "AT".to_string()]);
    }

    #[test]
    fn yearly_growth_skips_first_and_zero_baseline() {
        let growth = Analyzer::yearly_growth(&table(), "ZZ");
        assert_eq!(growth.len(), 2);
        assert_eq!(growth[0].change_pct, None);
        assert_eq!(growth[1].change_pct, None);

        let de = Analyzer::yearly_growth(&table(), "DE");
        let pct = de[1].change_pct.unwrap();
        assert!((pct - 0.120_481_9).abs() < 1e-6);
    }
}
