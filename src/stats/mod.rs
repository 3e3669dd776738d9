//! Statistics module - Rankings, growth rates and descriptive statistics

mod analyzer;

pub use analyzer::{Analyzer, AnalyzerError, CountryAggregate, StatColumn, StatisticsSummary};
