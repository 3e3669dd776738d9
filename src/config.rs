//! Run configuration
//!
//! Resolved from `$POPSTATS_CONFIG`, then `popstats.toml` in the working
//! directory, then built-in defaults. Every field is optional in the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "POPSTATS_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "popstats.toml";

pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/datasets/population/master/data/population.csv";

const EUROPEAN_COUNTRIES: [&str; 30] = [
    "Austria", "Belgium", "Bulgaria", "Croatia", "Cyprus",
    "Czechia", "Denmark", "Estonia", "Finland", "France",
    "Germany", "Greece", "Hungary", "Ireland", "Italy",
    "Latvia", "Lithuania", "Luxembourg", "Malta", "Netherlands",
    "Poland", "Portugal", "Romania", "Slovak Republic", "Slovenia",
    "Spain", "Sweden", "United Kingdom", "Norway", "Switzerland",
];

const TREND_COUNTRIES: [&str; 5] = ["Germany", "France", "United Kingdom", "Italy", "Spain"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source_url: String,
    pub cache_path: PathBuf,
    pub output_dir: PathBuf,
    pub start_year: i32,
    /// Latest year in the data when unset
    pub end_year: Option<i32>,
    /// Empty list keeps every country
    pub countries: Vec<String>,
    pub trend_countries: Vec<String>,
    pub top_n: usize,
    pub chart_top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            cache_path: PathBuf::from("data/population.csv"),
            output_dir: PathBuf::from("output"),
            start_year: 2000,
            end_year: None,
            countries: EUROPEAN_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            trend_countries: TREND_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            top_n: 10,
            chart_top_n: 15,
        }
    }
}

impl Config {
    /// Resolve the configuration for this run.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.is_file() {
            return Self::from_file(local);
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = Config::from_toml(
            r#"
            start_year = 1990
            end_year = 2010
            countries = []
            output_dir = "charts"
            "#,
        )
        .unwrap();

        assert_eq!(config.start_year, 1990);
        assert_eq!(config.end_year, Some(2010));
        assert!(config.countries.is_empty());
        assert_eq!(config.output_dir, PathBuf::from("charts"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("popstats.toml");
        std::fs::write(&path, "start_year = \"soon\"").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
    }
}
