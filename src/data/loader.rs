//! CSV Data Loader Module
//! Fetches the population CSV (network or local cache) and reads it using Polars.

use crate::data::Dataset;
use polars::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to download dataset: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("CSV file {0} has no rows or no columns")]
    EmptyFile(PathBuf),
}

/// Loads the raw dataset, downloading it once into an on-disk cache.
pub struct DataLoader {
    source_url: String,
    cache_path: PathBuf,
}

impl DataLoader {
    pub fn new(source_url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into(),
            cache_path: cache_path.into(),
        }
    }

    /// Load the dataset, fetching it first when the cache is missing or empty.
    pub fn load(&self) -> Result<Dataset, LoaderError> {
        if self.cache_is_usable() {
            info!("Loading data from cache: {}", self.cache_path.display());
        } else {
            self.download()?;
        }

        let dataset = Self::load_csv(&self.cache_path)?;
        info!(
            "Data loaded successfully. Shape: ({}, {})",
            dataset.row_count(),
            dataset.column_count()
        );
        Ok(dataset)
    }

    /// Read a CSV file into a [`Dataset`], validating it has rows and columns.
    pub fn load_csv(path: &Path) -> Result<Dataset, LoaderError> {
        // Malformed cells become nulls and are dropped during cleaning
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        if df.width() == 0 || df.height() == 0 {
            return Err(LoaderError::EmptyFile(path.to_path_buf()));
        }

        Ok(Dataset::new(df))
    }

    fn cache_is_usable(&self) -> bool {
        fs::metadata(&self.cache_path)
            .map(|meta| meta.is_file() && meta.len() > 0)
            .unwrap_or(false)
    }

    fn download(&self) -> Result<(), LoaderError> {
        info!("Loading data from: {}", self.source_url);
        let response = reqwest::blocking::get(&self.source_url)?.error_for_status()?;
        let body = response.bytes()?;
        debug!("Downloaded {} bytes", body.len());

        Self::store_cache(&self.cache_path, &body)?;
        info!("Cached dataset at {}", self.cache_path.display());
        Ok(())
    }

    /// Write to a sibling `.part` file, then rename, so an interrupted
    /// write never leaves a truncated cache behind.
    fn store_cache(path: &Path, body: &[u8]) -> Result<(), LoaderError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let partial = Self::partial_path(path);
        if let Err(err) = fs::write(&partial, body) {
            let _ = fs::remove_file(&partial);
            return Err(err.into());
        }
        fs::rename(&partial, path)?;
        Ok(())
    }

    fn partial_path(path: &Path) -> PathBuf {
        let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".part");
        path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Country Name,Country Code,Year,Value\n\
        Germany,DEU,2020,83160871\n\
        Germany,DEU,2021,83196078\n\
        France,FRA,2020,67571107\n";

    #[test]
    fn load_reads_existing_cache_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.csv");
        fs::write(&path, SAMPLE).unwrap();

        // Unroutable URL: any fetch attempt would fail the test
        let loader = DataLoader::new("http://127.0.0.1:9/unused.csv", &path);
        let dataset = loader.load().unwrap();

        assert_eq!(dataset.row_count(), 3);
        assert_eq!(dataset.column_count(), 4);
        assert_eq!(
            dataset.column_names(),
            vec!["Country Name", "Country Code", "Year", "Value"]
        );
        assert_eq!(dataset.preview(2).height(), 2);
    }

    #[test]
    fn missing_cache_and_unreachable_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loader = DataLoader::new("http://127.0.0.1:9/unused.csv", dir.path().join("absent.csv"));
        assert!(matches!(loader.load(), Err(LoaderError::Http(_))));
    }

    #[test]
    fn store_cache_replaces_file_and_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("population.csv");

        DataLoader::store_cache(&path, b"old").unwrap();
        DataLoader::store_cache(&path, SAMPLE.as_bytes()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        assert!(!DataLoader::partial_path(&path).exists());
        assert_eq!(
            DataLoader::partial_path(&path).file_name().and_then(|n| n.to_str()),
            Some("population.csv.part")
        );
        assert_eq!(DataLoader::load_csv(&path).unwrap().row_count(), 3);
    }
}
