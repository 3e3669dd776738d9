//! popstats - Country Population Analysis
//!
//! Downloads (or reads from cache) a country population CSV, cleans it,
//! computes descriptive statistics and writes charts plus a text report.

mod app;
mod charts;
mod config;
mod data;
mod report;
mod stats;

use anyhow::{Context, Result};
use config::Config;
use report::ReportGenerator;
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popstats=info".into()),
        )
        .init();

    info!("Starting population data analysis");

    let config = Config::load().context("Failed to load configuration")?;
    let report = app::run(&config)?;

    print!("{}", ReportGenerator::render(&report));
    info!("Analysis completed successfully");
    Ok(())
}
