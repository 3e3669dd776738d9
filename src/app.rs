//! Population analysis pipeline
//! Loader -> Processor -> Analyzer -> {charts, report}.

use crate::charts::{
    ChartRenderer, COMPARISON_FILE, DISTRIBUTION_FILE, TOP_COUNTRIES_FILE, TRENDS_FILE,
};
use crate::config::Config;
use crate::data::{CleanedTable, DataLoader, DataProcessor};
use crate::report::{AnalysisReport, CountryGrowth, ReportGenerator, REPORT_FILE, SUMMARY_FILE};
use crate::stats::{Analyzer, AnalyzerError, StatColumn};
use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

const REPORT_TITLE: &str = "European Population Analysis Report";
const COMPARISON_COUNTRIES: usize = 10;
const DEFAULT_TREND_COUNTRIES: usize = 5;

/// Run the whole pipeline and return the generated report.
pub fn run(config: &Config) -> Result<AnalysisReport> {
    // Step 1: Load
    let loader = DataLoader::new(config.source_url.clone(), config.cache_path.clone());
    let dataset = loader.load().context("Failed to load population dataset")?;
    debug!("Columns: {:?}", dataset.column_names());
    debug!("First rows:\n{}", dataset.preview(5));

    // Step 2: Process
    let table = prepare_table(&DataProcessor::clean(&dataset)?, config)?;
    if table.is_empty() {
        warn!("No records left after filtering");
    }
    info!(
        "Analysis table: {} records, {} countries, {} years",
        table.len(),
        table.countries().len(),
        table.years().len()
    );

    // Step 3: Analyze
    let report = analyze(&table, config)?;

    // Step 4: Visualize
    render_charts(&table, config)?;

    // Step 5: Report
    ReportGenerator::write_text(&report, &config.output_dir.join(REPORT_FILE))
        .context("Failed to write text report")?;
    ReportGenerator::write_json(&report, &config.output_dir.join(SUMMARY_FILE))
        .context("Failed to write JSON summary")?;
    info!("Report written to {}", config.output_dir.display());

    Ok(report)
}

/// Restrict a cleaned table to the configured years and countries.
pub fn prepare_table(cleaned: &CleanedTable, config: &Config) -> Result<CleanedTable> {
    let end_year = config
        .end_year
        .or_else(|| cleaned.year_span().map(|(_, last)| last.max(config.start_year)))
        .unwrap_or(config.start_year);

    let by_year = DataProcessor::filter_by_year_range(cleaned, config.start_year, end_year)
        .context("Invalid year range in configuration")?;

    if config.countries.is_empty() {
        Ok(by_year)
    } else {
        Ok(DataProcessor::filter_by_countries(&by_year, &config.countries))
    }
}

/// Compute the report figures. An empty table is an error.
pub fn analyze(table: &CleanedTable, config: &Config) -> Result<AnalysisReport, AnalyzerError> {
    let statistics = vec![
        Analyzer::describe(table, StatColumn::Population)?,
        Analyzer::describe(table, StatColumn::Year)?,
    ];
    let year_span = table.year_span().ok_or(AnalyzerError::EmptyDataset)?;
    let top_year = year_span.1;
    let top_countries = Analyzer::top_countries(table, config.top_n, top_year)?;

    let growth = top_countries
        .iter()
        .filter_map(|(country, _)| {
            let series = table.series(country);
            let (start_year, end_year) = (series.first()?.0, series.last()?.0);
            Some((country, start_year, end_year))
        })
        .map(|(country, start_year, end_year)| -> Result<CountryGrowth, AnalyzerError> {
            let latest_change_pct = Analyzer::yearly_growth(table, country)
                .last()
                .and_then(|g| g.change_pct);
            Ok(CountryGrowth {
                country: country.clone(),
                start_year,
                end_year,
                rate: Analyzer::growth_rate(table, country, start_year, end_year)?,
                latest_change_pct,
            })
        })
        .collect::<Result<Vec<_>, AnalyzerError>>()?;

    Ok(AnalysisReport {
        title: REPORT_TITLE.to_string(),
        generated_at: Local::now(),
        records: table.len(),
        year_span,
        statistics,
        top_year,
        top_countries,
        growth,
    })
}

/// Trend selection: configured countries present in the table, else the largest by mean.
pub fn trend_countries(table: &CleanedTable, config: &Config) -> Vec<String> {
    let available: Vec<String> = config
        .trend_countries
        .iter()
        .filter(|c| table.contains_country(c))
        .cloned()
        .collect();

    if available.is_empty() {
        Analyzer::top_by_mean(table, DEFAULT_TREND_COUNTRIES)
            .into_iter()
            .map(|a| a.country)
            .collect()
    } else {
        available
    }
}

fn render_charts(table: &CleanedTable, config: &Config) -> Result<()> {
    let out = &config.output_dir;
    ChartRenderer::prepare_output_dir(out)
        .with_context(|| format!("Failed to create output directory {}", out.display()))?;

    let latest = DataProcessor::latest_per_country(table);
    let top = Analyzer::rank(latest.records(), config.chart_top_n);
    let title = format!("Top {} Countries by Population", top.len());
    ChartRenderer::render_top_countries(&top, &title, &out.join(TOP_COUNTRIES_FILE))
        .context("Failed to render top countries chart")?;

    let series: Vec<(String, Vec<(i32, u64)>)> = trend_countries(table, config)
        .into_iter()
        .map(|country| {
            let points = table.series(&country);
            (country, points)
        })
        .collect();
    ChartRenderer::render_trends(&series, &out.join(TRENDS_FILE))
        .context("Failed to render trend chart")?;

    ChartRenderer::render_distribution(&table.population_values(), &out.join(DISTRIBUTION_FILE))
        .context("Failed to render distribution chart")?;

    let comparison = Analyzer::top_by_mean(table, COMPARISON_COUNTRIES);
    ChartRenderer::render_comparison(&comparison, &out.join(COMPARISON_FILE))
        .context("Failed to render comparison chart")?;

    Ok(())
}
