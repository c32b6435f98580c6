//! Scrape pipeline: wires the fetch stages, the detail worker pool, ranking
//! and export together.
//!
//! Entry points:
//! - `run_pipeline()`: the full run against any `PageSource`. Used by the CLI
//!   with an `HttpSource` and by tests with a `FixtureSource`.
//! - `fetch_rate()`: the rate stage alone, for `stonks rate`.
//!
//! Only two failures abort a run: no conversion rate, and a snapshot that
//! cannot be written. Everything per page or per company is logged, counted
//! and skipped.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use thiserror::Error;

use stonks_core::domain::{ConversionRate, EntityRecord, EntityReference};
use stonks_core::scrape::{
    DetailFailure, DetailFetcher, ListingError, ListingFetcher, ParsedDetail, RateError,
    RateFetcher,
};
use stonks_core::source::{CircuitBreaker, FetchError, HttpSource, PageSource};

use crate::config::{ConfigError, ScrapeConfig};
use crate::export::{persist_views, ExportError};
use crate::progress::ScrapeProgress;
use crate::ranking::rank_all;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("page source error: {0}")]
    Source(#[from] FetchError),
    #[error("conversion rate unavailable: {0}")]
    Rate(#[from] RateError),
    #[error("listing error: {0}")]
    Listing(#[from] ListingError),
    #[error("failed to start detail workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("export error: {0}")]
    Export(#[from] ExportError),
}

/// What one run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub rate: ConversionRate,
    pub pages_fetched: usize,
    pub pages_failed: usize,
    /// References found across all listing pages.
    pub references: usize,
    /// Records that made it into the rankings.
    pub records: usize,
    /// References whose detail page produced no record.
    pub dropped: usize,
    /// Fields that fell back to a default, summed over kept records.
    pub anomalies: usize,
    pub written: Vec<PathBuf>,
}

/// References gathered from the listing pages, in listing order.
#[derive(Debug, Clone, Default)]
pub struct ListingHarvest {
    pub references: Vec<EntityReference>,
    pub pages_fetched: usize,
    pub pages_failed: usize,
}

/// Records gathered from the detail pages, in listing order.
#[derive(Debug, Clone, Default)]
pub struct DetailBatch {
    pub records: Vec<EntityRecord>,
    pub dropped: usize,
    pub anomalies: usize,
}

/// Build the production page source: blocking HTTP behind a circuit breaker.
pub fn http_source(config: &ScrapeConfig) -> Result<HttpSource, RunError> {
    let breaker = Arc::new(CircuitBreaker::default_site());
    Ok(HttpSource::new(&config.http_options(), breaker)?)
}

pub fn fetch_rate(
    config: &ScrapeConfig,
    source: &dyn PageSource,
) -> Result<ConversionRate, RunError> {
    Ok(RateFetcher::new(source, &config.rate_url, &config.currency_id).fetch()?)
}

/// Walk listing pages `1..=pages` in order. A page that cannot be fetched is
/// reported and skipped.
pub fn collect_references(
    listing: &ListingFetcher<'_>,
    pages: u32,
    progress: &dyn ScrapeProgress,
) -> ListingHarvest {
    let mut harvest = ListingHarvest::default();

    for page in 1..=pages {
        match listing.fetch_page(page) {
            Ok(listing_page) => {
                let before = harvest.references.len();
                harvest.references.extend(listing_page.references());
                let found = harvest.references.len() - before;
                harvest.pages_fetched += 1;
                progress.on_page(page, Ok(found));
            }
            Err(e) => {
                tracing::warn!(page, "listing page skipped: {e}");
                harvest.pages_failed += 1;
                progress.on_page(page, Err(&e));
            }
        }
    }

    harvest
}

/// Fetch and parse every detail page on a pool of `max_in_flight` workers.
///
/// Each worker blocks on its request, so the pool size is the bound on
/// concurrent requests. Results come back in `references` order regardless
/// of completion order.
pub fn fetch_details(
    source: &dyn PageSource,
    rate: &ConversionRate,
    references: &[EntityReference],
    max_in_flight: usize,
    progress: &dyn ScrapeProgress,
) -> Result<DetailBatch, RunError> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_in_flight.max(1))
        .thread_name(|i| format!("detail-{i}"))
        .build()?;

    let fetcher = DetailFetcher::new(source, rate);
    let total = references.len();
    let done = AtomicUsize::new(0);

    let outcomes: Vec<Result<ParsedDetail, DetailFailure>> = pool.install(|| {
        references
            .par_iter()
            .map(|reference| {
                let outcome = fetcher.fetch(reference);
                let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                progress.on_detail(
                    &reference.code,
                    n,
                    total,
                    outcome.as_ref().map(|parsed| &parsed.record),
                );
                outcome
            })
            .collect()
    });

    let mut batch = DetailBatch::default();
    for outcome in outcomes {
        match outcome {
            Ok(parsed) => {
                batch.anomalies += parsed.anomalies.len();
                batch.records.push(parsed.record);
            }
            Err(_) => batch.dropped += 1,
        }
    }
    Ok(batch)
}

/// Run the whole scrape and write the four snapshots to `config.output_dir`.
pub fn run_pipeline(
    config: &ScrapeConfig,
    source: &dyn PageSource,
    progress: &dyn ScrapeProgress,
) -> Result<RunSummary, RunError> {
    config.validate()?;
    tracing::info!(
        source = source.name(),
        pages = config.pages,
        max_in_flight = config.max_in_flight,
        "starting scrape"
    );

    let rate = fetch_rate(config, source)?;

    let listing = ListingFetcher::new(source, &config.base_url, config.listing_path.as_str())?;
    let harvest = collect_references(&listing, config.pages, progress);
    tracing::info!(
        references = harvest.references.len(),
        pages_failed = harvest.pages_failed,
        "listing complete"
    );

    let batch = fetch_details(
        source,
        &rate,
        &harvest.references,
        config.max_in_flight,
        progress,
    )?;
    tracing::info!(
        records = batch.records.len(),
        dropped = batch.dropped,
        anomalies = batch.anomalies,
        "detail pages complete"
    );

    let views = rank_all(&batch.records, config.top_n);
    let written = persist_views(&config.output_dir, &views)?;

    let summary = RunSummary {
        rate,
        pages_fetched: harvest.pages_fetched,
        pages_failed: harvest.pages_failed,
        references: harvest.references.len(),
        records: batch.records.len(),
        dropped: batch.dropped,
        anomalies: batch.anomalies,
        written,
    };
    progress.on_run_complete(&summary);
    Ok(summary)
}
