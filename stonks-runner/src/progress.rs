//! Progress callbacks for a scrape run.
//!
//! Structured logs go through `tracing`; these callbacks are the short
//! human-facing lines the CLI prints while a run is going.

use stonks_core::domain::EntityRecord;
use stonks_core::scrape::{DetailFailure, ListingError};

use crate::runner::RunSummary;

/// Called from the detail worker pool, so implementations must be `Sync`.
pub trait ScrapeProgress: Send + Sync {
    /// A listing page finished; `Ok` carries the number of references found.
    fn on_page(&self, page: u32, result: Result<usize, &ListingError>);

    /// One detail page finished. `done` counts completions, not listing position.
    fn on_detail(
        &self,
        code: &str,
        done: usize,
        total: usize,
        result: Result<&EntityRecord, &DetailFailure>,
    );

    /// Called once after the snapshots are written.
    fn on_run_complete(&self, summary: &RunSummary);
}

/// Prints one line per event to stdout.
pub struct StdoutProgress;

impl ScrapeProgress for StdoutProgress {
    fn on_page(&self, page: u32, result: Result<usize, &ListingError>) {
        match result {
            Ok(count) => println!("Listing page {page}: {count} companies"),
            Err(e) => println!("Listing page {page}: FAIL: {e}"),
        }
    }

    fn on_detail(
        &self,
        code: &str,
        done: usize,
        total: usize,
        result: Result<&EntityRecord, &DetailFailure>,
    ) {
        match result {
            Ok(record) => println!("[{done}/{total}] OK: {} ({})", record.name, record.code),
            Err(e) => println!("[{done}/{total}] SKIP: {code}: {e}"),
        }
    }

    fn on_run_complete(&self, summary: &RunSummary) {
        println!(
            "\nScrape complete: {}/{} records, {} dropped, {} anomalies, {} listing pages failed",
            summary.records,
            summary.references,
            summary.dropped,
            summary.anomalies,
            summary.pages_failed
        );
        for path in &summary.written {
            println!("  wrote {}", path.display());
        }
    }
}

/// Discards every event.
pub struct NoProgress;

impl ScrapeProgress for NoProgress {
    fn on_page(&self, _page: u32, _result: Result<usize, &ListingError>) {}

    fn on_detail(
        &self,
        _code: &str,
        _done: usize,
        _total: usize,
        _result: Result<&EntityRecord, &DetailFailure>,
    ) {
    }

    fn on_run_complete(&self, _summary: &RunSummary) {}
}
