//! Stonks Runner: scrape orchestration, ranking, snapshot export.
//!
//! This crate builds on `stonks-core` to provide:
//! - TOML configuration with defaults for every field
//! - The scrape pipeline: rate, listing pages, bounded detail worker pool
//! - Four ranked views (price, P/E, growth, potential profit)
//! - Atomic JSON snapshot export and reload
//! - Progress callbacks for the CLI

pub mod config;
pub mod export;
pub mod progress;
pub mod ranking;
pub mod runner;

pub use config::{ConfigError, ScrapeConfig};
pub use export::{load_view, persist_views, ExportError, SnapshotRow};
pub use progress::{NoProgress, ScrapeProgress, StdoutProgress};
pub use ranking::{rank_all, RankedView, RankingKey};
pub use runner::{fetch_rate, http_source, run_pipeline, RunError, RunSummary};
