//! Stonks CLI: scrape the S&P 500 listing and rank the companies.
//!
//! Commands:
//! - `scrape`: run the full pipeline and write the four top-10 snapshots
//! - `rate`: fetch and print the conversion rate only
//! - `show`: print previously written snapshots as tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use stonks_core::domain::ConversionRate;
use stonks_runner::{
    fetch_rate, http_source, load_view, run_pipeline, RankingKey, ScrapeConfig, SnapshotRow,
    StdoutProgress,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "stonks",
    about = "Stonks CLI: S&P 500 scraper with ruble prices and top-10 rankings"
)]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape listing and detail pages and write the ranked snapshots.
    Scrape {
        /// Path to a TOML config file. Defaults apply to every missing field.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory for the snapshot files.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Number of listing pages to walk.
        #[arg(long)]
        pages: Option<u32>,

        /// Maximum concurrent detail-page requests.
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// Per-request timeout in seconds.
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Entries per ranked view.
        #[arg(long)]
        top_n: Option<usize>,

        /// Extra attempts per request for transient failures.
        #[arg(long)]
        retries: Option<u32>,
    },
    /// Fetch and print the conversion rate.
    Rate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the snapshots in a directory as tables.
    Show {
        /// Directory holding the snapshot files. Defaults to the current one.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

/// Flag overrides applied on top of the config file.
struct Overrides {
    output_dir: Option<PathBuf>,
    pages: Option<u32>,
    max_in_flight: Option<usize>,
    timeout_secs: Option<u64>,
    top_n: Option<usize>,
    retries: Option<u32>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scrape {
            config,
            output_dir,
            pages,
            max_in_flight,
            timeout_secs,
            top_n,
            retries,
        } => run_scrape(
            config.as_deref(),
            Overrides {
                output_dir,
                pages,
                max_in_flight,
                timeout_secs,
                top_n,
                retries,
            },
        ),
        Commands::Rate { config } => run_rate(config.as_deref()),
        Commands::Show { output_dir } => run_show(&output_dir),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ScrapeConfig> {
    match path {
        Some(path) => ScrapeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ScrapeConfig::default()),
    }
}

fn run_scrape(config_path: Option<&Path>, overrides: Overrides) -> Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(dir) = overrides.output_dir {
        config.output_dir = dir;
    }
    if let Some(pages) = overrides.pages {
        config.pages = pages;
    }
    if let Some(n) = overrides.max_in_flight {
        config.max_in_flight = n;
    }
    if let Some(secs) = overrides.timeout_secs {
        config.request_timeout_secs = secs;
    }
    if let Some(n) = overrides.top_n {
        config.top_n = n;
    }
    if let Some(n) = overrides.retries {
        config.max_retries = n;
    }
    config.validate()?;
    tracing::debug!(?config, "effective config");

    let source = http_source(&config)?;
    let summary = run_pipeline(&config, &source, &StdoutProgress).context("scrape failed")?;

    print_rate(&summary.rate);
    Ok(())
}

fn run_rate(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let source = http_source(&config)?;
    let rate = fetch_rate(&config, &source).context("rate fetch failed")?;
    print_rate(&rate);
    Ok(())
}

fn print_rate(rate: &ConversionRate) {
    match rate.as_of {
        Some(date) => println!("Rate {}: {} (as of {date})", rate.currency_id, rate.value),
        None => println!("Rate {}: {}", rate.currency_id, rate.value),
    }
}

fn run_show(dir: &Path) -> Result<()> {
    for key in RankingKey::ALL {
        let path = dir.join(key.file_name());
        let rows = load_view(&path).with_context(|| format!("reading {}", path.display()))?;
        println!("\n=== Top {} by {} ===", rows.len(), key);
        print_table(&rows, key.includes_growth());
    }
    Ok(())
}

fn print_table(rows: &[SnapshotRow], with_growth: bool) {
    if rows.is_empty() {
        println!("  (empty)");
        return;
    }

    let mut header = format!(
        "  {:>3}  {:<12} {:<28} {:>14} {:>9} {:>10}",
        "#", "Code", "Name", "Price", "P/E", "Profit %"
    );
    if with_growth {
        header.push_str(&format!(" {:>9}", "Growth %"));
    }
    println!("{header}");

    for (i, row) in rows.iter().enumerate() {
        let pe = row
            .pe
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "  {:>3}  {:<12} {:<28} {:>14.2} {:>9} {:>10.2}",
            i + 1,
            truncate(&row.code, 12),
            truncate(&row.name, 28),
            row.price,
            pe,
            row.potential_profit
        );
        if let Some(growth) = row.growth.filter(|_| with_growth) {
            line.push_str(&format!(" {growth:>9.2}"));
        }
        println!("{line}");
    }
}

fn truncate(s: &str, width: usize) -> String {
    let one_line = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if one_line.chars().count() <= width {
        one_line
    } else {
        one_line.chars().take(width - 1).chain(['…']).collect()
    }
}
