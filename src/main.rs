// src/main.rs
mod utils;
mod extractors;
mod session;
mod storage;
mod zacks;

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use session::WebDriverSession;
use utils::AppError;
use zacks::{EarningsQuery, EarningsScraper};

/// Command Line Interface for the Zacks earnings-announcements scraper
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol of the company
    #[arg(short, long)]
    ticker: String,

    /// Earliest report date to keep (YYYY-MM-DD or MM/DD/YYYY)
    #[arg(long)]
    start: String,

    /// Day after the last report date to keep (defaults to today)
    #[arg(long)]
    end: Option<String>,

    /// Seconds to wait after each pager or tab activation
    #[arg(long, default_value_t = 1.0)]
    delay: f64,

    /// WebDriver server the page is driven through
    #[arg(long, default_value = "http://localhost:4444")]
    webdriver_url: String,

    /// Output format for the merged report
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Write the rendered report to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Debug mode - save fetched page content when a table cannot be found
    #[arg(short, long)]
    debug: bool,

    /// Directory for debug page snapshots
    #[arg(long, default_value = "./debug")]
    debug_dir: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Format {
    /// Right-aligned text table, newest report first
    Table,
    /// Comma-separated values with a header row
    Csv,
    /// JSON object keyed by report date
    Json,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Setup Logging (reads RUST_LOG env var)
    utils::logging::setup_logging();

    // 2. Parse CLI Arguments
    let args = Args::parse();
    tracing::info!("Starting scrape for args: {:?}", args);

    let query = EarningsQuery::parse(&args.start, args.end.as_deref(), args.delay)?;

    // 3. Prepare debug output and open a page session
    let snapshot_dir = prepare_snapshot_dir(args.debug, &args.debug_dir)?;
    let session = WebDriverSession::connect(&args.webdriver_url).await?;

    // 4. Walk both announcement tables and merge them
    let reports = EarningsScraper::new(session)
        .snapshot_to(snapshot_dir)
        .fetch(&args.ticker, &query)
        .await?;

    if reports.is_empty() {
        tracing::warn!(
            "No earnings reports for {} between {} and {}",
            args.ticker,
            query.start,
            query.end
        );
    }

    // 5. Render and deliver the report
    let rendered = match args.format {
        Format::Table => storage::render_table(&reports),
        Format::Csv => storage::render_csv(&reports),
        Format::Json => storage::render_json(&reports)?,
    };
    match &args.output {
        Some(path) => storage::write_report(path, &rendered)?,
        None => println!("{}", rendered.trim_end_matches('\n')),
    }

    Ok(())
}

/// Creates the debug snapshot directory up front when `--debug` is on, so
/// an unusable path fails the run before a browser session is opened.
fn prepare_snapshot_dir(debug: bool, dir: &Path) -> Result<Option<PathBuf>, AppError> {
    if !debug {
        return Ok(None);
    }
    std::fs::create_dir_all(dir)?;
    Ok(Some(dir.to_path_buf()))
}
