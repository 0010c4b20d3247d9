// src/zacks/scraper.rs

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::extractors::TableExtractor;
use crate::session::PageSession;
use crate::utils::error::AppError;
use crate::zacks::models::{merge_reports, EarningsQuery, ReportIndex};
use crate::zacks::page;

// Ticker symbols: letters first, then letters, digits, dots or dashes.
static TICKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9.\-]{0,9}$").expect("Failed to compile TICKER_RE")
});

/// Scrapes the EPS and revenue announcement tables for one ticker and
/// merges them into a single report per announcement date.
///
/// The page session is consumed by the scrape and closed on every exit
/// path, success or failure.
pub struct EarningsScraper<S: PageSession> {
    session: S,
    snapshot_dir: Option<PathBuf>,
}

impl<S: PageSession> EarningsScraper<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            snapshot_dir: None,
        }
    }

    /// Saves fetched page content here when a table cannot be located.
    pub fn snapshot_to(mut self, dir: Option<PathBuf>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Runs the full scrape for `ticker` over the query window.
    pub async fn fetch(mut self, ticker: &str, query: &EarningsQuery) -> Result<ReportIndex, AppError> {
        let ticker = ticker.trim().to_uppercase();
        let result = self.run(&ticker, query).await;
        if let Err(err) = self.session.close().await {
            tracing::warn!("Failed to close page session: {}", err);
        }
        match &result {
            Ok(reports) => {
                tracing::info!("Collected {} earnings report(s) for {}", reports.len(), ticker)
            }
            Err(err) => tracing::error!("Scrape of {} failed: {}", ticker, err),
        }
        result
    }

    async fn run(&mut self, ticker: &str, query: &EarningsQuery) -> Result<ReportIndex, AppError> {
        if !TICKER_RE.is_match(ticker) {
            return Err(AppError::Config(format!(
                "'{}' does not look like a stock ticker",
                ticker
            )));
        }

        let url = page::earnings_url(ticker);
        tracing::info!("Loading {}", url);
        self.session.load(&url).await?;

        let eps = TableExtractor::new(&page::EPS_TABLE, &url, query.start, query.end, query.delay)
            .snapshot_to(self.snapshot_dir.as_deref())
            .extract(&mut self.session)
            .await?;

        tracing::info!("Switching to the sales table");
        self.session.scroll_into_view(page::SALES_TAB_CONTROL).await?;
        tokio::time::sleep(query.delay).await;
        self.session.activate(page::SALES_TAB_CONTROL).await?;

        let sales = TableExtractor::new(&page::SALES_TABLE, &url, query.start, query.end, query.delay)
            .snapshot_to(self.snapshot_dir.as_deref())
            .extract(&mut self.session)
            .await?;

        Ok(merge_reports(eps, sales)?)
    }
}
