// src/zacks/models.rs

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::extractors::{TableIndex, TableRecord};
use crate::utils::error::{AppError, ExtractError};

/// Date formats accepted on the command line.
const INPUT_DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

/// Window and pacing for one scrape.
///
/// Reports dated in `start..end` are collected: the start date itself is
/// included, the end date is not.
#[derive(Debug, Clone, PartialEq)]
pub struct EarningsQuery {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Wait after each pager or tab activation while the page re-renders.
    pub delay: Duration,
}

impl EarningsQuery {
    /// Builds a query from command-line text. The end date defaults to
    /// today when not given.
    pub fn parse(start: &str, end: Option<&str>, delay_secs: f64) -> Result<Self, AppError> {
        let start = parse_input_date(start)?;
        let end = match end {
            Some(raw) => parse_input_date(raw)?,
            None => Local::now().date_naive(),
        };
        // Rejects NaN, negative values, and spans a Duration cannot hold.
        let delay = Duration::try_from_secs_f64(delay_secs).map_err(|_| {
            AppError::Config(format!(
                "Cannot use {} seconds as the refresh delay",
                delay_secs
            ))
        })?;
        Ok(Self { start, end, delay })
    }
}

fn parse_input_date(raw: &str) -> Result<NaiveDate, AppError> {
    let trimmed = raw.trim();
    INPUT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| AppError::InvalidDate(trimmed.to_string()))
}

/// One earnings announcement with the EPS and revenue tables combined.
///
/// Field names serialize to the column labels the reports are published
/// under. `None` marks values the page showed as empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EarningsRecord {
    #[serde(rename = "Period Ending")]
    pub period_ending: NaiveDate,
    #[serde(rename = "Estimated_EPS")]
    pub estimated_eps: Option<f64>,
    #[serde(rename = "Reported_EPS")]
    pub reported_eps: Option<f64>,
    #[serde(rename = "Surprise_EPS")]
    pub surprise_eps: Option<f64>,
    #[serde(rename = "Surprise_%_EPS")]
    pub surprise_pct_eps: Option<f64>,
    #[serde(rename = "Estimated_Revenue")]
    pub estimated_revenue: Option<f64>,
    #[serde(rename = "Reported_Revenue")]
    pub reported_revenue: Option<f64>,
    #[serde(rename = "Surprise_Revenue")]
    pub surprise_revenue: Option<f64>,
    #[serde(rename = "Surprise_%_Revenue")]
    pub surprise_pct_revenue: Option<f64>,
}

impl EarningsRecord {
    fn from_rows(eps: &TableRecord, sales: &TableRecord) -> Self {
        Self {
            // Shared fields take the sales table's value.
            period_ending: sales.period_ending,
            estimated_eps: eps.estimate,
            reported_eps: eps.reported,
            surprise_eps: eps.surprise,
            surprise_pct_eps: eps.surprise_pct,
            estimated_revenue: sales.estimate,
            reported_revenue: sales.reported,
            surprise_revenue: sales.surprise,
            surprise_pct_revenue: sales.surprise_pct,
        }
    }
}

/// Merged announcements keyed by report date, oldest first.
pub type ReportIndex = BTreeMap<NaiveDate, EarningsRecord>;

/// Combines the two table indices into one report per date.
///
/// Every EPS date must also appear in the sales index; the first one that
/// does not fails the merge. Dates only the sales index holds are dropped.
pub fn merge_reports(eps: TableIndex, sales: TableIndex) -> Result<ReportIndex, ExtractError> {
    let mut reports = ReportIndex::new();
    for (report_date, eps_row) in &eps {
        let sales_row = sales
            .get(report_date)
            .ok_or(ExtractError::KeyMismatch(*report_date))?;
        reports.insert(*report_date, EarningsRecord::from_rows(eps_row, sales_row));
    }
    Ok(reports)
}
