// src/storage/mod.rs
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::utils::error::StorageError;
use crate::zacks::models::{EarningsRecord, ReportIndex};

/// Column labels shared by the tabular and CSV renderings.
pub const COLUMNS: [&str; 10] = [
    "Report Date",
    "Period Ending",
    "Estimated_EPS",
    "Reported_EPS",
    "Surprise_EPS",
    "Surprise_%_EPS",
    "Estimated_Revenue",
    "Reported_Revenue",
    "Surprise_Revenue",
    "Surprise_%_Revenue",
];

/// Renders the reports as a right-aligned text table, newest first, with
/// missing values shown as `NaN`.
pub fn render_table(reports: &ReportIndex) -> String {
    let mut widths: Vec<usize> = COLUMNS.iter().map(|label| label.len()).collect();
    let mut rows: Vec<[String; 10]> = Vec::with_capacity(reports.len());
    for (report_date, record) in reports.iter().rev() {
        let row = display_cells(*report_date, record);
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
        rows.push(row);
    }

    let mut out = String::new();
    push_line(&mut out, COLUMNS.iter().map(|label| label.to_string()), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().cloned(), &widths);
    }
    out
}

/// Renders the reports as CSV, newest first, with missing values left as
/// empty fields and numbers at full precision.
pub fn render_csv(reports: &ReportIndex) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for (report_date, record) in reports.iter().rev() {
        let fields = [
            report_date.to_string(),
            record.period_ending.to_string(),
            csv_value(record.estimated_eps),
            csv_value(record.reported_eps),
            csv_value(record.surprise_eps),
            csv_value(record.surprise_pct_eps),
            csv_value(record.estimated_revenue),
            csv_value(record.reported_revenue),
            csv_value(record.surprise_revenue),
            csv_value(record.surprise_pct_revenue),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

/// Renders the reports as a pretty-printed JSON object keyed by report
/// date; missing values come out as `null`.
pub fn render_json(reports: &ReportIndex) -> Result<String, StorageError> {
    serde_json::to_string_pretty(reports).map_err(|e| StorageError::Serialization(e.to_string()))
}

/// Writes rendered report text to a file, creating parent directories as
/// needed.
pub fn write_report(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, contents)?;
    tracing::info!("Saved report to {}", path.display());
    Ok(())
}

fn display_cells(report_date: NaiveDate, record: &EarningsRecord) -> [String; 10] {
    [
        report_date.to_string(),
        record.period_ending.to_string(),
        fmt_amount(record.estimated_eps),
        fmt_amount(record.reported_eps),
        fmt_amount(record.surprise_eps),
        fmt_fraction(record.surprise_pct_eps),
        fmt_amount(record.estimated_revenue),
        fmt_amount(record.reported_revenue),
        fmt_amount(record.surprise_revenue),
        fmt_fraction(record.surprise_pct_revenue),
    ]
}

fn push_line<I: Iterator<Item = String>>(out: &mut String, cells: I, widths: &[usize]) {
    for (i, (cell, width)) in cells.zip(widths.iter().copied()).enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(&format!("{cell:>width$}"));
    }
    out.push('\n');
}

fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => "NaN".to_string(),
    }
}

// Surprise percents are stored as fractions, so they get more places.
fn fmt_fraction(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "NaN".to_string(),
    }
}

fn csv_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
