// src/zacks/page.rs
//! Layout of the Zacks earnings-announcements page: table ids, pager
//! controls, tab controls, and the column order both tables share.

use once_cell::sync::Lazy;
use scraper::Selector;

use crate::extractors::{ColumnMap, TableSpec};

/// DOM id of the tab control that brings the sales table into the page.
pub const SALES_TAB_CONTROL: &str = "ui-id-4";

/// Both announcement tables lay their cells out the same way.
const ANNOUNCEMENT_COLUMNS: ColumnMap = ColumnMap {
    report_date: 0,
    period_ending: 1,
    estimate: 2,
    reported: 3,
    surprise: 4,
    surprise_pct: 5,
};

static EPS_TABLE_ROOT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table#earnings_announcements_earnings_table")
        .expect("Failed to compile EPS_TABLE_ROOT selector")
});
static EPS_NEXT_CONTROL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#earnings_announcements_earnings_table_next")
        .expect("Failed to compile EPS_NEXT_CONTROL selector")
});
static SALES_TABLE_ROOT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("table#earnings_announcements_sales_table")
        .expect("Failed to compile SALES_TABLE_ROOT selector")
});
static SALES_NEXT_CONTROL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#earnings_announcements_sales_table_next")
        .expect("Failed to compile SALES_NEXT_CONTROL selector")
});

/// The EPS announcements table, shown when the page loads.
pub static EPS_TABLE: TableSpec = TableSpec {
    name: "earnings",
    table_id: "earnings_announcements_earnings_table",
    next_control_id: "earnings_announcements_earnings_table_next",
    root: &EPS_TABLE_ROOT,
    next_control: &EPS_NEXT_CONTROL,
    columns: ANNOUNCEMENT_COLUMNS,
};

/// The revenue announcements table, behind the sales tab.
pub static SALES_TABLE: TableSpec = TableSpec {
    name: "sales",
    table_id: "earnings_announcements_sales_table",
    next_control_id: "earnings_announcements_sales_table_next",
    root: &SALES_TABLE_ROOT,
    next_control: &SALES_NEXT_CONTROL,
    columns: ANNOUNCEMENT_COLUMNS,
};

/// URL of the earnings-announcements page for one ticker.
pub fn earnings_url(ticker: &str) -> String {
    format!("https://www.zacks.com/stock/research/{}/earnings-announcements", ticker)
}
