// src/extractors/table.rs

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::extractors::normalize::clean_value;
use crate::session::PageSession;
use crate::utils::error::ExtractError;

// Row and cell structure is shared by both announcement tables.
static ROW_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("tbody tr[role=\"row\"]").expect("Failed to compile ROW_SELECTOR")
});
static CELL_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile CELL_SELECTOR"));

/// Cell positions of the fields a table row feeds into a record.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub report_date: usize,
    pub period_ending: usize,
    pub estimate: usize,
    pub reported: usize,
    pub surprise: usize,
    pub surprise_pct: usize,
}

impl ColumnMap {
    /// Smallest row width that covers every mapped column.
    pub const fn width(&self) -> usize {
        let mut max = self.report_date;
        if self.period_ending > max {
            max = self.period_ending;
        }
        if self.estimate > max {
            max = self.estimate;
        }
        if self.reported > max {
            max = self.reported;
        }
        if self.surprise > max {
            max = self.surprise;
        }
        if self.surprise_pct > max {
            max = self.surprise_pct;
        }
        max + 1
    }
}

/// Everything the extractor needs to know about one paginated table.
#[derive(Debug)]
pub struct TableSpec {
    /// Short name used in logs.
    pub name: &'static str,
    pub table_id: &'static str,
    /// DOM id of the table's "next page" control.
    pub next_control_id: &'static str,
    pub root: &'static Lazy<Selector>,
    pub next_control: &'static Lazy<Selector>,
    pub columns: ColumnMap,
}

/// One table's view of a single earnings announcement.
///
/// `None` marks cells the table showed as empty. `surprise_pct` is stored
/// as a fraction: a cell reading `4.78%` becomes `0.0478`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub period_ending: NaiveDate,
    pub estimate: Option<f64>,
    pub reported: Option<f64>,
    pub surprise: Option<f64>,
    pub surprise_pct: Option<f64>,
}

/// Rows of one table keyed by report date.
pub type TableIndex = BTreeMap<NaiveDate, TableRecord>;

enum PageOutcome {
    /// More rows may follow on the next page.
    Advance,
    /// A report older than the window start was seen; the walk is done.
    LowerBoundReached,
    /// The pager is missing or disabled; there is no next page.
    PagerExhausted,
}

/// Walks one paginated announcement table through a page session.
///
/// Each pass fetches the rendered content, collects the rows whose report
/// date falls inside `start..end`, and advances the pager until a report
/// older than `start` shows up or no further page exists. Rows at or past
/// `end` are skipped without ending the walk, since the newest rows of the
/// table may lie beyond the window.
///
/// The table is assumed sorted by report date descending, newest first, as
/// the live page renders it. On an unsorted source the early stop would cut
/// the walk short; no re-sorting is attempted.
pub struct TableExtractor<'a> {
    spec: &'a TableSpec,
    page_url: &'a str,
    start: NaiveDate,
    end: NaiveDate,
    delay: Duration,
    snapshot_dir: Option<&'a Path>,
}

impl<'a> TableExtractor<'a> {
    pub fn new(
        spec: &'a TableSpec,
        page_url: &'a str,
        start: NaiveDate,
        end: NaiveDate,
        delay: Duration,
    ) -> Self {
        Self {
            spec,
            page_url,
            start,
            end,
            delay,
            snapshot_dir: None,
        }
    }

    /// Saves fetched page content here when the table cannot be located.
    pub fn snapshot_to(mut self, dir: Option<&'a Path>) -> Self {
        self.snapshot_dir = dir;
        self
    }

    /// Runs the walk and returns the collected rows keyed by report date.
    pub async fn extract<S: PageSession>(&self, session: &mut S) -> Result<TableIndex, ExtractError> {
        let mut records = TableIndex::new();
        let mut page_no = 1usize;

        loop {
            let html = session.content().await?;
            match self.scan_page(&html, &mut records, page_no)? {
                PageOutcome::LowerBoundReached => {
                    tracing::debug!(
                        "{} table: report older than {} reached, stopping",
                        self.spec.name,
                        self.start
                    );
                    break;
                }
                PageOutcome::PagerExhausted => {
                    tracing::debug!("{} table: no further pages", self.spec.name);
                    break;
                }
                PageOutcome::Advance => {
                    session.scroll_into_view(self.spec.next_control_id).await?;
                    session.activate(self.spec.next_control_id).await?;
                    tokio::time::sleep(self.delay).await;
                    page_no += 1;
                }
            }
        }

        tracing::debug!(
            "{} table walk finished after {} page(s), {} rows in window",
            self.spec.name,
            page_no,
            records.len()
        );
        Ok(records)
    }

    /// Processes one fetched page: collects in-window rows and decides how
    /// the walk continues.
    fn scan_page(
        &self,
        html: &str,
        records: &mut TableIndex,
        page_no: usize,
    ) -> Result<PageOutcome, ExtractError> {
        let page = Html::parse_document(html);
        let Some(table) = page.select(self.spec.root).next() else {
            self.snapshot_page(html, page_no);
            return Err(ExtractError::TableNotFound {
                table_id: self.spec.table_id.to_string(),
                url: self.page_url.to_string(),
            });
        };

        let mut rows_seen = 0usize;
        for row in table.select(&ROW_SELECTOR) {
            rows_seen += 1;
            let cells = cell_texts(row);
            if cells.len() < self.spec.columns.width() {
                return Err(ExtractError::RowShape {
                    table_id: self.spec.table_id.to_string(),
                    expected: self.spec.columns.width(),
                    found: cells.len(),
                });
            }

            let report_date = parse_report_date(&cells[self.spec.columns.report_date])?;
            if report_date < self.start {
                // Remaining rows on this page are older still.
                return Ok(PageOutcome::LowerBoundReached);
            }
            if report_date < self.end {
                records.insert(report_date, self.parse_row(&cells)?);
            }
            // Rows dated at or past `end` fall through: skipped, not final.
        }

        tracing::debug!(
            "{} table, page {}: {} rows, {} in window so far",
            self.spec.name,
            page_no,
            rows_seen,
            records.len()
        );

        if pager_exhausted(&page, self.spec) {
            return Ok(PageOutcome::PagerExhausted);
        }
        Ok(PageOutcome::Advance)
    }

    fn parse_row(&self, cells: &[String]) -> Result<TableRecord, ExtractError> {
        let columns = &self.spec.columns;
        Ok(TableRecord {
            period_ending: parse_period_ending(&cells[columns.period_ending])?,
            estimate: clean_value(&cells[columns.estimate])?,
            reported: clean_value(&cells[columns.reported])?,
            surprise: clean_value(&cells[columns.surprise])?,
            // The table shows whole percents; records hold fractions.
            surprise_pct: clean_value(&cells[columns.surprise_pct])?.map(|pct| pct / 100.0),
        })
    }

    /// Saves the fetched content for diagnosis when the table is missing.
    /// Failures are only logged; the extraction error is the one that
    /// surfaces.
    fn snapshot_page(&self, html: &str, page_no: usize) {
        let Some(dir) = self.snapshot_dir else { return };
        let path = dir.join(format!("{}_page{}.html", self.spec.table_id, page_no));
        let result = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, html));
        match result {
            Ok(()) => tracing::info!("Saved page snapshot to {}", path.display()),
            Err(err) => tracing::warn!("Failed to save page snapshot: {}", err),
        }
    }
}

/// Collects the trimmed text of every cell in a row.
fn cell_texts(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL_SELECTOR)
        .map(|cell| {
            cell.text()
                .collect::<String>()
                .replace('\u{a0}', " ")
                .trim()
                .to_string()
        })
        .collect()
}

/// Reads the pager state out of already-fetched content: a missing control
/// or one flagged `disabled` means there is no further page.
fn pager_exhausted(page: &Html, spec: &TableSpec) -> bool {
    match page.select(spec.next_control).next() {
        None => true,
        Some(control) => control
            .value()
            .attr("class")
            .map(|classes| classes.split_whitespace().any(|class| class == "disabled"))
            .unwrap_or(false),
    }
}

const REPORT_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"];

fn parse_report_date(raw: &str) -> Result<NaiveDate, ExtractError> {
    let trimmed = raw.trim();
    REPORT_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| ExtractError::DateFormat(trimmed.to_string()))
}

/// Period cells carry month and year only (`12/2019`), pinned to the first
/// of the month; full dates are accepted as well.
fn parse_period_ending(raw: &str) -> Result<NaiveDate, ExtractError> {
    let trimmed = raw.trim();
    if let Some((month, year)) = trimmed.split_once('/') {
        if let (Ok(month), Ok(year)) = (month.parse::<u32>(), year.parse::<i32>()) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, month, 1) {
                return Ok(date);
            }
        }
    }
    parse_report_date(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::mock::{eps_page, ScriptedSession};
    use crate::zacks::page;

    const PAGE_URL: &str = "https://www.zacks.com/stock/research/TSLA/earnings-announcements";

    const ROW_2020_04_29: [&str; 6] = ["4/29/2020", "3/2020", "-$0.22", "$1.24", "1.46", "663.64"];
    const ROW_2020_01_29: [&str; 6] = ["1/29/2020", "12/2019", "$1.62", "$2.14", "0.52", "32.10"];
    const ROW_2019_10_23: [&str; 6] = ["10/23/2019", "9/2019", "-$0.15", "$1.86", "2.01", "1,340.00"];
    const ROW_2019_04_24: [&str; 6] = ["4/24/2019", "3/2019", "-$1.21", "-$2.90", "-1.69", "-139.67"];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn extractor<'a>(start: NaiveDate, end: NaiveDate) -> TableExtractor<'a> {
        TableExtractor::new(&page::EPS_TABLE, PAGE_URL, start, end, Duration::ZERO)
    }

    fn extract(session: &mut ScriptedSession, start: NaiveDate, end: NaiveDate) -> Result<TableIndex, ExtractError> {
        tokio_test::block_on(extractor(start, end).extract(session))
    }

    #[test]
    fn halts_pagination_at_first_report_older_than_start() {
        let mut session = ScriptedSession::new(
            vec![
                eps_page(&[ROW_2020_01_29], false),
                eps_page(&[ROW_2019_04_24], false),
            ],
            vec![],
        );
        let journal = session.journal();

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains_key(&date(2020, 1, 29)));
        // One advance onto the page holding the below-start row, none after.
        let journal = journal.lock().unwrap();
        assert_eq!(
            journal.activated,
            vec![page::EPS_TABLE.next_control_id.to_string()]
        );
        assert_eq!(
            journal.scrolled,
            vec![page::EPS_TABLE.next_control_id.to_string()]
        );
    }

    #[test]
    fn skips_rows_at_or_after_end_without_stopping() {
        let mut session = ScriptedSession::new(
            vec![
                eps_page(&[ROW_2020_04_29, ROW_2020_01_29], false),
                eps_page(&[ROW_2019_10_23, ROW_2019_04_24], false),
            ],
            vec![],
        );

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        let keys: Vec<NaiveDate> = index.keys().copied().collect();
        assert_eq!(keys, vec![date(2019, 10, 23), date(2020, 1, 29)]);
        for key in keys {
            assert!(key >= date(2019, 6, 1) && key < date(2020, 2, 1));
        }
    }

    #[test]
    fn includes_reports_on_the_window_start_date() {
        let rows = [
            ["6/1/2019", "3/2019", "1.00", "1.10", "0.10", "10.00"],
            ROW_2019_04_24,
        ];
        let mut session = ScriptedSession::new(vec![eps_page(&rows, false)], vec![]);
        let journal = session.journal();

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.contains_key(&date(2019, 6, 1)));
        // Termination came from the in-page row, not from the pager.
        assert!(journal.lock().unwrap().activated.is_empty());
    }

    #[test]
    fn stops_when_pager_is_disabled() {
        let mut session = ScriptedSession::new(
            vec![eps_page(&[ROW_2020_01_29, ROW_2019_10_23], true)],
            vec![],
        );
        let journal = session.journal();

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        assert_eq!(index.len(), 2);
        assert!(journal.lock().unwrap().activated.is_empty());
    }

    #[test]
    fn stops_when_pager_is_absent() {
        let html = format!(
            "<html><body><table id=\"{}\"><tbody>\
             <tr role=\"row\"><td>1/29/2020</td><td>12/2019</td>\
             <td>1.62</td><td>2.14</td><td>0.52</td><td>32.10</td></tr>\
             </tbody></table></body></html>",
            page::EPS_TABLE.table_id
        );
        let mut session = ScriptedSession::new(vec![html], vec![]);

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        assert_eq!(index.len(), 1);
    }

    #[test]
    fn extracts_and_normalizes_row_fields() {
        let rows = [["1/29/2020", "12/2019", "$1.62", "2.14", "--", "32.10"]];
        let mut session = ScriptedSession::new(vec![eps_page(&rows, true)], vec![]);

        let index = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        let record = &index[&date(2020, 1, 29)];
        assert_eq!(record.period_ending, date(2019, 12, 1));
        assert_eq!(record.estimate, Some(1.62));
        assert_eq!(record.reported, Some(2.14));
        assert_eq!(record.surprise, None);
        assert_eq!(record.surprise_pct, Some(32.10 / 100.0));
    }

    #[test]
    fn repeated_extraction_yields_identical_records() {
        let pages = || {
            vec![
                eps_page(&[ROW_2020_01_29], false),
                eps_page(&[ROW_2019_10_23, ROW_2019_04_24], false),
            ]
        };
        let mut first_session = ScriptedSession::new(pages(), vec![]);
        let mut second_session = ScriptedSession::new(pages(), vec![]);

        let first = extract(&mut first_session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();
        let second = extract(&mut second_session, date(2019, 6, 1), date(2020, 2, 1)).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn missing_table_fails_with_the_page_url() {
        let mut session = ScriptedSession::new(
            vec!["<html><body><p>Symbol not found</p></body></html>".to_string()],
            vec![],
        );

        let err = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap_err();

        assert!(matches!(err, ExtractError::TableNotFound { .. }));
        assert!(err.to_string().contains(PAGE_URL));
        assert!(err.to_string().contains(page::EPS_TABLE.table_id));
    }

    #[test]
    fn saves_a_page_snapshot_when_the_table_is_missing() {
        let html = "<html><body><p>Symbol not found</p></body></html>".to_string();
        let mut session = ScriptedSession::new(vec![html.clone()], vec![]);
        let dir = std::env::temp_dir().join(format!("zacks_earnings_snap_{}", std::process::id()));

        let err = tokio_test::block_on(
            extractor(date(2019, 6, 1), date(2020, 2, 1))
                .snapshot_to(Some(dir.as_path()))
                .extract(&mut session),
        )
        .unwrap_err();

        // The saved page is for diagnosis; the error still surfaces.
        assert!(matches!(err, ExtractError::TableNotFound { .. }));
        let snapshot = dir.join(format!("{}_page1.html", page::EPS_TABLE.table_id));
        assert_eq!(std::fs::read_to_string(&snapshot).unwrap(), html);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unparseable_report_date_fails() {
        let rows = [["soon", "12/2019", "1.62", "2.14", "0.52", "32.10"]];
        let mut session = ScriptedSession::new(vec![eps_page(&rows, true)], vec![]);

        let err = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap_err();

        assert!(matches!(err, ExtractError::DateFormat(ref raw) if raw == "soon"));
    }

    #[test]
    fn short_rows_fail_with_row_shape() {
        let html = format!(
            "<html><body><table id=\"{}\"><tbody>\
             <tr role=\"row\"><td>1/29/2020</td><td>12/2019</td><td>1.62</td></tr>\
             </tbody></table></body></html>",
            page::EPS_TABLE.table_id
        );
        let mut session = ScriptedSession::new(vec![html], vec![]);

        let err = extract(&mut session, date(2019, 6, 1), date(2020, 2, 1)).unwrap_err();

        assert!(matches!(
            err,
            ExtractError::RowShape {
                expected: 6,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn parses_report_date_formats() {
        assert_eq!(parse_report_date("1/29/2020").unwrap(), date(2020, 1, 29));
        assert_eq!(parse_report_date("2020-01-29").unwrap(), date(2020, 1, 29));
        assert!(parse_report_date("January").is_err());
    }

    #[test]
    fn parses_month_year_period_endings() {
        assert_eq!(parse_period_ending("12/2019").unwrap(), date(2019, 12, 1));
        assert_eq!(parse_period_ending("3/31/2019").unwrap(), date(2019, 3, 31));
    }
}
