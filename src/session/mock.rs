// src/session/mock.rs
//! Scripted page sessions for tests: canned page sequences standing in for
//! a rendered browser, plus builders for fixture pages shaped like the live
//! announcement tables.

use std::sync::{Arc, Mutex};

use crate::session::PageSession;
use crate::utils::error::SessionError;
use crate::zacks::page;

/// Record of everything a test may want to assert about session usage.
#[derive(Debug, Default)]
pub struct Journal {
    pub loaded: Vec<String>,
    pub activated: Vec<String>,
    pub scrolled: Vec<String>,
    pub closed: bool,
}

/// A `PageSession` serving pre-scripted content.
///
/// `content` returns the current page of the active phase. Activating a
/// `*_next` control advances within the phase; activating the sales tab
/// switches to the sales pages, whose pager restarts at the first page the
/// way the independently paginated live tables do.
pub struct ScriptedSession {
    eps_pages: Vec<String>,
    sales_pages: Vec<String>,
    on_sales: bool,
    page: usize,
    journal: Arc<Mutex<Journal>>,
}

impl ScriptedSession {
    pub fn new(eps_pages: Vec<String>, sales_pages: Vec<String>) -> Self {
        Self {
            eps_pages,
            sales_pages,
            on_sales: false,
            page: 0,
            journal: Arc::new(Mutex::new(Journal::default())),
        }
    }

    /// Handle for asserting on recorded calls after the session was
    /// consumed by a fetch.
    pub fn journal(&self) -> Arc<Mutex<Journal>> {
        Arc::clone(&self.journal)
    }

    fn active_pages(&self) -> &[String] {
        if self.on_sales {
            &self.sales_pages
        } else {
            &self.eps_pages
        }
    }
}

impl PageSession for ScriptedSession {
    async fn load(&mut self, url: &str) -> Result<(), SessionError> {
        self.journal.lock().unwrap().loaded.push(url.to_string());
        self.on_sales = false;
        self.page = 0;
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SessionError> {
        self.active_pages().get(self.page).cloned().ok_or_else(|| {
            SessionError::Protocol(format!(
                "scripted session ran out of pages at index {}",
                self.page
            ))
        })
    }

    async fn activate(&mut self, control_id: &str) -> Result<(), SessionError> {
        self.journal
            .lock()
            .unwrap()
            .activated
            .push(control_id.to_string());
        if control_id == page::SALES_TAB_CONTROL {
            self.on_sales = true;
            self.page = 0;
        } else if control_id.ends_with("_next") {
            self.page += 1;
        }
        Ok(())
    }

    async fn scroll_into_view(&mut self, control_id: &str) -> Result<(), SessionError> {
        self.journal
            .lock()
            .unwrap()
            .scrolled
            .push(control_id.to_string());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.journal.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Renders one fixture page holding a single paginated table.
///
/// `rows` are cell texts in table order: report date, period ending,
/// estimate, reported, surprise, surprise percent. `last_page` marks the
/// pager control disabled, as the live pager is on its final page.
pub fn table_page(
    table_id: &str,
    next_control_id: &str,
    rows: &[[&str; 6]],
    last_page: bool,
) -> String {
    let mut body = String::new();
    for cells in rows {
        body.push_str("<tr role=\"row\">");
        for cell in cells {
            body.push_str("<td>");
            body.push_str(cell);
            body.push_str("</td>");
        }
        body.push_str("</tr>");
    }
    let pager_class = if last_page {
        "paginate_button next disabled"
    } else {
        "paginate_button next"
    };
    format!(
        "<html><body>\
         <table id=\"{table_id}\" role=\"grid\"><tbody>{body}</tbody></table>\
         <a id=\"{next_control_id}\" class=\"{pager_class}\">Next</a>\
         </body></html>"
    )
}

/// Fixture page for the EPS announcements table.
pub fn eps_page(rows: &[[&str; 6]], last_page: bool) -> String {
    table_page(
        page::EPS_TABLE.table_id,
        page::EPS_TABLE.next_control_id,
        rows,
        last_page,
    )
}

/// Fixture page for the sales table.
pub fn sales_page(rows: &[[&str; 6]], last_page: bool) -> String {
    table_page(
        page::SALES_TABLE.table_id,
        page::SALES_TABLE.next_control_id,
        rows,
        last_page,
    )
}
