// src/session/mod.rs
pub mod webdriver;

#[cfg(test)]
pub mod mock;

pub use webdriver::WebDriverSession;

use crate::utils::error::SessionError;

/// Capability interface over a live, scriptable browser page.
///
/// The extraction logic only ever talks to this trait, so the same walk runs
/// against a real WebDriver endpoint in production and against scripted page
/// sequences in tests. Controls are addressed by their DOM id.
pub trait PageSession {
    /// Navigates the session to `url`.
    async fn load(&mut self, url: &str) -> Result<(), SessionError>;

    /// Returns the current rendered page content.
    ///
    /// Called once per pass over a page, including re-fetches after a
    /// pagination control was activated.
    async fn content(&mut self) -> Result<String, SessionError>;

    /// Clicks the control with the given id.
    async fn activate(&mut self, control_id: &str) -> Result<(), SessionError>;

    /// Scrolls the control with the given id into the viewport.
    async fn scroll_into_view(&mut self, control_id: &str) -> Result<(), SessionError>;

    /// Releases the underlying browser session.
    ///
    /// Called on every exit path of a fetch, so implementations must
    /// tolerate running right after a failure.
    async fn close(&mut self) -> Result<(), SessionError>;
}
