// src/zacks/mod.rs
pub mod models;
pub mod page;
pub mod scraper;

// Re-export the types callers actually touch
#[allow(unused_imports)]
pub use models::{EarningsQuery, EarningsRecord, ReportIndex};
#[allow(unused_imports)]
pub use scraper::EarningsScraper;
