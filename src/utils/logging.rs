// src/utils/logging.rs
use tracing_subscriber::{fmt, EnvFilter};

/// Initializes tracing for the whole process.
///
/// The filter comes from `RUST_LOG`; when unset we default to `info` so the
/// page-by-page progress of a scrape is visible without drowning stdout,
/// where the extracted table itself is printed.
pub fn setup_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Logging setup complete.");
}
