// src/utils/error.rs
use chrono::NaiveDate;
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("WebDriver HTTP error: {0}")]
    Http(reqwest::StatusCode), // Non-2xx without a parseable driver payload

    #[error("WebDriver reported '{error}': {message}")]
    Driver { error: String, message: String },

    #[error("Page control '{0}' could not be located")]
    ControlNotFound(String),

    #[error("Malformed WebDriver response: {0}")]
    Protocol(String),
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Could not locate table '{table_id}' at {url}. The ticker may not be covered by Zacks.")]
    TableNotFound { table_id: String, url: String },

    #[error("Cell text {0:?} is not a date")]
    DateFormat(String),

    #[error("Cell text {0:?} is not numeric")]
    ValueFormat(String),

    #[error("Row in table '{table_id}' has {found} cells, expected {expected}")]
    RowShape {
        table_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Report date {0} is present in the earnings table but missing from the sales table")]
    KeyMismatch(NaiveDate),

    #[error("Page session failed during extraction: {0}")]
    Session(#[from] SessionError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid date {0:?}. Use YYYY-MM-DD or MM/DD/YYYY.")]
    InvalidDate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Page session failed: {0}")]
    Session(#[from] SessionError),

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}
