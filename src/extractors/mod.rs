// src/extractors/mod.rs
pub mod normalize;
pub mod table;

// Re-export key extraction types for convenience
#[allow(unused_imports)]
pub use table::{ColumnMap, TableExtractor, TableIndex, TableRecord, TableSpec};
