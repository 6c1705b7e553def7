use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading or validating an input sheet.
///
/// Only these abort a run. Dropped rows and skipped accounts are reported as
/// advisory strings by the loader and aggregator instead.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Missing required columns: {missing:?} (available: {available:?})")]
    Schema {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Unsupported input format: {0} (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat(PathBuf),

    #[error("Sheet '{sheet}' not found (available: {available:?})")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("Failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Template rendering failed for account {account_id}: {source}")]
    Template {
        account_id: String,
        #[source]
        source: askama::Error,
    },
}
