//! Tabular Storage
//!
//! CSV in, CSV and JSON out:
//! - `readings`: reading-table loader with configurable column names and an
//!   optional station-attribute join that supplies region labels
//! - `outputs`: writers for the well-level and regional artifacts and the
//!   run summary

pub mod readings;
pub mod outputs;

pub use readings::{load_readings, load_stations, LoadReport, StationTable};
pub use outputs::{write_regional, write_summary, write_wells};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading inputs or writing artifacts.
#[derive(Error, Debug)]
pub enum StorageError {
    /// A configured column is absent from the file header.
    #[error("Column '{column}' not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
