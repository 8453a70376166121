//! Output artifact writers
//!
//! Missing numeric values are written as empty CSV fields.

use serde::Serialize;
use std::path::Path;
use tracing::info;

use super::{LoadReport, StorageError};
use crate::pipeline::RunSummary;
use crate::types::{RegionalStat, SemesterRecord};

/// Write well-level records, one row per well per semester.
pub fn write_wells(path: &Path, records: &[SemesterRecord]) -> Result<(), StorageError> {
    write_rows(path, records)?;
    info!(path = %path.display(), rows = records.len(), "Well-level output written");
    Ok(())
}

/// Write regional statistic rows.
pub fn write_regional(path: &Path, rows: &[RegionalStat]) -> Result<(), StorageError> {
    write_rows(path, rows)?;
    info!(path = %path.display(), rows = rows.len(), "Regional output written");
    Ok(())
}

#[derive(Serialize)]
struct SummaryFile<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    load: Option<&'a LoadReport>,
    run: &'a RunSummary,
}

/// Write the run summary (and the loader's counts when available) as JSON.
pub fn write_summary(
    path: &Path,
    summary: &RunSummary,
    load: Option<&LoadReport>,
) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(&SummaryFile { load, run: summary })?;
    std::fs::write(path, json).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Run summary written");
    Ok(())
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StorageError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush().map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir).map_err(|source| StorageError::Io {
                path: dir.to_path_buf(),
                source,
            })
        }
        _ => Ok(()),
    }
}
