//! Reading-table loader
//!
//! Column names come from `InputConfig`, so the bulk-download headers
//! (`stn_id`, `HR_NAME`, `msmt_date`, `gse_gwe`) work without renaming.
//! Rows with an unparseable timestamp are dropped and counted; missing or
//! unparseable values load as `None` and are left for the reading filter.

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use super::StorageError;
use crate::config::InputConfig;
use crate::processing::parse_timestamp;
use crate::types::Reading;

/// Tokens the bulk downloads use for "no value".
const MISSING_TOKENS: &[&str] = &["", "NaN", "nan", "NA", "N/A", "null"];

/// Row counts from one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub loaded: usize,
    pub unparsed_dates: usize,
    pub missing_values: usize,
    /// Rows dropped because their join key is absent from the station table.
    pub unmatched_stations: usize,
}

/// Region label per station join key, loaded from a station attribute table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationTable {
    regions: HashMap<String, String>,
}

impl StationTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            regions: pairs.into_iter().collect(),
        }
    }

    pub fn region_of(&self, key: &str) -> Option<&str> {
        self.regions.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Load the station attribute table: join key and region label per station.
///
/// Stations without a region label are skipped, which drops their readings
/// from an inner join.
pub fn load_stations(path: &Path, input: &InputConfig) -> Result<StationTable, StorageError> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();
    let key_idx = column_index(&headers, &input.station_join_column, path)?;
    let region_idx = column_index(&headers, &input.region_column, path)?;

    let mut pairs = Vec::new();
    for row in reader.records() {
        let row = row?;
        let key = row.get(key_idx).unwrap_or_default();
        let region = row.get(region_idx).unwrap_or_default();
        if key.is_empty() || region.is_empty() {
            continue;
        }
        pairs.push((key.to_string(), region.to_string()));
    }

    let table = StationTable::from_pairs(pairs);
    info!(path = %path.display(), stations = table.len(), "Station table loaded");
    Ok(table)
}

/// Load the reading table.
///
/// Without a station table the region label is read from
/// `input.region_column`. With one, each row's `input.station_join_column`
/// is looked up in it instead, and rows with no match are dropped.
pub fn load_readings(
    path: &Path,
    input: &InputConfig,
    stations: Option<&StationTable>,
) -> Result<(Vec<Reading>, LoadReport), StorageError> {
    let mut reader = open_csv(path)?;
    let headers = reader.headers()?.clone();

    let station_idx = column_index(&headers, &input.station_id_column, path)?;
    let date_idx = column_index(&headers, &input.date_column, path)?;
    let value_idx = column_index(&headers, &input.value_column, path)?;
    let region_source = match stations {
        Some(table) => RegionSource::Join {
            key_idx: column_index(&headers, &input.station_join_column, path)?,
            table,
        },
        None => RegionSource::Column(column_index(&headers, &input.region_column, path)?),
    };

    let mut report = LoadReport::default();
    let mut readings = Vec::new();

    for row in reader.records() {
        let row = row?;
        report.rows += 1;

        let Some(region) = region_source.region(&row) else {
            report.unmatched_stations += 1;
            continue;
        };
        let Some(timestamp) = row.get(date_idx).and_then(parse_timestamp) else {
            report.unparsed_dates += 1;
            continue;
        };
        let raw_value = row.get(value_idx).and_then(parse_value);
        if raw_value.is_none() {
            report.missing_values += 1;
        }

        readings.push(Reading::new(
            row.get(station_idx).unwrap_or_default(),
            region,
            timestamp,
            raw_value,
        ));
    }

    report.loaded = readings.len();
    if report.unparsed_dates > 0 || report.unmatched_stations > 0 {
        warn!(
            unparsed_dates = report.unparsed_dates,
            unmatched_stations = report.unmatched_stations,
            "Reading rows dropped while loading"
        );
    }
    info!(path = %path.display(), rows = report.rows, loaded = report.loaded, "Reading table loaded");
    Ok((readings, report))
}

/// Where a row's region label comes from.
enum RegionSource<'a> {
    Column(usize),
    Join { key_idx: usize, table: &'a StationTable },
}

impl RegionSource<'_> {
    fn region<'r>(&'r self, row: &'r StringRecord) -> Option<&'r str> {
        match self {
            Self::Column(idx) => row.get(*idx),
            Self::Join { key_idx, table } => row.get(*key_idx).and_then(|k| table.region_of(k)),
        }
    }
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>, StorageError> {
    let file = File::open(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(ReaderBuilder::new().trim(Trim::All).from_reader(file))
}

fn column_index(headers: &StringRecord, column: &str, path: &Path) -> Result<usize, StorageError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| StorageError::MissingColumn {
            column: column.to_string(),
            path: path.to_path_buf(),
        })
}

fn parse_value(raw: &str) -> Option<f64> {
    if MISSING_TOKENS.contains(&raw) {
        return None;
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}
