//! Reading Filter
//!
//! Subsets the raw reading table before any aggregation. Rejects:
//! - Readings from regions outside the allow-list
//! - Readings outside the inclusive `[initial_date, end_date]` window
//! - Readings without a usable value
//! - Depth-to-water values above the plausibility bound (instrumentation
//!   error or confined aquifer); these are dropped, not recorded as missing
//!
//! Surviving readings are converted to elevation by negating the depth.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use super::ProcessingError;
use crate::config::{DroughtConfig, RegionSubset};
use crate::types::{FilteredReading, Reading};

/// Bounds applied by the filter, resolved from the run configuration.
#[derive(Debug, Clone)]
pub struct FilterParams<'a> {
    pub region_subset: &'a RegionSubset,
    pub initial_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_raw_value: f64,
}

impl<'a> FilterParams<'a> {
    pub fn from_config(config: &'a DroughtConfig) -> Self {
        Self {
            region_subset: &config.filter.region_subset,
            initial_date: config.filter.initial_date,
            end_date: config.end_date(),
            max_raw_value: config.filter.max_raw_value,
        }
    }
}

/// Counts of kept and rejected readings, by reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub input: usize,
    pub kept: usize,
    pub outside_region: usize,
    pub outside_dates: usize,
    pub missing_value: usize,
    pub above_bound: usize,
}

/// Reasons for reading rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectionReason {
    OutsideRegion,
    OutsideDates,
    MissingValue,
    AboveBound,
}

/// Filter raw readings and convert them to elevations.
///
/// Fails with a configuration error when an allow-listed region has no
/// readings at all, or when the date window is inverted.
pub fn filter_readings(
    readings: &[Reading],
    params: &FilterParams<'_>,
) -> Result<(Vec<FilteredReading>, FilterReport), ProcessingError> {
    if readings.is_empty() {
        return Err(ProcessingError::EmptyInput);
    }
    if params.initial_date > params.end_date {
        return Err(ProcessingError::InvalidDateRange {
            initial: params.initial_date,
            end: params.end_date,
        });
    }

    if let RegionSubset::Only(labels) = params.region_subset {
        let present: HashSet<&str> = readings.iter().map(|r| r.region_label.as_str()).collect();
        if let Some(missing) = labels.iter().find(|l| !present.contains(l.as_str())) {
            return Err(ProcessingError::UnknownRegion(missing.clone()));
        }
    }

    let mut report = FilterReport {
        input: readings.len(),
        ..FilterReport::default()
    };
    let mut kept = Vec::with_capacity(readings.len());

    for reading in readings {
        match validate(reading, params) {
            Ok(depth) => kept.push(FilteredReading {
                station_id: reading.station_id.clone(),
                region_label: reading.region_label.clone(),
                date: reading.timestamp,
                elevation: -depth,
            }),
            Err(reason) => match reason {
                RejectionReason::OutsideRegion => report.outside_region += 1,
                RejectionReason::OutsideDates => report.outside_dates += 1,
                RejectionReason::MissingValue => report.missing_value += 1,
                RejectionReason::AboveBound => report.above_bound += 1,
            },
        }
    }

    report.kept = kept.len();
    debug!(
        input = report.input,
        kept = report.kept,
        above_bound = report.above_bound,
        "Reading filter applied"
    );
    Ok((kept, report))
}

/// Validate a single reading, returning its depth to water.
fn validate(reading: &Reading, params: &FilterParams<'_>) -> Result<f64, RejectionReason> {
    if !params.region_subset.allows(&reading.region_label) {
        return Err(RejectionReason::OutsideRegion);
    }
    if reading.timestamp < params.initial_date || reading.timestamp > params.end_date {
        return Err(RejectionReason::OutsideDates);
    }
    let depth = match reading.raw_value {
        Some(v) if v.is_finite() => v,
        _ => return Err(RejectionReason::MissingValue),
    };
    if depth > params.max_raw_value {
        return Err(RejectionReason::AboveBound);
    }
    Ok(depth)
}

// ============================================================================
// Timestamp Parsing
// ============================================================================

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a measurement timestamp written in any of the formats the bulk
/// downloads mix together, keeping only the calendar date.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(d) = DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
    {
        return Some(d);
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.date());
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
