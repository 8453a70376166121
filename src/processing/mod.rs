//! Indicator computation stages
//!
//! Stages in dependency order:
//! - `reading_filter`: region/date/value-bound subset of raw readings, timestamp parsing
//! - `semester`: median elevation per well per semester, anchor dates
//! - `change_series`: annual change, outlier clamp, cumulative change, coverage gate
//! - `percentile`: fixed-baseline percentile-of-score plus rank/quantile helpers
//! - `regional`: per-region statistics and rank-based correction

pub mod reading_filter;
pub mod semester;
pub mod change_series;
pub mod percentile;
pub mod regional;

pub use reading_filter::{filter_readings, parse_timestamp, FilterReport};
pub use semester::aggregate_semesters;
pub use change_series::{compute_change_series, passes_coverage, ChangeSummary};
pub use percentile::{score, BaselineDistribution, BaselineWindow};
pub use regional::aggregate_regions;

use thiserror::Error;

/// Errors raised by the computation stages.
///
/// Per-well data problems are never errors: those wells are excluded and
/// counted. Only inputs that make the whole run meaningless end up here.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessingError {
    #[error("Region '{0}' in region_subset matches no readings")]
    UnknownRegion(String),

    #[error("No readings supplied")]
    EmptyInput,

    #[error("Invalid date range: initial date {initial} is after end date {end}")]
    InvalidDateRange {
        initial: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}
