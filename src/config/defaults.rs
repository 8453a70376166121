//! System-wide default constants.
//!
//! Centralises the numbers the indicator depends on. Grouped by pipeline stage
//! for easy discovery; `DroughtConfig` defaults read from here.

// ============================================================================
// Baseline
// ============================================================================

/// First year of the fixed percentile baseline window (inclusive).
pub const BASELINE_START_YEAR: i32 = 1991;

/// Last year of the fixed percentile baseline window (inclusive).
pub const BASELINE_END_YEAR: i32 = 2020;

// ============================================================================
// Reading Filter
// ============================================================================

/// Earliest reading date included in the analysis (year, month, day).
pub const INITIAL_DATE_YMD: (i32, u32, u32) = (1990, 1, 1);

/// Deepest plausible depth to water (ft). Deeper readings are dropped as
/// instrumentation error or confined-aquifer wells.
pub const MAX_RAW_VALUE: f64 = 300.0;

// ============================================================================
// Change Series
// ============================================================================

/// Largest plausible year-over-year elevation change (ft).
pub const MAX_GW_CHANGE: f64 = 30.0;

/// Fraction of expected semesters a well must populate to be scored.
///
/// 0.0 admits every well with at least one valid semester.
pub const MIN_COVERAGE_FRACTION: f64 = 0.0;

/// Semesters per calendar year; the change lag.
pub const SEMESTERS_PER_YEAR: usize = 2;

// ============================================================================
// Input Columns (original bulk-download schema)
// ============================================================================

pub const STATION_ID_COLUMN: &str = "stn_id";
pub const REGION_COLUMN: &str = "HR_NAME";
pub const DATE_COLUMN: &str = "msmt_date";
pub const VALUE_COLUMN: &str = "gse_gwe";
pub const STATION_JOIN_COLUMN: &str = "site_code";

// ============================================================================
// Outputs
// ============================================================================

pub const OUTPUT_DIRECTORY: &str = "output";
pub const WELLS_FILE: &str = "state_wells_individual_analysis.csv";
pub const REGIONAL_FILE: &str = "state_wells_regional_analysis.csv";

/// Environment variable naming a config file to load.
pub const CONFIG_ENV_VAR: &str = "GW_DROUGHT_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const CONFIG_FILE_NAME: &str = "drought_config.toml";
