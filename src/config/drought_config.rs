//! Drought Configuration - every indicator parameter as an operator-tunable TOML value
//!
//! Each section implements `Default` with the values the published indicator
//! uses, so running without a config file reproduces the standard product.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::defaults;
use crate::processing::percentile::BaselineWindow;
use crate::types::StatKind;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one indicator run.
///
/// Load with `DroughtConfig::load()` which searches:
/// 1. `$GW_DROUGHT_CONFIG` env var
/// 2. `./drought_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DroughtConfig {
    /// Fixed percentile baseline window
    #[serde(default)]
    pub baseline: BaselineConfig,

    /// Reading filter bounds
    #[serde(default)]
    pub filter: FilterConfig,

    /// Change series outlier and coverage controls
    #[serde(default)]
    pub change: ChangeConfig,

    /// Percentile scoring options
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Regional roll-up options
    #[serde(default)]
    pub regional: RegionalConfig,

    /// Column names of the input reading table
    #[serde(default)]
    pub input: InputConfig,

    /// Output artifact locations
    #[serde(default)]
    pub output: OutputConfig,
}

impl DroughtConfig {
    /// Load configuration using the standard search order:
    /// 1. `$GW_DROUGHT_CONFIG` environment variable
    /// 2. `./drought_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded drought config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded drought config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys are logged as warnings.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Drought config saved");
        Ok(())
    }

    /// Last date included in the analysis; today when not configured.
    pub fn end_date(&self) -> NaiveDate {
        self.filter
            .end_date
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Number of calendar years spanned by the analysis date range, inclusive.
    pub fn years_in_range(&self) -> u32 {
        let span = self.end_date().year() - self.filter.initial_date.year() + 1;
        u32::try_from(span).unwrap_or(0)
    }

    /// Validate all parameters for internal consistency.
    ///
    /// Rules:
    /// - Baseline start year must not be after the end year
    /// - Initial date must not be after the end date
    /// - Outlier bounds must be finite and positive
    /// - Coverage fraction must lie in [0, 1]
    /// - At least one statistic kind must be requested
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.baseline.start_year > self.baseline.end_year {
            errors.push(format!(
                "baseline.start_year ({}) must be <= baseline.end_year ({})",
                self.baseline.start_year, self.baseline.end_year
            ));
        }

        if let Some(end) = self.filter.end_date {
            if self.filter.initial_date > end {
                errors.push(format!(
                    "filter.initial_date ({}) must be <= filter.end_date ({end})",
                    self.filter.initial_date
                ));
            }
        }

        Self::check_positive(self.filter.max_raw_value, "filter.max_raw_value", &mut errors);
        Self::check_positive(self.change.max_gw_change, "change.max_gw_change", &mut errors);

        let coverage = self.change.min_coverage_fraction;
        if !coverage.is_finite() || !(0.0..=1.0).contains(&coverage) {
            errors.push(format!(
                "change.min_coverage_fraction = {coverage} must be within [0, 1]"
            ));
        }

        if self.regional.stat_kinds.is_empty() {
            errors.push("regional.stat_kinds must name at least one statistic".to_string());
        }

        if let RegionSubset::Only(labels) = &self.filter.region_subset {
            if labels.is_empty() {
                errors.push(
                    "filter.region_subset is an empty list; use \"all\" to keep every region"
                        .to_string(),
                );
            }
        }

        let (range_errors, range_warnings) = super::validation::validate_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} = {value} must be a finite number > 0"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Baseline
// ============================================================================

/// Fixed historical window the percentile reference distribution is drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineConfig {
    #[serde(default = "default_baseline_start")]
    pub start_year: i32,

    #[serde(default = "default_baseline_end")]
    pub end_year: i32,
}

fn default_baseline_start() -> i32 { defaults::BASELINE_START_YEAR }
fn default_baseline_end() -> i32 { defaults::BASELINE_END_YEAR }

impl BaselineConfig {
    pub fn window(&self) -> BaselineWindow {
        BaselineWindow::new(self.start_year, self.end_year)
    }
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            start_year: default_baseline_start(),
            end_year: default_baseline_end(),
        }
    }
}

// ============================================================================
// Reading Filter
// ============================================================================

/// Region allow-list: every region, or only the listed labels.
///
/// In TOML this is either the string `"all"` or an array of labels. A single
/// label string is accepted as a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "RegionSubsetRepr", into = "RegionSubsetRepr")]
pub enum RegionSubset {
    #[default]
    All,
    Only(Vec<String>),
}

impl RegionSubset {
    pub fn allows(&self, region_label: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(labels) => labels.iter().any(|l| l == region_label),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RegionSubsetRepr {
    Keyword(String),
    Labels(Vec<String>),
}

impl TryFrom<RegionSubsetRepr> for RegionSubset {
    type Error = String;

    fn try_from(repr: RegionSubsetRepr) -> Result<Self, Self::Error> {
        match repr {
            RegionSubsetRepr::Keyword(k) if k.eq_ignore_ascii_case("all") => Ok(Self::All),
            RegionSubsetRepr::Keyword(k) if k.trim().is_empty() => {
                Err("region_subset must be \"all\" or a list of region labels".to_string())
            }
            RegionSubsetRepr::Keyword(k) => Ok(Self::Only(vec![k])),
            RegionSubsetRepr::Labels(labels) => Ok(Self::Only(labels)),
        }
    }
}

impl From<RegionSubset> for RegionSubsetRepr {
    fn from(subset: RegionSubset) -> Self {
        match subset {
            RegionSubset::All => Self::Keyword("all".to_string()),
            RegionSubset::Only(labels) => Self::Labels(labels),
        }
    }
}

/// Which readings enter the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// First reading date included (inclusive). Quote it in TOML: `"1990-01-01"`.
    #[serde(default = "default_initial_date")]
    pub initial_date: NaiveDate,

    /// Last reading date included (inclusive). Absent means today.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Region allow-list.
    #[serde(default)]
    pub region_subset: RegionSubset,

    /// Readings with a depth to water above this bound are dropped (ft).
    #[serde(default = "default_max_raw_value")]
    pub max_raw_value: f64,
}

fn default_initial_date() -> NaiveDate {
    let (y, m, d) = defaults::INITIAL_DATE_YMD;
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}
fn default_max_raw_value() -> f64 { defaults::MAX_RAW_VALUE }

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            initial_date: default_initial_date(),
            end_date: None,
            region_subset: RegionSubset::All,
            max_raw_value: default_max_raw_value(),
        }
    }
}

// ============================================================================
// Change Series
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeConfig {
    /// Annual changes with a larger magnitude are treated as erroneous (ft).
    #[serde(default = "default_max_gw_change")]
    pub max_gw_change: f64,

    /// Minimum fraction of expected semesters with a valid elevation.
    #[serde(default = "default_min_coverage")]
    pub min_coverage_fraction: f64,
}

fn default_max_gw_change() -> f64 { defaults::MAX_GW_CHANGE }
fn default_min_coverage() -> f64 { defaults::MIN_COVERAGE_FRACTION }

impl Default for ChangeConfig {
    fn default() -> Self {
        Self {
            max_gw_change: default_max_gw_change(),
            min_coverage_fraction: default_min_coverage(),
        }
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Reference set used when scoring `cum_gw_change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CumPercentileMode {
    /// Score against the well's whole series.
    #[default]
    FullSeries,
    /// Score each semester against that semester's values only.
    PerSemester,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub cum_percentile_mode: CumPercentileMode,
}

// ============================================================================
// Regional
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalConfig {
    /// Statistics computed per region and date.
    #[serde(default = "default_stat_kinds")]
    pub stat_kinds: Vec<StatKind>,
}

fn default_stat_kinds() -> Vec<StatKind> {
    StatKind::ALL.to_vec()
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            stat_kinds: default_stat_kinds(),
        }
    }
}

// ============================================================================
// Input / Output
// ============================================================================

/// Column names of the reading table (and the optional station table).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "default_station_id_column")]
    pub station_id_column: String,

    /// Region label column; also the region allow-list column.
    #[serde(default = "default_region_column")]
    pub region_column: String,

    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Depth-to-water column.
    #[serde(default = "default_value_column")]
    pub value_column: String,

    /// Key shared by the reading table and the station table when region
    /// labels come from a separate station file.
    #[serde(default = "default_station_join_column")]
    pub station_join_column: String,
}

fn default_station_id_column() -> String { defaults::STATION_ID_COLUMN.to_string() }
fn default_region_column() -> String { defaults::REGION_COLUMN.to_string() }
fn default_date_column() -> String { defaults::DATE_COLUMN.to_string() }
fn default_value_column() -> String { defaults::VALUE_COLUMN.to_string() }
fn default_station_join_column() -> String { defaults::STATION_JOIN_COLUMN.to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            station_id_column: default_station_id_column(),
            region_column: default_region_column(),
            date_column: default_date_column(),
            value_column: default_value_column(),
            station_join_column: default_station_join_column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,

    #[serde(default = "default_wells_file")]
    pub wells_file: String,

    #[serde(default = "default_regional_file")]
    pub regional_file: String,
}

fn default_output_directory() -> PathBuf { PathBuf::from(defaults::OUTPUT_DIRECTORY) }
fn default_wells_file() -> String { defaults::WELLS_FILE.to_string() }
fn default_regional_file() -> String { defaults::REGIONAL_FILE.to_string() }

impl OutputConfig {
    pub fn wells_path(&self) -> PathBuf {
        self.directory.join(&self.wells_file)
    }

    pub fn regional_path(&self) -> PathBuf {
        self.directory.join(&self.regional_file)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            wells_file: default_wells_file(),
            regional_file: default_regional_file(),
        }
    }
}
