//! Regional roll-up rows

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::Semester;

/// Statistic used to summarise the wells of one region on one date.
///
/// Declaration order is the output sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Median,
    #[serde(alias = "perc25")]
    P25,
    #[serde(alias = "perc75")]
    P75,
}

impl StatKind {
    pub const ALL: [Self; 3] = [Self::Median, Self::P25, Self::P75];

    /// Quantile level in `[0, 1]`.
    pub fn quantile(self) -> f64 {
        match self {
            Self::Median => 0.5,
            Self::P25 => 0.25,
            Self::P75 => 0.75,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Median => "median",
            Self::P25 => "p25",
            Self::P75 => "p75",
        }
    }
}

impl std::fmt::Display for StatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "median" => Ok(Self::Median),
            "p25" | "perc25" => Ok(Self::P25),
            "p75" | "perc75" => Ok(Self::P75),
            other => Err(format!(
                "unknown statistic '{other}' (expected median, p25 or p75)"
            )),
        }
    }
}

/// One aggregation row: a statistic over all wells of a region at one anchor date.
///
/// The numeric columns carry the same names as the well-level record. The two
/// `_corrected` columns re-rank the aggregated percentiles against every other
/// row of the same statistic kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalStat {
    pub stat: StatKind,
    pub region_label: String,
    pub anchor_date: NaiveDate,
    pub year: i32,
    pub semester: Semester,
    pub elevation: Option<f64>,
    pub gw_change: Option<f64>,
    pub half_gw_change: Option<f64>,
    pub cum_gw_change: Option<f64>,
    pub pctl_gw_change: Option<f64>,
    pub pctl_cum_gw_change: Option<f64>,
    pub pctl_elevation: Option<f64>,
    pub reporting_count: usize,
    pub pctl_gw_change_corrected: Option<f64>,
    pub pctl_cum_gw_change_corrected: Option<f64>,
}
