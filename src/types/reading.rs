//! Raw well readings as delivered by the acquisition and region-join collaborators

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One raw observation from a monitoring well.
///
/// `raw_value` is depth to water below the ground surface reference, so larger
/// numbers mean the water table is further down. `None` marks a reading the
/// source reported without a usable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub station_id: String,
    pub region_label: String,
    pub timestamp: NaiveDate,
    pub raw_value: Option<f64>,
}

impl Reading {
    pub fn new(
        station_id: impl Into<String>,
        region_label: impl Into<String>,
        timestamp: NaiveDate,
        raw_value: Option<f64>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            region_label: region_label.into(),
            timestamp,
            raw_value,
        }
    }
}

/// A reading that survived the filter, converted to elevation (negated depth).
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredReading {
    pub station_id: String,
    pub region_label: String,
    pub date: NaiveDate,
    pub elevation: f64,
}

/// Identity of one well series.
///
/// Wells are partitioned by region as well as station so that a station
/// carrying two region labels never mixes both histories in one series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WellKey {
    pub region_label: String,
    pub station_id: String,
}

impl WellKey {
    pub fn new(region_label: impl Into<String>, station_id: impl Into<String>) -> Self {
        Self {
            region_label: region_label.into(),
            station_id: station_id.into(),
        }
    }
}

impl std::fmt::Display for WellKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.station_id, self.region_label)
    }
}
