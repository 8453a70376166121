//! Semester buckets and the per-well, per-semester record

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ============================================================================
// Semester
// ============================================================================

/// Fixed half-year bucket: `First` is January-June, `Second` is July-December.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    /// Semester a calendar date falls in.
    pub fn of_date(date: NaiveDate) -> Self {
        if date.month() > 6 {
            Self::Second
        } else {
            Self::First
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Self::First => 1,
            Self::Second => 2,
        }
    }

    /// Anchor date reported for the semester of `year`: Mar 31 or Sep 30.
    pub fn anchor_date(self, year: i32) -> Option<NaiveDate> {
        match self {
            Self::First => NaiveDate::from_ymd_opt(year, 3, 31),
            Self::Second => NaiveDate::from_ymd_opt(year, 9, 30),
        }
    }

    /// Position on a continuous semester axis; consecutive semesters differ by 1.
    pub fn ordinal(self, year: i32) -> i64 {
        i64::from(year) * 2 + i64::from(self.number() - 1)
    }
}

impl From<Semester> for u8 {
    fn from(semester: Semester) -> Self {
        semester.number()
    }
}

impl TryFrom<u8> for Semester {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::First),
            2 => Ok(Self::Second),
            other => Err(format!("semester must be 1 or 2, got {other}")),
        }
    }
}

impl std::fmt::Display for Semester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.number())
    }
}

// ============================================================================
// Semester Record
// ============================================================================

/// One well's state for one semester.
///
/// Elevation is the negated depth to water, so a falling water table shows up
/// as a negative `gw_change`. Every numeric field is optional: `None` is the
/// explicit "missing" marker and is never coerced to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemesterRecord {
    pub station_id: String,
    pub region_label: String,
    pub year: i32,
    pub semester: Semester,
    pub anchor_date: NaiveDate,
    pub elevation: Option<f64>,
    pub gw_change: Option<f64>,
    pub half_gw_change: Option<f64>,
    pub cum_gw_change: Option<f64>,
    pub pctl_gw_change: Option<f64>,
    pub pctl_cum_gw_change: Option<f64>,
    pub pctl_elevation: Option<f64>,
}

impl SemesterRecord {
    /// Fresh record with only the semester median filled in.
    pub fn new(
        station_id: impl Into<String>,
        region_label: impl Into<String>,
        year: i32,
        semester: Semester,
        anchor_date: NaiveDate,
        elevation: Option<f64>,
    ) -> Self {
        Self {
            station_id: station_id.into(),
            region_label: region_label.into(),
            year,
            semester,
            anchor_date,
            elevation,
            gw_change: None,
            half_gw_change: None,
            cum_gw_change: None,
            pctl_gw_change: None,
            pctl_cum_gw_change: None,
            pctl_elevation: None,
        }
    }

    pub fn ordinal(&self) -> i64 {
        self.semester.ordinal(self.year)
    }

    pub fn get(&self, field: SemesterField) -> Option<f64> {
        match field {
            SemesterField::Elevation => self.elevation,
            SemesterField::GwChange => self.gw_change,
            SemesterField::HalfGwChange => self.half_gw_change,
            SemesterField::CumGwChange => self.cum_gw_change,
            SemesterField::PctlGwChange => self.pctl_gw_change,
            SemesterField::PctlCumGwChange => self.pctl_cum_gw_change,
            SemesterField::PctlElevation => self.pctl_elevation,
        }
    }
}

/// Numeric columns of a `SemesterRecord`, addressable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemesterField {
    Elevation,
    GwChange,
    HalfGwChange,
    CumGwChange,
    PctlGwChange,
    PctlCumGwChange,
    PctlElevation,
}

impl SemesterField {
    pub const ALL: [Self; 7] = [
        Self::Elevation,
        Self::GwChange,
        Self::HalfGwChange,
        Self::CumGwChange,
        Self::PctlGwChange,
        Self::PctlCumGwChange,
        Self::PctlElevation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Elevation => "elevation",
            Self::GwChange => "gw_change",
            Self::HalfGwChange => "half_gw_change",
            Self::CumGwChange => "cum_gw_change",
            Self::PctlGwChange => "pctl_gw_change",
            Self::PctlCumGwChange => "pctl_cum_gw_change",
            Self::PctlElevation => "pctl_elevation",
        }
    }
}

impl std::fmt::Display for SemesterField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
