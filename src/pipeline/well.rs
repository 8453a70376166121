//! Per-well worker: change series, coverage gate and baseline scoring
//!
//! Each call owns one well's records and touches nothing else, so the
//! coordinator can fan wells out across threads without locks.

use tracing::debug;

use crate::config::{CumPercentileMode, DroughtConfig};
use crate::processing::{
    compute_change_series, passes_coverage, BaselineDistribution, BaselineWindow,
    ChangeSummary,
};
use crate::types::{Semester, SemesterField, SemesterRecord, WellKey};

/// Read-only run parameters shared by every well worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WellParams {
    pub max_gw_change: f64,
    pub min_coverage_fraction: f64,
    pub years_in_range: u32,
    pub baseline: BaselineWindow,
    pub cum_percentile_mode: CumPercentileMode,
}

impl WellParams {
    pub fn from_config(config: &DroughtConfig) -> Self {
        Self {
            max_gw_change: config.change.max_gw_change,
            min_coverage_fraction: config.change.min_coverage_fraction,
            years_in_range: config.years_in_range(),
            baseline: config.baseline.window(),
            cum_percentile_mode: config.scoring.cum_percentile_mode,
        }
    }
}

/// What became of one well.
#[derive(Debug, Clone, PartialEq)]
pub enum WellOutcome {
    /// Passed the coverage gate; records carry every computed field.
    Scored {
        records: Vec<SemesterRecord>,
        changes: ChangeSummary,
        /// Scored columns whose baseline window held no values.
        empty_baselines: usize,
    },
    /// Too few valid elevations; the well contributes no rows.
    Excluded {
        changes: ChangeSummary,
    },
}

impl WellOutcome {
    pub fn changes(&self) -> &ChangeSummary {
        match self {
            Self::Scored { changes, .. } | Self::Excluded { changes } => changes,
        }
    }
}

/// Run stages 3 and 4 on one well's semester records.
pub fn process_well(key: &WellKey, mut records: Vec<SemesterRecord>, params: &WellParams) -> WellOutcome {
    let changes = compute_change_series(&mut records, params.max_gw_change);

    if !passes_coverage(
        changes.valid_elevations,
        params.min_coverage_fraction,
        params.years_in_range,
    ) {
        debug!(
            well = %key,
            valid_elevations = changes.valid_elevations,
            "Well excluded by coverage gate"
        );
        return WellOutcome::Excluded { changes };
    }

    if let Some(date) = changes.chain_broken_at {
        debug!(well = %key, %date, "Cumulative change chain broken");
    }

    let mut empty_baselines = 0;

    empty_baselines += score_full_series(key, &mut records, SemesterField::GwChange, &params.baseline);
    empty_baselines += match params.cum_percentile_mode {
        CumPercentileMode::FullSeries => {
            score_full_series(key, &mut records, SemesterField::CumGwChange, &params.baseline)
        }
        CumPercentileMode::PerSemester => {
            score_per_semester(key, &mut records, SemesterField::CumGwChange, &params.baseline)
        }
    };
    empty_baselines += score_per_semester(key, &mut records, SemesterField::Elevation, &params.baseline);

    WellOutcome::Scored {
        records,
        changes,
        empty_baselines,
    }
}

/// Percentile column filled from a given value column.
fn percentile_slot(record: &mut SemesterRecord, field: SemesterField) -> Option<&mut Option<f64>> {
    match field {
        SemesterField::GwChange => Some(&mut record.pctl_gw_change),
        SemesterField::CumGwChange => Some(&mut record.pctl_cum_gw_change),
        SemesterField::Elevation => Some(&mut record.pctl_elevation),
        _ => None,
    }
}

/// Score `field` across the whole series. Returns 1 if the baseline was empty.
fn score_full_series(
    key: &WellKey,
    records: &mut [SemesterRecord],
    field: SemesterField,
    window: &BaselineWindow,
) -> usize {
    let baseline = BaselineDistribution::for_field(records.iter(), field, window);
    for record in records.iter_mut() {
        let pctl = record.get(field).and_then(|v| baseline.percentile_of_score(v));
        if let Some(slot) = percentile_slot(record, field) {
            *slot = pctl;
        }
    }

    if baseline.is_empty() {
        debug!(well = %key, column = %field, "Empty baseline window");
        1
    } else {
        0
    }
}

/// Score `field` within each semester's own records. Returns the number of
/// semesters whose baseline was empty.
fn score_per_semester(
    key: &WellKey,
    records: &mut [SemesterRecord],
    field: SemesterField,
    window: &BaselineWindow,
) -> usize {
    let mut empty = 0;
    for semester in [Semester::First, Semester::Second] {
        if !records.iter().any(|r| r.semester == semester) {
            continue;
        }

        let baseline =
            BaselineDistribution::for_field(records.iter().filter(|r| r.semester == semester), field, window);
        if baseline.is_empty() {
            debug!(well = %key, column = %field, %semester, "Empty baseline window");
            empty += 1;
        }

        for record in records.iter_mut().filter(|r| r.semester == semester) {
            let pctl = record.get(field).and_then(|v| baseline.percentile_of_score(v));
            if let Some(slot) = percentile_slot(record, field) {
                *slot = pctl;
            }
        }
    }
    empty
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> WellParams {
        WellParams {
            max_gw_change: 30.0,
            min_coverage_fraction: 0.0,
            years_in_range: 4,
            baseline: BaselineWindow::new(2000, 2003),
            cum_percentile_mode: CumPercentileMode::FullSeries,
        }
    }

    fn series(elevations: &[f64]) -> Vec<SemesterRecord> {
        elevations
            .iter()
            .enumerate()
            .map(|(i, &e)| {
                let year = 2000 + (i / 2) as i32;
                let semester = if i % 2 == 0 { Semester::First } else { Semester::Second };
                SemesterRecord::new("W1", "North", year, semester, semester.anchor_date(year).unwrap(), Some(e))
            })
            .collect()
    }

    fn key() -> WellKey {
        WellKey::new("North", "W1")
    }

    #[test]
    fn test_flat_well_scores_half() {
        let outcome = process_well(&key(), series(&[10.0; 8]), &params());
        let WellOutcome::Scored { records, empty_baselines, .. } = outcome else {
            panic!("flat well should be scored");
        };
        assert_eq!(empty_baselines, 0);
        for r in &records[2..] {
            assert_eq!(r.pctl_gw_change, Some(0.5));
            assert_eq!(r.pctl_cum_gw_change, Some(0.5));
        }
        assert_eq!(records[0].pctl_gw_change, None);
        assert!(records.iter().all(|r| r.pctl_elevation == Some(0.5)));
    }

    #[test]
    fn test_elevation_scored_within_semester() {
        // S1 readings always low, S2 always high; each is the median of its own season
        let outcome = process_well(&key(), series(&[1.0, 9.0, 2.0, 8.0, 3.0, 7.0]), &params());
        let WellOutcome::Scored { records, .. } = outcome else {
            panic!("well should be scored");
        };
        // 2.0 is the middle of {1, 2, 3}, 8.0 the middle of {7, 8, 9}
        assert!((records[2].pctl_elevation.unwrap() - 0.5).abs() < 1e-12);
        assert!((records[3].pctl_elevation.unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_low_coverage_well_is_excluded() {
        let mut p = params();
        p.min_coverage_fraction = 0.5; // needs > 4 of 8 semesters
        let outcome = process_well(&key(), series(&[1.0, 1.0, 1.0, 1.0]), &p);
        assert!(matches!(outcome, WellOutcome::Excluded { .. }));
        assert_eq!(outcome.changes().valid_elevations, 4);
    }

    #[test]
    fn test_baseline_outside_series_leaves_percentiles_missing() {
        let mut p = params();
        p.baseline = BaselineWindow::new(1991, 1995);
        let outcome = process_well(&key(), series(&[1.0, 2.0, 3.0, 4.0]), &p);
        let WellOutcome::Scored { records, empty_baselines, .. } = outcome else {
            panic!("well should be scored");
        };
        // gw_change, cum_gw_change, elevation S1, elevation S2
        assert_eq!(empty_baselines, 4);
        assert!(records.iter().all(|r| r.pctl_gw_change.is_none()
            && r.pctl_cum_gw_change.is_none()
            && r.pctl_elevation.is_none()));
        // the values themselves are still there
        assert_eq!(records[2].gw_change, Some(2.0));
    }

    #[test]
    fn test_per_semester_cumulative_mode() {
        let mut p = params();
        p.cum_percentile_mode = CumPercentileMode::PerSemester;
        let outcome = process_well(&key(), series(&[0.0, 0.0, 2.0, 4.0, 4.0, 8.0]), &p);
        let WellOutcome::Scored { records, .. } = outcome else {
            panic!("well should be scored");
        };
        // S1 cumulative {1, 4} and S2 cumulative {3, 6} ranked separately
        assert_eq!(records[2].pctl_cum_gw_change, Some(0.25));
        assert_eq!(records[4].pctl_cum_gw_change, Some(0.75));
        assert_eq!(records[3].pctl_cum_gw_change, Some(0.25));
        assert_eq!(records[5].pctl_cum_gw_change, Some(0.75));
    }

    #[test]
    fn test_full_series_scored_against_window_only() {
        let mut p = params();
        p.baseline = BaselineWindow::new(2000, 2001);
        let outcome = process_well(&key(), series(&[0.0, 0.0, 2.0, 2.0, 4.0, 4.0, 10.0, 10.0]), &p);
        let WellOutcome::Scored { records, empty_baselines, .. } = outcome else {
            panic!("well should be scored");
        };
        assert_eq!(empty_baselines, 0);
        // baseline changes are {2, 2}; the 2003 jump of 6 sits above all of them
        assert_eq!(records[2].pctl_gw_change, Some(0.5));
        assert_eq!(records[6].pctl_gw_change, Some(1.0));
        assert_eq!(records[7].pctl_cum_gw_change, Some(1.0));
    }

    #[test]
    fn test_missing_semester_keeps_cumulative_scored() {
        let mut records = series(&[5.0, 5.0, 6.0, 6.0, 7.0, 7.0, 8.0, 8.0]);
        records.remove(3);
        let outcome = process_well(&key(), records, &params());
        let WellOutcome::Scored { records, changes, .. } = outcome else {
            panic!("well should be scored");
        };
        assert_eq!(changes.chain_broken_at, None);
        assert_eq!(records[6].cum_gw_change, Some(3.0));
        assert!(records[2..].iter().all(|r| r.pctl_cum_gw_change.is_some()));
    }
}
