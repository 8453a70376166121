//! Well Change Series
//!
//! Per well, on its semester records in chronological order:
//! 1. `gw_change` = elevation minus the elevation two records earlier
//! 2. Outlier clamp: an annual change beyond `max_gw_change` marks both the
//!    change and the elevation of that semester as missing
//! 3. `half_gw_change` = half the annual change (per-semester share)
//! 4. `cum_gw_change` = running sum of half changes
//!
//! The lag is positional over the records a well actually has: a semester
//! without readings has no record and is simply not counted.
//!
//! The cumulative chain starts at the third record. From there, a missing
//! change breaks it for good: every later cumulative value stays missing.
//! The chain never resumes.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::defaults::SEMESTERS_PER_YEAR;
use crate::types::SemesterRecord;

/// Outcome of the change computation for one well.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSummary {
    /// Semesters whose annual change exceeded the bound.
    pub outliers_clamped: usize,
    /// Non-missing elevations left after the clamp.
    pub valid_elevations: usize,
    /// Anchor date where the cumulative chain broke, if it did.
    pub chain_broken_at: Option<NaiveDate>,
}

/// Cumulative chain state while walking a well's records.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Chain {
    Warmup,
    Running(f64),
    Broken,
}

/// Fill `gw_change`, `half_gw_change` and `cum_gw_change` for one well.
///
/// `records` must all belong to the same well. They are sorted
/// chronologically in place.
pub fn compute_change_series(records: &mut [SemesterRecord], max_gw_change: f64) -> ChangeSummary {
    records.sort_by_key(SemesterRecord::ordinal);

    let lag = SEMESTERS_PER_YEAR;
    let original: Vec<Option<f64>> = records.iter().map(|r| r.elevation).collect();

    let mut summary = ChangeSummary::default();

    // Steps 1-3 over the whole series before the chain walk
    for (i, r) in records.iter_mut().enumerate() {
        r.gw_change = match i.checked_sub(lag).map(|j| (original[i], original[j])) {
            Some((Some(now), Some(earlier))) => Some(now - earlier),
            _ => None,
        };

        if r.gw_change.is_some_and(|c| c.abs() > max_gw_change) {
            r.gw_change = None;
            r.elevation = None;
            summary.outliers_clamped += 1;
        }

        r.half_gw_change = r.gw_change.map(|c| 0.5 * c);
    }

    // Step 4
    let mut chain = Chain::Warmup;
    for (i, r) in records.iter_mut().enumerate() {
        let next = match (chain, r.half_gw_change) {
            (Chain::Warmup, _) if i < lag => Chain::Warmup,
            (Chain::Warmup, Some(h)) => Chain::Running(h),
            (Chain::Running(c), Some(h)) => Chain::Running(c + h),
            _ => Chain::Broken,
        };
        if next == Chain::Broken && chain != Chain::Broken {
            summary.chain_broken_at = Some(r.anchor_date);
        }
        chain = next;

        r.cum_gw_change = match chain {
            Chain::Running(c) => Some(c),
            Chain::Warmup | Chain::Broken => None,
        };
    }

    summary.valid_elevations = records.iter().filter(|r| r.elevation.is_some()).count();
    summary
}

/// Coverage gate: a well is scored only if its valid elevations exceed
/// `min_coverage_fraction` of the semesters expected over `years`.
pub fn passes_coverage(valid_elevations: usize, min_coverage_fraction: f64, years: u32) -> bool {
    let expected = SEMESTERS_PER_YEAR as f64 * f64::from(years);
    valid_elevations as f64 > min_coverage_fraction * expected
}
