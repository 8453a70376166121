//! Baseline Percentile Scorer
//!
//! Scores values against a reference distribution drawn from a fixed
//! historical window of years. The window never moves with the data, so a
//! record from 2023 and one from 1995 are judged against the same baseline.
//!
//! Ties follow the percentile-of-score "mean" convention: the share of
//! baseline values strictly below the score plus half the share equal to it.
//! A score equal to every baseline value therefore lands at 0.5, not at an
//! extreme.
//!
//! Also hosts the rank and quantile helpers used by the regional roll-up.

use statrs::statistics::{Data, OrderStatistics, RankTieBreaker};

use crate::types::{SemesterField, SemesterRecord};

/// Inclusive range of baseline years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaselineWindow {
    pub start_year: i32,
    pub end_year: i32,
}

impl BaselineWindow {
    pub fn new(start_year: i32, end_year: i32) -> Self {
        Self {
            start_year,
            end_year,
        }
    }

    pub fn contains(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }
}

/// Sorted, finite reference values.
#[derive(Debug, Clone, Default)]
pub struct BaselineDistribution {
    sorted: Vec<f64>,
}

impl BaselineDistribution {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted }
    }

    /// Reference distribution of `field` over the records whose year is in `window`.
    pub fn for_field<'a>(
        records: impl IntoIterator<Item = &'a SemesterRecord>,
        field: SemesterField,
        window: &BaselineWindow,
    ) -> Self {
        Self::from_values(
            records
                .into_iter()
                .filter(|r| window.contains(r.year))
                .filter_map(|r| r.get(field)),
        )
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Percentile of `value` in `[0, 1]`, or `None` when the baseline is empty
    /// or the value is not finite.
    pub fn percentile_of_score(&self, value: f64) -> Option<f64> {
        if self.sorted.is_empty() || !value.is_finite() {
            return None;
        }
        let below = self.sorted.partition_point(|v| *v < value);
        let not_above = self.sorted.partition_point(|v| *v <= value);
        let ties = not_above - below;
        Some((below as f64 + 0.5 * ties as f64) / self.sorted.len() as f64)
    }
}

/// Score `field` of every record against the baseline built from the same records.
///
/// Records outside the window are scored too; they just do not contribute to
/// the reference. Missing values score as missing, and an empty baseline
/// makes every output missing.
pub fn score(
    records: &[SemesterRecord],
    field: SemesterField,
    window: &BaselineWindow,
) -> Vec<Option<f64>> {
    let baseline = BaselineDistribution::for_field(records, field, window);
    records
        .iter()
        .map(|r| r.get(field).and_then(|v| baseline.percentile_of_score(v)))
        .collect()
}

// ============================================================================
// Rank / Quantile Helpers
// ============================================================================

/// Percentile rank of each value among the non-missing values, average rank
/// for ties, scaled by the number of non-missing values (result in `(0, 1]`).
pub fn average_rank_pct(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let (indices, present): (Vec<usize>, Vec<f64>) = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| (*v).filter(|x| x.is_finite()).map(|x| (i, x)))
        .unzip();

    let n = present.len() as f64;
    let mut ranks = vec![None; values.len()];
    for (idx, rank) in indices
        .into_iter()
        .zip(Data::new(present).ranks(RankTieBreaker::Average))
    {
        ranks[idx] = Some(rank / n);
    }
    ranks
}

/// Quantile `q` of ascending `sorted` values with linear interpolation
/// between the two nearest order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
