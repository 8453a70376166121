//! Regional Aggregator
//!
//! Rolls the scored well records up to one row per `(region, anchor date)` for
//! each requested statistic kind, then re-ranks the aggregated percentile
//! columns within each kind.
//!
//! Aggregated percentiles pile up around 0.5 because extremes cancel across
//! wells. The `_corrected` columns spread them back out by ranking each row's
//! value against every other row of the same kind.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::percentile::{average_rank_pct, quantile_sorted};
use crate::types::{RegionalStat, SemesterField, SemesterRecord, StatKind};

const FIELD_COUNT: usize = SemesterField::ALL.len();

/// Records sharing a region and anchor date.
struct RegionGroup<'a> {
    records: Vec<&'a SemesterRecord>,
    /// Ascending finite values, one vector per `SemesterField::ALL` entry.
    sorted: [Vec<f64>; FIELD_COUNT],
}

impl<'a> RegionGroup<'a> {
    fn new(records: Vec<&'a SemesterRecord>) -> Self {
        let sorted = SemesterField::ALL.map(|field| {
            let mut values: Vec<f64> = records
                .iter()
                .filter_map(|r| r.get(field))
                .filter(|v| v.is_finite())
                .collect();
            values.sort_by(f64::total_cmp);
            values
        });
        Self { records, sorted }
    }

    fn quantiles(&self, q: f64) -> [Option<f64>; FIELD_COUNT] {
        std::array::from_fn(|i| quantile_sorted(&self.sorted[i], q))
    }
}

/// Aggregate well records into regional statistic rows.
///
/// Rows come out sorted by `(stat, region_label, anchor_date)`. Duplicate
/// entries in `stat_kinds` are ignored.
pub fn aggregate_regions(records: &[SemesterRecord], stat_kinds: &[StatKind]) -> Vec<RegionalStat> {
    let mut kinds = stat_kinds.to_vec();
    kinds.sort();
    kinds.dedup();

    let mut grouped: BTreeMap<(&str, NaiveDate), Vec<&SemesterRecord>> = BTreeMap::new();
    for r in records {
        grouped
            .entry((r.region_label.as_str(), r.anchor_date))
            .or_default()
            .push(r);
    }
    let groups: Vec<((&str, NaiveDate), RegionGroup<'_>)> = grouped
        .into_iter()
        .map(|(key, members)| (key, RegionGroup::new(members)))
        .collect();

    let mut rows = Vec::with_capacity(groups.len() * kinds.len());
    for &kind in &kinds {
        let first_row = rows.len();

        for ((region, anchor_date), group) in &groups {
            let Some(first) = group.records.first() else {
                continue;
            };
            let [elevation, gw_change, half_gw_change, cum_gw_change, pctl_gw_change, pctl_cum_gw_change, pctl_elevation] =
                group.quantiles(kind.quantile());

            rows.push(RegionalStat {
                stat: kind,
                region_label: (*region).to_string(),
                anchor_date: *anchor_date,
                year: first.year,
                semester: first.semester,
                elevation,
                gw_change,
                half_gw_change,
                cum_gw_change,
                pctl_gw_change,
                pctl_cum_gw_change,
                pctl_elevation,
                reporting_count: group.records.len(),
                pctl_gw_change_corrected: None,
                pctl_cum_gw_change_corrected: None,
            });
        }

        correct_percentiles(&mut rows[first_row..]);
    }

    rows
}

/// Re-rank the aggregated percentile columns among rows of one stat kind.
fn correct_percentiles(rows: &mut [RegionalStat]) {
    let change: Vec<Option<f64>> = rows.iter().map(|r| r.pctl_gw_change).collect();
    let cumulative: Vec<Option<f64>> = rows.iter().map(|r| r.pctl_cum_gw_change).collect();

    let change = average_rank_pct(&change);
    let cumulative = average_rank_pct(&cumulative);

    for ((row, c), cum) in rows.iter_mut().zip(change).zip(cumulative) {
        row.pctl_gw_change_corrected = c;
        row.pctl_cum_gw_change_corrected = cum;
    }
}
