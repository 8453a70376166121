//! Indicator Property Tests
//!
//! Invariants that must hold for any input, checked over a deterministic
//! family of irregular synthetic wells: gaps, outliers, out-of-bound
//! readings and wells too sparse to score.

use chrono::NaiveDate;
use gw_drought::config::DroughtConfig;
use gw_drought::processing::percentile::average_rank_pct;
use gw_drought::processing::{aggregate_regions, aggregate_semesters, compute_change_series};
use gw_drought::types::{FilteredReading, Semester, SemesterRecord};
use gw_drought::{DroughtPipeline, Reading, StatKind};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Small deterministic linear congruential sequence in `[0, 1)`.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Readings for `wells` wells across four regions, 1995-2014, with random
/// gaps, occasional spikes and occasional out-of-bound depths.
fn irregular_readings(seed: u64, wells: usize) -> Vec<Reading> {
    let mut rng = Lcg(seed);
    let regions = ["North", "South", "East", "West"];
    let mut readings = Vec::new();

    for w in 0..wells {
        let station = format!("W{w}");
        let region = regions[w % regions.len()];
        let mut depth = 40.0 + 60.0 * rng.next();
        // every fifth well is sparse
        let keep_prob = if w % 5 == 4 { 0.1 } else { 0.9 };

        for year in 1995..=2014 {
            for month in [1, 4, 7, 10] {
                if rng.next() > keep_prob {
                    continue;
                }
                depth += 4.0 * (rng.next() - 0.5);
                let roll = rng.next();
                let value = if roll < 0.03 {
                    Some(depth + 80.0) // spike, beyond the change bound
                } else if roll < 0.05 {
                    Some(350.0) // beyond the raw-value bound
                } else if roll < 0.07 {
                    None
                } else {
                    Some(depth)
                };
                readings.push(Reading::new(&station, region, date(year, month, 15), value));
            }
        }
    }
    readings
}

fn config() -> DroughtConfig {
    let mut config = DroughtConfig::default();
    config.baseline.start_year = 1995;
    config.baseline.end_year = 2009;
    config.filter.initial_date = date(1995, 1, 1);
    config.filter.end_date = Some(date(2014, 12, 31));
    config.change.min_coverage_fraction = 0.5;
    config
}

fn records_by_well(records: &[SemesterRecord]) -> Vec<Vec<&SemesterRecord>> {
    let mut wells: Vec<Vec<&SemesterRecord>> = Vec::new();
    for r in records {
        match wells.last_mut() {
            Some(current)
                if current[0].station_id == r.station_id && current[0].region_label == r.region_label =>
            {
                current.push(r)
            }
            _ => wells.push(vec![r]),
        }
    }
    wells
}

#[test]
fn cumulative_missing_once_any_change_is_missing() {
    for seed in 1..=5 {
        let output = DroughtPipeline::new(config()).run(&irregular_readings(seed, 20)).unwrap();
        for well in records_by_well(&output.wells) {
            let started = well.iter().position(|r| r.cum_gw_change.is_some());
            let Some(start) = started else { continue };
            let mut broken = false;
            for r in &well[start..] {
                if r.gw_change.is_none() {
                    broken = true;
                }
                if broken {
                    assert!(r.cum_gw_change.is_none(), "cumulative resumed at {} {}", r.station_id, r.anchor_date);
                }
            }
        }
    }
}

#[test]
fn percentiles_stay_in_unit_interval() {
    for seed in 1..=5 {
        let output = DroughtPipeline::new(config()).run(&irregular_readings(seed, 20)).unwrap();
        let well_values = output.wells.iter().flat_map(|r| {
            [r.pctl_gw_change, r.pctl_cum_gw_change, r.pctl_elevation]
        });
        let regional_values = output.regional.iter().flat_map(|r| {
            [
                r.pctl_gw_change,
                r.pctl_cum_gw_change,
                r.pctl_elevation,
                r.pctl_gw_change_corrected,
                r.pctl_cum_gw_change_corrected,
            ]
        });
        for v in well_values.chain(regional_values).flatten() {
            assert!((0.0..=1.0).contains(&v), "percentile {v} outside [0, 1]");
        }
    }
}

#[test]
fn out_of_bound_readings_never_reach_a_record() {
    // A semester holding only an out-of-bound reading must produce no record
    let readings = vec![
        Reading::new("W1", "North", date(2000, 2, 1), Some(10.0)),
        Reading::new("W1", "North", date(2000, 8, 1), Some(301.0)),
        Reading::new("W1", "North", date(2001, 2, 1), Some(11.0)),
    ];
    let mut config = config();
    config.change.min_coverage_fraction = 0.0;
    let output = DroughtPipeline::new(config).run(&readings).unwrap();

    assert_eq!(output.summary.filter.above_bound, 1);
    assert!(output.wells.iter().all(|r| r.semester == Semester::First));
    assert!(output
        .wells
        .iter()
        .filter_map(|r| r.elevation)
        .all(|e| e >= -300.0));
}

#[test]
fn sparse_wells_produce_no_records() {
    let readings = irregular_readings(7, 20);
    let output = DroughtPipeline::new(config()).run(&readings).unwrap();
    assert!(output.summary.wells_excluded > 0);
    assert_eq!(
        output.summary.wells_scored + output.summary.wells_excluded,
        output.summary.wells_total
    );

    // Every emitted well clears the gate: > 0.5 x 2 x 20 valid elevations
    for well in records_by_well(&output.wells) {
        let valid = well.iter().filter(|r| r.elevation.is_some()).count();
        assert!(valid > 20, "{} has only {valid} valid elevations", well[0].station_id);
    }
}

#[test]
fn clamped_outliers_leave_elevation_missing() {
    let readings: Vec<FilteredReading> = [10.0, 10.0, 10.0, 100.0, 100.0, 100.0, 100.0, 100.0]
        .iter()
        .enumerate()
        .map(|(i, &e)| FilteredReading {
            station_id: "W2".to_string(),
            region_label: "North".to_string(),
            date: date(2000 + (i / 2) as i32, if i % 2 == 0 { 2 } else { 8 }, 1),
            elevation: e,
        })
        .collect();
    let mut records = aggregate_semesters(&readings);
    compute_change_series(&mut records, 30.0);

    assert_eq!(records[3].gw_change, None);
    assert_eq!(records[3].elevation, None);
    assert!(records[3..].iter().all(|r| r.cum_gw_change.is_none()));
}

#[test]
fn rank_correction_is_monotonic_and_spreads() {
    let output = DroughtPipeline::new(config()).run(&irregular_readings(11, 40)).unwrap();
    let medians: Vec<_> = output
        .regional
        .iter()
        .filter(|r| r.stat == StatKind::Median)
        .collect();
    assert!(medians.len() >= 10);

    // order preserving: a strictly larger input never ranks lower
    for a in &medians {
        for b in &medians {
            if let (Some(x), Some(y), Some(cx), Some(cy)) = (
                a.pctl_gw_change,
                b.pctl_gw_change,
                a.pctl_gw_change_corrected,
                b.pctl_gw_change_corrected,
            ) {
                if x < y {
                    assert!(cx < cy);
                }
            }
        }
    }

    // closer to uniform: more of the ten deciles are populated
    let deciles = |values: &mut dyn Iterator<Item = f64>| {
        let mut hit = [false; 10];
        for v in values {
            hit[((v * 10.0) as usize).min(9)] = true;
        }
        hit.iter().filter(|h| **h).count()
    };
    let raw = deciles(&mut medians.iter().filter_map(|r| r.pctl_gw_change));
    let corrected = deciles(&mut medians.iter().filter_map(|r| r.pctl_gw_change_corrected));
    assert!(corrected >= raw, "corrected spans {corrected} deciles, raw {raw}");
    assert!(corrected >= 8);
}

#[test]
fn flat_well_scores_half_not_extreme() {
    let readings: Vec<Reading> = (2000..2004)
        .flat_map(|y| {
            [
                Reading::new("W1", "North", date(y, 3, 1), Some(10.0)),
                Reading::new("W1", "North", date(y, 9, 1), Some(10.0)),
            ]
        })
        .collect();
    let mut config = config();
    config.baseline.start_year = 2000;
    config.baseline.end_year = 2003;
    config.filter.initial_date = date(2000, 1, 1);
    config.filter.end_date = Some(date(2003, 12, 31));

    let output = DroughtPipeline::new(config).run(&readings).unwrap();
    assert_eq!(output.wells.len(), 8);
    for r in &output.wells[2..] {
        assert_eq!(r.gw_change, Some(0.0));
        assert_eq!(r.cum_gw_change, Some(0.0));
        assert_eq!(r.pctl_gw_change, Some(0.5));
    }
}

#[test]
fn corrected_ranks_match_direct_ranking() {
    let records: Vec<SemesterRecord> = (0..12)
        .map(|i| {
            let mut r = SemesterRecord::new(
                "W1",
                "North",
                2000 + i,
                Semester::Second,
                date(2000 + i, 9, 30),
                Some(0.0),
            );
            r.pctl_cum_gw_change = Some(0.4 + 0.02 * f64::from(i % 5));
            r
        })
        .collect();
    let rows = aggregate_regions(&records, &[StatKind::P25]);
    let expected = average_rank_pct(&rows.iter().map(|r| r.pctl_cum_gw_change).collect::<Vec<_>>());
    let actual: Vec<_> = rows.iter().map(|r| r.pctl_cum_gw_change_corrected).collect();
    assert_eq!(actual, expected);
}
