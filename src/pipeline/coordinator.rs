//! Pipeline Coordinator - Five-Stage Drought Indicator Run
//!
//! ```text
//! STAGE 1: Reading Filter (region, date window, raw-value bound)
//! STAGE 2: Semester Aggregator (median elevation per well-semester)
//! STAGE 3: Well Change Series  ┐ per well, in parallel,
//! STAGE 4: Percentile Scoring  ┘ one worker per well
//! STAGE 5: Regional Aggregator (after every well has finished)
//! ```
//!
//! Stage 5 is a barrier: it only runs on the merged output of all wells.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info};

use super::well::{process_well, WellOutcome, WellParams};
use crate::config::DroughtConfig;
use crate::processing::reading_filter::FilterParams;
use crate::processing::{aggregate_regions, aggregate_semesters, filter_readings, FilterReport, ProcessingError};
use crate::types::{Reading, RegionalStat, SemesterRecord, WellKey};

/// Runs the full indicator computation for one configuration.
pub struct DroughtPipeline {
    config: DroughtConfig,
}

/// Everything a run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Scored well records ordered by station, region, then date.
    pub wells: Vec<SemesterRecord>,
    /// Regional rows ordered by stat kind, region, then date.
    pub regional: Vec<RegionalStat>,
    pub summary: RunSummary,
}

/// Wall time of one pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub elapsed_ms: f64,
}

/// Counts collected over a run, reported to the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub filter: FilterReport,
    pub semester_records: usize,
    pub wells_total: usize,
    pub wells_scored: usize,
    pub wells_excluded: usize,
    pub outliers_clamped: usize,
    pub chains_broken: usize,
    pub empty_baselines: usize,
    pub well_rows: usize,
    pub regional_rows: usize,
    pub stage_timings: Vec<StageTiming>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Run: {} readings ({} kept), {} wells ({} scored, {} excluded), {} well rows, {} regional rows",
            self.filter.input,
            self.filter.kept,
            self.wells_total,
            self.wells_scored,
            self.wells_excluded,
            self.well_rows,
            self.regional_rows
        )
    }
}

impl DroughtPipeline {
    pub fn new(config: DroughtConfig) -> Self {
        Self { config }
    }

    /// Run all five stages over `readings`.
    ///
    /// Fails only on run-level configuration problems; wells without enough
    /// data are excluded and counted in the summary.
    pub fn run(&self, readings: &[Reading]) -> Result<PipelineOutput, ProcessingError> {
        info!(
            readings = readings.len(),
            baseline_start = self.config.baseline.start_year,
            baseline_end = self.config.baseline.end_year,
            "Starting drought indicator run"
        );
        let mut summary = RunSummary::default();

        // STAGE 1
        let filter_params = FilterParams::from_config(&self.config);
        let (filtered, report) = timed(&mut summary, "reading_filter", || {
            filter_readings(readings, &filter_params)
        })?;
        summary.filter = report;

        // STAGE 2
        let semesters = timed(&mut summary, "semester_aggregation", || {
            aggregate_semesters(&filtered)
        });
        summary.semester_records = semesters.len();
        drop(filtered);

        // STAGE 3-4
        let params = WellParams::from_config(&self.config);
        let outcomes = timed(&mut summary, "well_scoring", || {
            partition_wells(semesters)
                .into_par_iter()
                .map(|(key, records)| process_well(&key, records, &params))
                .collect::<Vec<_>>()
        });

        summary.wells_total = outcomes.len();
        let mut wells = Vec::with_capacity(summary.semester_records);
        for outcome in outcomes {
            summary.outliers_clamped += outcome.changes().outliers_clamped;
            if outcome.changes().chain_broken_at.is_some() {
                summary.chains_broken += 1;
            }
            match outcome {
                WellOutcome::Scored {
                    records,
                    empty_baselines,
                    ..
                } => {
                    summary.wells_scored += 1;
                    summary.empty_baselines += empty_baselines;
                    wells.extend(records);
                }
                WellOutcome::Excluded { .. } => summary.wells_excluded += 1,
            }
        }
        wells.sort_by(|a, b| {
            (&a.station_id, &a.region_label, a.anchor_date)
                .cmp(&(&b.station_id, &b.region_label, b.anchor_date))
        });
        summary.well_rows = wells.len();
        info!(
            scored = summary.wells_scored,
            excluded = summary.wells_excluded,
            outliers = summary.outliers_clamped,
            "Well series scored"
        );

        // STAGE 5
        let regional = timed(&mut summary, "regional_aggregation", || {
            aggregate_regions(&wells, &self.config.regional.stat_kinds)
        });
        summary.regional_rows = regional.len();

        info!("{}", summary);
        Ok(PipelineOutput {
            wells,
            regional,
            summary,
        })
    }
}

/// Split semester records into one owned series per well.
fn partition_wells(records: Vec<SemesterRecord>) -> Vec<(WellKey, Vec<SemesterRecord>)> {
    let mut wells: BTreeMap<WellKey, Vec<SemesterRecord>> = BTreeMap::new();
    for record in records {
        wells
            .entry(WellKey::new(record.region_label.as_str(), record.station_id.as_str()))
            .or_default()
            .push(record);
    }
    debug!(wells = wells.len(), "Semester records partitioned by well");
    wells.into_iter().collect()
}

/// Run one stage, log and record its wall time.
fn timed<T>(summary: &mut RunSummary, stage: &str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    info!(stage, elapsed_ms, "Stage complete");
    summary.stage_timings.push(StageTiming {
        stage: stage.to_string(),
        elapsed_ms,
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegionSubset;
    use crate::types::StatKind;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn test_config() -> DroughtConfig {
        let mut config = DroughtConfig::default();
        config.baseline.start_year = 2000;
        config.baseline.end_year = 2004;
        config.filter.initial_date = date(2000, 1, 1);
        config.filter.end_date = Some(date(2004, 12, 31));
        config
    }

    /// One reading per semester at constant depth.
    fn flat_well(station: &str, region: &str, depth: f64) -> Vec<Reading> {
        (2000..=2004)
            .flat_map(|y| {
                [
                    Reading::new(station, region, date(y, 2, 15), Some(depth)),
                    Reading::new(station, region, date(y, 8, 15), Some(depth)),
                ]
            })
            .collect()
    }

    #[test]
    fn test_run_produces_wells_and_regions() {
        let mut readings = flat_well("W1", "North", 10.0);
        readings.extend(flat_well("W2", "North", 20.0));
        readings.extend(flat_well("W3", "South", 15.0));

        let output = DroughtPipeline::new(test_config()).run(&readings).unwrap();

        assert_eq!(output.summary.wells_total, 3);
        assert_eq!(output.summary.wells_scored, 3);
        assert_eq!(output.wells.len(), 30);
        assert_eq!(output.wells[0].station_id, "W1");
        // 10 dates x 2 regions x 3 stat kinds
        assert_eq!(output.regional.len(), 60);
        assert_eq!(output.summary.regional_rows, 60);
        assert_eq!(output.summary.stage_timings.len(), 4);

        let north = output
            .regional
            .iter()
            .find(|r| r.region_label == "North" && r.stat == StatKind::Median)
            .unwrap();
        assert_eq!(north.reporting_count, 2);
        assert!((north.elevation.unwrap() + 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_low_coverage_wells_excluded_and_counted() {
        let mut config = test_config();
        config.change.min_coverage_fraction = 0.5;

        let mut readings = flat_well("W1", "North", 10.0);
        readings.push(Reading::new("W2", "North", date(2001, 3, 1), Some(5.0)));

        let output = DroughtPipeline::new(config).run(&readings).unwrap();
        assert_eq!(output.summary.wells_excluded, 1);
        assert!(output.wells.iter().all(|r| r.station_id == "W1"));
    }

    #[test]
    fn test_unknown_region_fails_run() {
        let mut config = test_config();
        config.filter.region_subset = RegionSubset::Only(vec!["Nowhere".to_string()]);
        let err = DroughtPipeline::new(config)
            .run(&flat_well("W1", "North", 10.0))
            .unwrap_err();
        assert_eq!(err, ProcessingError::UnknownRegion("Nowhere".to_string()));
    }

    #[test]
    fn test_same_station_in_two_regions_kept_apart() {
        let mut readings = flat_well("W1", "North", 10.0);
        readings.extend(flat_well("W1", "South", 50.0));
        let output = DroughtPipeline::new(test_config()).run(&readings).unwrap();
        assert_eq!(output.summary.wells_total, 2);
        assert!(output.wells.iter().all(|r| r.gw_change.map_or(true, |c| c == 0.0)));
    }
}
