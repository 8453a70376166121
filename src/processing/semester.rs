//! Semester Aggregator
//!
//! Buckets filtered readings into fixed semesters (Jan-Jun, Jul-Dec) per well
//! and keeps the median elevation of each bucket. The median damps
//! single-reading instrument noise; a bucket with no valid readings yields
//! no record.

use chrono::Datelike;
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;

use crate::types::{FilteredReading, Semester, SemesterRecord};

/// Composite grouping key: `(region, station, year, semester)`.
type SemesterKey<'a> = (&'a str, &'a str, i32, Semester);

/// Aggregate readings into one `SemesterRecord` per populated well-semester.
///
/// Output is ordered by region, station, then chronologically.
pub fn aggregate_semesters(readings: &[FilteredReading]) -> Vec<SemesterRecord> {
    let mut groups: BTreeMap<SemesterKey<'_>, Vec<f64>> = BTreeMap::new();

    for r in readings {
        let key = (
            r.region_label.as_str(),
            r.station_id.as_str(),
            r.date.year(),
            Semester::of_date(r.date),
        );
        let bucket = groups.entry(key).or_default();
        if r.elevation.is_finite() {
            bucket.push(r.elevation);
        }
    }

    groups
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .filter_map(|((region, station, year, semester), values)| {
            let anchor = semester.anchor_date(year)?;
            let median = Data::new(values).median();
            Some(SemesterRecord::new(
                station,
                region,
                year,
                semester,
                anchor,
                Some(median),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn reading(station: &str, y: i32, m: u32, d: u32, elevation: f64) -> FilteredReading {
        FilteredReading {
            station_id: station.to_string(),
            region_label: "North".to_string(),
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            elevation,
        }
    }

    #[test]
    fn test_median_per_semester() {
        let readings = vec![
            reading("W1", 2000, 1, 10, -10.0),
            reading("W1", 2000, 2, 10, -14.0),
            reading("W1", 2000, 5, 10, -11.0),
            reading("W1", 2000, 8, 10, -20.0),
            reading("W1", 2000, 11, 10, -22.0),
        ];
        let records = aggregate_semesters(&readings);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].semester, Semester::First);
        assert_eq!(records[0].anchor_date, NaiveDate::from_ymd_opt(2000, 3, 31).unwrap());
        assert!((records[0].elevation.unwrap() + 11.0).abs() < 1e-9);

        assert_eq!(records[1].semester, Semester::Second);
        assert_eq!(records[1].anchor_date, NaiveDate::from_ymd_opt(2000, 9, 30).unwrap());
        assert!((records[1].elevation.unwrap() + 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_wells_are_kept_apart() {
        let readings = vec![
            reading("W2", 2001, 3, 1, -5.0),
            reading("W1", 2001, 3, 1, -7.0),
        ];
        let records = aggregate_semesters(&readings);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].station_id, "W1");
        assert_eq!(records[1].station_id, "W2");
    }

    #[test]
    fn test_non_finite_only_bucket_is_dropped() {
        let readings = vec![reading("W1", 2001, 3, 1, f64::NAN)];
        assert!(aggregate_semesters(&readings).is_empty());
    }
}
