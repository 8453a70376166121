//! Shared data structures for the groundwater drought indicator pipeline
//!
//! This module defines the rows that flow between pipeline stages:
//! - Stage 1: `Reading` (raw well measurement with its region label)
//! - Stage 2-4: `SemesterRecord` (one well, one semester, with change and percentile fields)
//! - Stage 5: `RegionalStat` (one region, one date, one statistic kind)

mod reading;
mod semester;
mod regional;

pub use reading::*;
pub use semester::*;
pub use regional::*;
