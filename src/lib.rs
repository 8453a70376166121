//! gw-drought: Groundwater Drought Indicators
//!
//! Turns raw well depth-to-water readings into semester-resolution drought
//! percentiles for individual wells and for the regions they sit in.
//!
//! ## Architecture
//!
//! - **Reading Filter**: region allow-list, date window, plausibility bound
//! - **Semester Aggregator**: median elevation per well per half-year
//! - **Well Change Series**: annual change, outlier clamp, cumulative change
//! - **Baseline Percentile Scorer**: percentile-of-score against a fixed window
//! - **Regional Aggregator**: median/quartile roll-up with rank correction

pub mod config;
pub mod types;
pub mod processing;
pub mod pipeline;
pub mod storage;

// Re-export configuration
pub use config::{ConfigError, DroughtConfig};

// Re-export commonly used types
pub use types::{
    FilteredReading, Reading, RegionalStat, Semester, SemesterField, SemesterRecord, StatKind,
    WellKey,
};

// Re-export the run entry point
pub use pipeline::{DroughtPipeline, PipelineOutput, RunSummary};

// Re-export error types
pub use processing::ProcessingError;
pub use storage::StorageError;
