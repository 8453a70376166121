//! Processing Pipeline Module
//!
//! ## Five-Stage Run
//!
//! ```text
//! STAGE 1: Reading Filter
//! STAGE 2: Semester Aggregator
//! STAGE 3: Well Change Series     (per well, parallel)
//! STAGE 4: Baseline Percentiles   (per well, parallel)
//! STAGE 5: Regional Aggregator    (barrier: all wells merged)
//! ```

mod coordinator;
pub mod well;

pub use coordinator::{DroughtPipeline, PipelineOutput, RunSummary, StageTiming};
pub use well::{process_well, WellOutcome, WellParams};
