//! Drought Configuration Module
//!
//! Provides the run configuration loaded from TOML files: baseline window,
//! reading filter bounds, change-series limits, statistic selection and the
//! column names of the input table.
//!
//! ## Loading Order
//!
//! 1. `GW_DROUGHT_CONFIG` environment variable (path to TOML file)
//! 2. `drought_config.toml` in the current working directory
//! 3. Built-in defaults (the published indicator parameters)
//!
//! The configuration is passed explicitly to every stage; the statistical
//! core never reads process-wide state.

mod drought_config;
pub mod defaults;
pub mod validation;

pub use drought_config::*;
