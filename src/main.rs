//! gw-drought - Groundwater Drought Indicator Engine
//!
//! Batch recompute of well-level and regional groundwater drought
//! percentiles from a periodic measurement table.
//!
//! # Usage
//!
//! ```bash
//! # Full run with region labels already in the measurement table
//! gw-drought run --readings measurements.csv
//!
//! # Region labels from a separate station table, joined on site_code
//! gw-drought run --readings measurements.csv --stations stations.csv
//!
//! # Median only, two regions, run summary as JSON
//! gw-drought run --readings m.csv --stat median \
//!     --regions "Sacramento River,San Joaquin River" --summary summary.json
//!
//! # Write the default configuration for editing
//! gw-drought init-config
//! ```
//!
//! # Environment Variables
//!
//! - `GW_DROUGHT_CONFIG`: Path to the TOML configuration (default: ./drought_config.toml)
//! - `GW_DROUGHT_READINGS`: Default measurement table for `run`
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use gw_drought::config::{defaults, DroughtConfig, RegionSubset};
use gw_drought::storage::{self, LoadReport};
use gw_drought::{DroughtPipeline, StatKind};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "gw-drought")]
#[command(about = "Groundwater drought percentile indicators for wells and regions")]
#[command(version)]
struct CliArgs {
    /// Configuration file (default search: $GW_DROUGHT_CONFIG, ./drought_config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum SubCommand {
    /// Compute well and regional indicators and write both CSV artifacts
    Run {
        /// Measurement table (CSV)
        #[arg(long, env = "GW_DROUGHT_READINGS")]
        readings: PathBuf,

        /// Station table supplying region labels, joined on input.station_join_column
        #[arg(long)]
        stations: Option<PathBuf>,

        /// Override output.directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Compute a single statistic instead of the configured set (median, p25, p75)
        #[arg(long)]
        stat: Option<StatKind>,

        /// Comma-separated region labels, overriding filter.region_subset
        #[arg(long, value_delimiter = ',')]
        regions: Vec<String>,

        /// Write the run summary as JSON to this path
        #[arg(long, value_name = "PATH")]
        summary: Option<PathBuf>,
    },

    /// Write the built-in default configuration to a TOML file
    InitConfig {
        /// Destination file
        #[arg(long, default_value = defaults::CONFIG_FILE_NAME)]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Load and validate the configuration, then print the resolved values
    CheckConfig,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_format);

    match args.command {
        SubCommand::Run {
            readings,
            stations,
            output_dir,
            stat,
            regions,
            summary,
        } => {
            let mut config = load_config(args.config.as_deref())?;
            if let Some(dir) = output_dir {
                config.output.directory = dir;
            }
            if let Some(kind) = stat {
                config.regional.stat_kinds = vec![kind];
            }
            if !regions.is_empty() {
                config.filter.region_subset = RegionSubset::Only(regions);
            }
            config.validate().context("Invalid configuration after CLI overrides")?;

            run(&config, &readings, stations.as_deref(), summary.as_deref())
        }
        SubCommand::InitConfig { path, force } => {
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            DroughtConfig::default()
                .save_to_file(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            Ok(())
        }
        SubCommand::CheckConfig => {
            let config = load_config(args.config.as_deref())?;
            println!("{}", config.to_toml()?);
            info!("Configuration is valid");
            Ok(())
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// An explicit `--config` must load; otherwise fall back through the search order.
fn load_config(path: Option<&Path>) -> Result<DroughtConfig> {
    match path {
        Some(p) => DroughtConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config {}", p.display())),
        None => Ok(DroughtConfig::load()),
    }
}

fn run(
    config: &DroughtConfig,
    readings_path: &Path,
    stations_path: Option<&Path>,
    summary_path: Option<&Path>,
) -> Result<()> {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  gw-drought - Groundwater Drought Indicators");
    info!(
        "  Baseline {}-{} | {} to {}",
        config.baseline.start_year,
        config.baseline.end_year,
        config.filter.initial_date,
        config.end_date()
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let stations = stations_path
        .map(|p| {
            storage::load_stations(p, &config.input)
                .with_context(|| format!("Failed to load station table {}", p.display()))
        })
        .transpose()?;

    let (readings, load_report): (_, LoadReport) =
        storage::load_readings(readings_path, &config.input, stations.as_ref())
            .with_context(|| format!("Failed to load readings {}", readings_path.display()))?;

    let output = DroughtPipeline::new(config.clone())
        .run(&readings)
        .context("Indicator run failed")?;

    if output.summary.wells_scored == 0 {
        warn!("No well passed the coverage gate; output files will be empty");
    }

    storage::write_wells(&config.output.wells_path(), &output.wells)?;
    storage::write_regional(&config.output.regional_path(), &output.regional)?;
    if let Some(path) = summary_path {
        storage::write_summary(path, &output.summary, Some(&load_report))?;
    }

    info!(
        wells = output.summary.wells_scored,
        excluded = output.summary.wells_excluded,
        regional_rows = output.summary.regional_rows,
        "Run complete"
    );
    Ok(())
}
