//! Command-line parsing for the CalTRACK daily/billing method runner.
//!
//! Argument parsing and flag-to-settings mapping live here; the modeling code
//! never sees clap types.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

use crate::domain::MethodSettings;
use crate::sufficiency::SufficiencySettings;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "caltrack",
    version,
    about = "CalTRACK degree-day model fitting and data sufficiency checks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit candidate models to a design-matrix CSV and select the best one.
    Fit(FitArgs),
    /// Check a data-quality CSV against the CalTRACK sufficiency criteria.
    Sufficiency(SufficiencyArgs),
}

#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Design-matrix CSV (`meter_value`, `hdd_<bp>`, `cdd_<bp>`, optional `start`/`n_days`).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Column holding observation weights.
    #[arg(long, value_name = "COLUMN")]
    pub weights_col: Option<String>,

    /// Billing data: zero all minimum-count and minimum-total thresholds.
    #[arg(long)]
    pub billing: bool,

    /// Skip every cooling candidate (e.g. gas meters).
    #[arg(long)]
    pub no_cdd: bool,

    #[arg(long)]
    pub skip_intercept_only: bool,

    #[arg(long)]
    pub skip_hdd_only: bool,

    #[arg(long)]
    pub skip_cdd_only: bool,

    #[arg(long)]
    pub skip_cdd_hdd: bool,

    #[arg(long, default_value_t = 10)]
    pub minimum_non_zero_cdd: usize,

    #[arg(long, default_value_t = 10)]
    pub minimum_non_zero_hdd: usize,

    #[arg(long, default_value_t = 20.0)]
    pub minimum_total_cdd: f64,

    #[arg(long, default_value_t = 20.0)]
    pub minimum_total_hdd: f64,

    /// Disqualify cooling fits whose slope p-value exceeds this.
    #[arg(long, default_value_t = 1.0)]
    pub beta_cdd_maximum_p_value: f64,

    /// Disqualify heating fits whose slope p-value exceeds this.
    #[arg(long, default_value_t = 1.0)]
    pub beta_hdd_maximum_p_value: f64,

    /// List every candidate, not just the status tally.
    #[arg(long)]
    pub candidates: bool,

    /// Print warnings as JSON records.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SufficiencyArgs {
    /// Data-quality CSV (`start`, `meter_value`, `temperature_null`, `temperature_not_null`).
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Requested period start (RFC 3339).
    #[arg(long)]
    pub requested_start: Option<DateTime<Utc>>,

    /// Requested period end (RFC 3339).
    #[arg(long)]
    pub requested_end: Option<DateTime<Utc>>,

    #[arg(long, default_value_t = 365)]
    pub num_days: i64,

    #[arg(long, default_value_t = 0.9)]
    pub min_fraction_daily_coverage: f64,

    #[arg(long, default_value_t = 0.9)]
    pub min_fraction_hourly_temperature_coverage_per_period: f64,

    /// Print warnings as JSON records.
    #[arg(long)]
    pub json: bool,
}

/// Method settings for `caltrack fit`.
pub fn settings_from_args(args: &FitArgs) -> MethodSettings {
    MethodSettings {
        fit_cdd: !args.no_cdd,
        use_billing_presets: args.billing,
        minimum_non_zero_cdd: args.minimum_non_zero_cdd,
        minimum_non_zero_hdd: args.minimum_non_zero_hdd,
        minimum_total_cdd: args.minimum_total_cdd,
        minimum_total_hdd: args.minimum_total_hdd,
        beta_cdd_maximum_p_value: args.beta_cdd_maximum_p_value,
        beta_hdd_maximum_p_value: args.beta_hdd_maximum_p_value,
        fit_intercept_only: !args.skip_intercept_only,
        fit_cdd_only: !args.skip_cdd_only,
        fit_hdd_only: !args.skip_hdd_only,
        fit_cdd_hdd: !args.skip_cdd_hdd,
    }
}

pub fn sufficiency_settings_from_args(args: &SufficiencyArgs) -> SufficiencySettings {
    SufficiencySettings {
        num_days: args.num_days,
        min_fraction_daily_coverage: args.min_fraction_daily_coverage,
        min_fraction_hourly_temperature_coverage_per_period: args
            .min_fraction_hourly_temperature_coverage_per_period,
    }
}
