//! Load-then-compute workflows behind each subcommand.
//!
//! Kept apart from printing so the same steps are testable without capturing
//! stdout.

use crate::cli::{FitArgs, SufficiencyArgs, settings_from_args, sufficiency_settings_from_args};
use crate::domain::MethodResult;
use crate::error::AppError;
use crate::fit::caltrack_method;
use crate::io::ingest::{load_data_quality, load_design_matrix};
use crate::sufficiency::{DataSufficiency, caltrack_sufficiency_criteria};

/// Outputs of one `caltrack fit` run.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub rows_read: usize,
    pub complete_rows: usize,
    pub result: MethodResult,
}

pub fn run_fit(args: &FitArgs) -> Result<FitRun, AppError> {
    let data = load_design_matrix(&args.input, args.weights_col.as_deref())?;
    let settings = settings_from_args(args);
    let result = caltrack_method(&data, &settings)?;
    Ok(FitRun {
        rows_read: data.len(),
        complete_rows: data.complete_rows(),
        result,
    })
}

pub fn run_sufficiency(args: &SufficiencyArgs) -> Result<DataSufficiency, AppError> {
    let data_quality = load_data_quality(&args.input)?;
    let settings = sufficiency_settings_from_args(args);
    Ok(caltrack_sufficiency_criteria(
        &data_quality,
        args.requested_start,
        args.requested_end,
        &settings,
    ))
}
