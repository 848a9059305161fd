//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs logging
//! - parses CLI arguments
//! - loads CSV input
//! - runs the method or the sufficiency criteria
//! - prints the summary

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, SufficiencyArgs};
use crate::error::AppError;

pub mod pipeline;
pub mod summary;

/// Entry point for the `caltrack` binary.
pub fn run() -> Result<(), AppError> {
    // RUST_LOG overrides; library logs are quiet by default.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Command::Fit(args) => handle_fit(&args),
        Command::Sufficiency(args) => handle_sufficiency(&args),
    }
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let run = pipeline::run_fit(args)?;
    println!("{}", summary::format_method_summary(&run, args.candidates));
    if args.json {
        println!("{}", summary::warnings_json(&run.result.warnings)?);
    }
    Ok(())
}

fn handle_sufficiency(args: &SufficiencyArgs) -> Result<(), AppError> {
    let sufficiency = pipeline::run_sufficiency(args)?;
    println!("{}", summary::format_sufficiency(&sufficiency));
    if args.json {
        println!("{}", summary::warnings_json(&sufficiency.warnings)?);
    }
    Ok(())
}
