//! `caltrack` library crate.
//!
//! The binary (`caltrack`) is a thin wrapper around this library so that:
//!
//! - the fitting pipeline is testable without spawning processes
//! - callers can drive the method directly from their own design matrices
//!
//! Entry points: [`fit::caltrack_method`], [`models::caltrack_predict`],
//! [`sufficiency::caltrack_sufficiency_criteria`].

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod features;
pub mod fit;
pub mod io;
pub mod math;
pub mod metrics;
pub mod models;
pub mod sufficiency;
