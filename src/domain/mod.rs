//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model families, typed parameters and candidate records (`types`)
//! - regression formulas (`formula`)
//! - the design matrix with typed degree-day columns (`design`)
//! - the warning ledger (`warning`)

pub mod design;
pub mod formula;
pub mod types;
pub mod warning;

pub use design::*;
pub use formula::*;
pub use types::*;
pub use warning::*;
