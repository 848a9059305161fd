//! CalTRACK model evaluation.
//!
//! - `model`: load reconstruction from fitted parameters over a design matrix
//! - `predict`: prediction over a time index from hourly temperatures

pub mod model;
pub mod predict;

pub use model::*;
pub use predict::*;
