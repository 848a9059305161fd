//! Candidate generation and selection.
//!
//! Responsibilities:
//!
//! - enumerate balance points and (cooling, heating) pairs
//! - gate, fit and qualify each candidate (parallel per balance point)
//! - select the best qualified candidate by adjusted R²
//! - run the whole method end to end

pub mod balance_points;
pub mod fitter;
pub mod method;
pub mod selection;
pub mod validators;

pub use balance_points::*;
pub use fitter::*;
pub use method::*;
pub use selection::*;
pub use validators::*;
