//! Mathematical utilities: degree-day transforms and weighted least squares.

pub mod degree_days;
pub mod ols;

pub use degree_days::*;
pub use ols::*;
