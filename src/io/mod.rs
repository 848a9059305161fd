//! Input helpers.
//!
//! - CSV ingest of design matrices and data-quality tables (`ingest`)

pub mod ingest;

pub use ingest::*;
