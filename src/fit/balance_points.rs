//! Balance point enumeration.
//!
//! Single-degree-day families try every balance point present in the design
//! matrix. The combined family tries every (cooling, heating) pair with
//! `heating <= cooling`; a heating balance point above the cooling one is
//! physically degenerate.

use crate::domain::{DegreeDayKind, DesignMatrix};

/// `(cooling, heating)` pairs with `heating <= cooling`, cooling-major order.
pub fn balance_point_pairs(cooling: &[f64], heating: &[f64]) -> Vec<(f64, f64)> {
    let mut out = Vec::new();
    for &c in cooling {
        for &h in heating {
            if h <= c {
                out.push((c, h));
            }
        }
    }
    out
}

/// Combined-model pairs for the degree-day columns in `data`.
pub fn cdd_hdd_pairs(data: &DesignMatrix) -> Vec<(f64, f64)> {
    balance_point_pairs(
        &data.balance_points(DegreeDayKind::Cdd),
        &data.balance_points(DegreeDayKind::Hdd),
    )
}
