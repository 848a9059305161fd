//! Load reconstruction from fitted parameters.
//!
//! Predicted usage is `base + heating + cooling` per period:
//!
//! - base: `intercept × days` for totals, `intercept` for averages
//! - heating / cooling: `degree_days × beta × factor`, where the factor
//!   depends on whether the degree-day columns are period averages or totals
//!   and whether averages or totals are requested:
//!
//! | degree days in | usage out | factor     |
//! |----------------|-----------|------------|
//! | averages       | totals    | `× days`   |
//! | averages       | averages  | `× 1`      |
//! | totals         | totals    | `× 1`      |
//! | totals         | averages  | `÷ days`   |
//!
//! A row with any missing value in the design matrix predicts missing loads.

use crate::domain::{DegreeDayKind, DesignMatrix, ModelParams, degree_day_column_name};
use crate::error::ModelError;

/// Unit convention of the degree-day inputs and the requested output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConvention {
    pub input_averages: bool,
    pub output_averages: bool,
}

impl UnitConvention {
    /// Degree-day totals in, usage totals out.
    pub const TOTALS: UnitConvention = UnitConvention {
        input_averages: false,
        output_averages: false,
    };
    /// Per-day averages in, per-day averages out.
    pub const AVERAGES: UnitConvention = UnitConvention {
        input_averages: true,
        output_averages: true,
    };
    /// Per-day averages in, period totals out.
    pub const AVERAGES_TO_TOTALS: UnitConvention = UnitConvention {
        input_averages: true,
        output_averages: false,
    };

    fn degree_day_load(self, degree_days: f64, beta: f64, days: f64) -> f64 {
        match (self.input_averages, self.output_averages) {
            (true, false) => degree_days * beta * days,
            (true, true) | (false, false) => degree_days * beta,
            (false, true) => degree_days * beta / days,
        }
    }

    fn base_load(self, intercept: f64, days: f64) -> f64 {
        if self.output_averages {
            intercept
        } else {
            intercept * days
        }
    }
}

/// Disaggregated loads, one value per design-matrix row.
#[derive(Debug, Clone, PartialEq)]
pub struct Loads {
    pub base_load: Vec<f64>,
    pub heating_load: Vec<f64>,
    pub cooling_load: Vec<f64>,
}

impl Loads {
    pub fn len(&self) -> usize {
        self.base_load.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_load.is_empty()
    }

    /// `base + heating + cooling` per row.
    pub fn total(&self) -> Vec<f64> {
        self.base_load
            .iter()
            .zip(&self.heating_load)
            .zip(&self.cooling_load)
            .map(|((b, h), c)| b + h + c)
            .collect()
    }
}

/// Reconstruct loads for `params` over the rows of `data`.
///
/// Fails when day counts cannot be derived or a degree-day column the
/// parameters reference is absent.
pub fn predict_design_matrix(
    params: &ModelParams,
    data: &DesignMatrix,
    units: UnitConvention,
) -> Result<Loads, ModelError> {
    let days = data.days_per_period()?;
    let n = data.len();

    let base_load: Vec<f64> = days
        .iter()
        .map(|d| units.base_load(params.intercept(), *d))
        .collect();

    let term_load = |kind: DegreeDayKind| -> Result<Vec<f64>, ModelError> {
        let Some(term) = params.term(kind) else {
            return Ok(vec![0.0; n]);
        };
        let degree_days = data
            .degree_days(kind, term.balance_point)
            .ok_or_else(|| {
                ModelError::MissingColumn(degree_day_column_name(kind, term.balance_point))
            })?;
        Ok(degree_days
            .iter()
            .zip(&days)
            .map(|(dd, d)| units.degree_day_load(*dd, term.beta, *d))
            .collect())
    };
    let heating_load = term_load(DegreeDayKind::Hdd)?;
    let cooling_load = term_load(DegreeDayKind::Cdd)?;

    let mut loads = Loads {
        base_load,
        heating_load,
        cooling_load,
    };
    for i in (0..n).filter(|&i| !data.row_is_complete(i)) {
        loads.base_load[i] = f64::NAN;
        loads.heating_load[i] = f64::NAN;
        loads.cooling_load[i] = f64::NAN;
    }
    Ok(loads)
}
