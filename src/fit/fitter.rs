//! Candidate fitters, one per model family.
//!
//! Every fitter follows the same sequence:
//!
//! 1. build the formula for the requested balance point(s)
//! 2. pre-fit gate: degree-day sufficiency checks; any warning → `NOT ATTEMPTED`
//! 3. weighted least squares; a backend error → `ERROR`
//! 4. post-fit gate: sign checks on every parameter and p-value checks on
//!    every slope; any warning → `DISQUALIFIED`, otherwise `QUALIFIED`
//!
//! The `*_candidates` functions fan out over balance points with rayon and
//! collect in enumeration order.

use rayon::prelude::*;

use crate::domain::{
    CandidateFit, CandidateModel, DegreeDayKind, DesignMatrix, Formula, MethodSettings,
    ModelParams, ModelType, ParamName, Term, Warning,
};
use crate::fit::balance_points::cdd_hdd_pairs;
use crate::fit::validators::{
    DegreeDaySeries, parameter_negative, parameter_p_value_too_high, too_few_non_zero_degree_days,
    total_degree_days_too_low,
};
use crate::math::{RegressionFit, fit_wls};

/// Sufficiency and significance thresholds for one kind of degree day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeDayThresholds {
    pub minimum_non_zero: usize,
    pub minimum_total: f64,
    pub maximum_p_value: f64,
}

/// Thresholds used by the candidate fitters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub cdd: DegreeDayThresholds,
    pub hdd: DegreeDayThresholds,
}

impl FitOptions {
    /// Thresholds from (already resolved) method settings.
    pub fn from_settings(settings: &MethodSettings) -> Self {
        Self {
            cdd: DegreeDayThresholds {
                minimum_non_zero: settings.minimum_non_zero_cdd,
                minimum_total: settings.minimum_total_cdd,
                maximum_p_value: settings.beta_cdd_maximum_p_value,
            },
            hdd: DegreeDayThresholds {
                minimum_non_zero: settings.minimum_non_zero_hdd,
                minimum_total: settings.minimum_total_hdd,
                maximum_p_value: settings.beta_hdd_maximum_p_value,
            },
        }
    }

    fn thresholds(&self, kind: DegreeDayKind) -> &DegreeDayThresholds {
        match kind {
            DegreeDayKind::Cdd => &self.cdd,
            DegreeDayKind::Hdd => &self.hdd,
        }
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::from_settings(&MethodSettings::default())
    }
}

/// Intercept-only candidate. Its adjusted R² is defined as 0.
pub fn fit_intercept_only(data: &DesignMatrix) -> CandidateModel {
    fit_formula(
        data,
        ModelType::InterceptOnly,
        Formula::intercept_only(),
        Vec::new(),
        &FitOptions::default(),
    )
}

pub fn fit_hdd_only(
    data: &DesignMatrix,
    opts: &FitOptions,
    heating_balance_point: f64,
) -> CandidateModel {
    let model_type = ModelType::HddOnly;
    let gate = degree_day_gate(data, opts, model_type, DegreeDayKind::Hdd, heating_balance_point);
    fit_formula(data, model_type, Formula::hdd_only(heating_balance_point), gate, opts)
}

pub fn fit_cdd_only(
    data: &DesignMatrix,
    opts: &FitOptions,
    cooling_balance_point: f64,
) -> CandidateModel {
    let model_type = ModelType::CddOnly;
    let gate = degree_day_gate(data, opts, model_type, DegreeDayKind::Cdd, cooling_balance_point);
    fit_formula(data, model_type, Formula::cdd_only(cooling_balance_point), gate, opts)
}

pub fn fit_cdd_hdd(
    data: &DesignMatrix,
    opts: &FitOptions,
    cooling_balance_point: f64,
    heating_balance_point: f64,
) -> CandidateModel {
    let model_type = ModelType::CddHdd;
    let mut gate = degree_day_gate(data, opts, model_type, DegreeDayKind::Cdd, cooling_balance_point);
    gate.extend(degree_day_gate(
        data,
        opts,
        model_type,
        DegreeDayKind::Hdd,
        heating_balance_point,
    ));
    fit_formula(
        data,
        model_type,
        Formula::cdd_hdd(cooling_balance_point, heating_balance_point),
        gate,
        opts,
    )
}

pub fn intercept_only_candidates(data: &DesignMatrix) -> Vec<CandidateModel> {
    vec![fit_intercept_only(data)]
}

pub fn hdd_only_candidates(data: &DesignMatrix, opts: &FitOptions) -> Vec<CandidateModel> {
    data.balance_points(DegreeDayKind::Hdd)
        .par_iter()
        .map(|&bp| fit_hdd_only(data, opts, bp))
        .collect()
}

pub fn cdd_only_candidates(data: &DesignMatrix, opts: &FitOptions) -> Vec<CandidateModel> {
    data.balance_points(DegreeDayKind::Cdd)
        .par_iter()
        .map(|&bp| fit_cdd_only(data, opts, bp))
        .collect()
}

pub fn cdd_hdd_candidates(data: &DesignMatrix, opts: &FitOptions) -> Vec<CandidateModel> {
    cdd_hdd_pairs(data)
        .par_iter()
        .map(|&(c, h)| fit_cdd_hdd(data, opts, c, h))
        .collect()
}

/// Total-then-count checks for one degree-day column.
///
/// A column absent from the design matrix is treated as all-missing, so
/// the gate blocks it whenever a threshold is positive.
fn degree_day_gate(
    data: &DesignMatrix,
    opts: &FitOptions,
    model_type: ModelType,
    kind: DegreeDayKind,
    balance_point: f64,
) -> Vec<Warning> {
    let thresholds = opts.thresholds(kind);
    let series = DegreeDaySeries {
        model_type,
        kind,
        balance_point,
        values: data.degree_days(kind, balance_point).unwrap_or(&[]),
    };
    let mut warnings = total_degree_days_too_low(&series, thresholds.minimum_total);
    warnings.extend(too_few_non_zero_degree_days(
        &series,
        thresholds.minimum_non_zero,
    ));
    warnings
}

fn fit_formula(
    data: &DesignMatrix,
    model_type: ModelType,
    formula: Formula,
    gate: Vec<Warning>,
    opts: &FitOptions,
) -> CandidateModel {
    if !gate.is_empty() {
        log::debug!("{formula}: not attempted ({} gate warnings)", gate.len());
        return CandidateModel::not_attempted(model_type, formula, gate);
    }

    let result = match fit_wls(&formula, data, data.weights()) {
        Ok(result) => result,
        Err(err) => {
            log::warn!("{formula}: regression failed: {err}");
            let warning = Warning::ModelFitFailed {
                model_type,
                error: err.to_string(),
            };
            return CandidateModel::errored(model_type, formula, warning);
        }
    };

    let params = params_from_fit(model_type, &formula, &result);
    let mut warnings = Vec::new();
    for name in sign_checked(model_type) {
        warnings.extend(parameter_negative(&params, *name));
    }
    for kind in [DegreeDayKind::Cdd, DegreeDayKind::Hdd] {
        let Some(term) = params.term(kind) else {
            continue;
        };
        let p_value = result
            .p_value(&Term::Degree(kind, term.balance_point))
            .unwrap_or(f64::NAN);
        warnings.extend(parameter_p_value_too_high(
            &params,
            kind.beta(),
            p_value,
            opts.thresholds(kind).maximum_p_value,
        ));
    }

    let r_squared_adj = match model_type {
        ModelType::InterceptOnly => 0.0,
        ModelType::HddOnly | ModelType::CddOnly | ModelType::CddHdd => result.r_squared_adj,
    };
    let candidate = CandidateModel::fitted(
        formula,
        CandidateFit {
            params,
            result,
            r_squared_adj,
        },
        warnings,
    );
    log::debug!(
        "{}: {} (adj r2 {r_squared_adj:.4})",
        candidate.formula(),
        candidate.status()
    );
    candidate
}

fn sign_checked(model_type: ModelType) -> &'static [ParamName] {
    match model_type {
        ModelType::InterceptOnly => &[ParamName::Intercept],
        ModelType::HddOnly => &[ParamName::Intercept, ParamName::BetaHdd],
        ModelType::CddOnly => &[ParamName::Intercept, ParamName::BetaCdd],
        ModelType::CddHdd => &[ParamName::Intercept, ParamName::BetaCdd, ParamName::BetaHdd],
    }
}

/// Coefficients by term; every formula term has a coefficient in `result`.
fn params_from_fit(model_type: ModelType, formula: &Formula, result: &RegressionFit) -> ModelParams {
    let coef = |term: &Term| result.param(term).unwrap_or(f64::NAN);
    let intercept = coef(&Term::Intercept);
    let slope = |kind: DegreeDayKind| {
        formula
            .terms()
            .iter()
            .find_map(|t| match t {
                Term::Degree(k, bp) if *k == kind => Some((coef(t), *bp)),
                _ => None,
            })
            .unwrap_or((f64::NAN, f64::NAN))
    };
    match model_type {
        ModelType::InterceptOnly => ModelParams::InterceptOnly { intercept },
        ModelType::HddOnly => {
            let (beta_hdd, heating_balance_point) = slope(DegreeDayKind::Hdd);
            ModelParams::HddOnly {
                intercept,
                beta_hdd,
                heating_balance_point,
            }
        }
        ModelType::CddOnly => {
            let (beta_cdd, cooling_balance_point) = slope(DegreeDayKind::Cdd);
            ModelParams::CddOnly {
                intercept,
                beta_cdd,
                cooling_balance_point,
            }
        }
        ModelType::CddHdd => {
            let (beta_cdd, cooling_balance_point) = slope(DegreeDayKind::Cdd);
            let (beta_hdd, heating_balance_point) = slope(DegreeDayKind::Hdd);
            ModelParams::CddHdd {
                intercept,
                beta_cdd,
                beta_hdd,
                cooling_balance_point,
                heating_balance_point,
            }
        }
    }
}
