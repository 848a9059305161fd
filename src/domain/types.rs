//! Shared domain types.
//!
//! Model families, their parameters, candidate records, and the settings that
//! drive a method run. Model families are a closed enum: every consumer
//! (formula builder, load reconstruction, parameter counting) matches
//! exhaustively on [`ModelType`] or [`ModelParams`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::formula::Formula;
use crate::domain::warning::Warning;
use crate::error::ModelError;
use crate::math::ols::RegressionFit;
use crate::metrics::ModelMetrics;

/// Loosely-typed parameter mapping (`"intercept" -> 12.5`, ...).
///
/// Only used at the boundary with callers that hold parameters by name; the
/// pipeline itself works with [`ModelParams`].
pub type ParamMap = BTreeMap<String, f64>;

/// Heating or cooling degree days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeDayKind {
    Hdd,
    Cdd,
}

impl DegreeDayKind {
    /// Column prefix (`hdd` / `cdd`).
    pub fn as_str(self) -> &'static str {
        match self {
            DegreeDayKind::Hdd => "hdd",
            DegreeDayKind::Cdd => "cdd",
        }
    }

    /// The slope parameter attached to this kind of degree day.
    pub fn beta(self) -> ParamName {
        match self {
            DegreeDayKind::Hdd => ParamName::BetaHdd,
            DegreeDayKind::Cdd => ParamName::BetaCdd,
        }
    }

    /// The balance point parameter attached to this kind of degree day.
    pub fn balance_point(self) -> ParamName {
        match self {
            DegreeDayKind::Hdd => ParamName::HeatingBalancePoint,
            DegreeDayKind::Cdd => ParamName::CoolingBalancePoint,
        }
    }
}

impl fmt::Display for DegreeDayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    InterceptOnly,
    HddOnly,
    CddOnly,
    CddHdd,
}

impl ModelType {
    pub const ALL: [ModelType; 4] = [
        ModelType::InterceptOnly,
        ModelType::HddOnly,
        ModelType::CddOnly,
        ModelType::CddHdd,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::InterceptOnly => "intercept_only",
            ModelType::HddOnly => "hdd_only",
            ModelType::CddOnly => "cdd_only",
            ModelType::CddHdd => "cdd_hdd",
        }
    }

    /// Degree-day slopes in the model (used as the metrics parameter count).
    pub fn n_degree_day_parameters(self) -> usize {
        match self {
            ModelType::InterceptOnly => 0,
            ModelType::HddOnly | ModelType::CddOnly => 1,
            ModelType::CddHdd => 2,
        }
    }

    /// Parameter names the family requires, in canonical order.
    pub fn required_params(self) -> &'static [ParamName] {
        match self {
            ModelType::InterceptOnly => &[ParamName::Intercept],
            ModelType::HddOnly => &[
                ParamName::Intercept,
                ParamName::BetaHdd,
                ParamName::HeatingBalancePoint,
            ],
            ModelType::CddOnly => &[
                ParamName::Intercept,
                ParamName::BetaCdd,
                ParamName::CoolingBalancePoint,
            ],
            ModelType::CddHdd => &[
                ParamName::Intercept,
                ParamName::BetaCdd,
                ParamName::BetaHdd,
                ParamName::CoolingBalancePoint,
                ParamName::HeatingBalancePoint,
            ],
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelType::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ModelError::UnrecognizedModelType(s.to_string()))
    }
}

/// Named model parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamName {
    Intercept,
    BetaHdd,
    BetaCdd,
    HeatingBalancePoint,
    CoolingBalancePoint,
}

impl ParamName {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamName::Intercept => "intercept",
            ParamName::BetaHdd => "beta_hdd",
            ParamName::BetaCdd => "beta_cdd",
            ParamName::HeatingBalancePoint => "heating_balance_point",
            ParamName::CoolingBalancePoint => "cooling_balance_point",
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted parameters, one variant per model family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum ModelParams {
    InterceptOnly {
        intercept: f64,
    },
    HddOnly {
        intercept: f64,
        beta_hdd: f64,
        heating_balance_point: f64,
    },
    CddOnly {
        intercept: f64,
        beta_cdd: f64,
        cooling_balance_point: f64,
    },
    CddHdd {
        intercept: f64,
        beta_cdd: f64,
        beta_hdd: f64,
        cooling_balance_point: f64,
        heating_balance_point: f64,
    },
}

/// Slope and balance point of one degree-day term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DegreeDayTerm {
    pub beta: f64,
    pub balance_point: f64,
}

impl ModelParams {
    pub fn model_type(&self) -> ModelType {
        match self {
            ModelParams::InterceptOnly { .. } => ModelType::InterceptOnly,
            ModelParams::HddOnly { .. } => ModelType::HddOnly,
            ModelParams::CddOnly { .. } => ModelType::CddOnly,
            ModelParams::CddHdd { .. } => ModelType::CddHdd,
        }
    }

    pub fn intercept(&self) -> f64 {
        match *self {
            ModelParams::InterceptOnly { intercept }
            | ModelParams::HddOnly { intercept, .. }
            | ModelParams::CddOnly { intercept, .. }
            | ModelParams::CddHdd { intercept, .. } => intercept,
        }
    }

    /// Heating term, if the family has one.
    pub fn heating(&self) -> Option<DegreeDayTerm> {
        match *self {
            ModelParams::HddOnly {
                beta_hdd,
                heating_balance_point,
                ..
            }
            | ModelParams::CddHdd {
                beta_hdd,
                heating_balance_point,
                ..
            } => Some(DegreeDayTerm {
                beta: beta_hdd,
                balance_point: heating_balance_point,
            }),
            ModelParams::InterceptOnly { .. } | ModelParams::CddOnly { .. } => None,
        }
    }

    /// Cooling term, if the family has one.
    pub fn cooling(&self) -> Option<DegreeDayTerm> {
        match *self {
            ModelParams::CddOnly {
                beta_cdd,
                cooling_balance_point,
                ..
            }
            | ModelParams::CddHdd {
                beta_cdd,
                cooling_balance_point,
                ..
            } => Some(DegreeDayTerm {
                beta: beta_cdd,
                balance_point: cooling_balance_point,
            }),
            ModelParams::InterceptOnly { .. } | ModelParams::HddOnly { .. } => None,
        }
    }

    pub fn term(&self, kind: DegreeDayKind) -> Option<DegreeDayTerm> {
        match kind {
            DegreeDayKind::Hdd => self.heating(),
            DegreeDayKind::Cdd => self.cooling(),
        }
    }

    /// Look up a parameter by name; `None` when the family does not carry it.
    pub fn get(&self, name: ParamName) -> Option<f64> {
        match name {
            ParamName::Intercept => Some(self.intercept()),
            ParamName::BetaHdd => self.heating().map(|t| t.beta),
            ParamName::HeatingBalancePoint => self.heating().map(|t| t.balance_point),
            ParamName::BetaCdd => self.cooling().map(|t| t.beta),
            ParamName::CoolingBalancePoint => self.cooling().map(|t| t.balance_point),
        }
    }

    /// Regression formula for this parameter set.
    pub fn formula(&self) -> Formula {
        match (self.cooling(), self.heating()) {
            (None, None) => Formula::intercept_only(),
            (None, Some(h)) => Formula::hdd_only(h.balance_point),
            (Some(c), None) => Formula::cdd_only(c.balance_point),
            (Some(c), Some(h)) => Formula::cdd_hdd(c.balance_point, h.balance_point),
        }
    }

    /// Project to a name-keyed map.
    pub fn to_map(&self) -> ParamMap {
        self.model_type()
            .required_params()
            .iter()
            .filter_map(|name| self.get(*name).map(|v| (name.as_str().to_string(), v)))
            .collect()
    }

    /// Build typed parameters from a model tag and a name-keyed map.
    ///
    /// Errors are checked in a fixed order: absent parameters, absent tag,
    /// unknown tag, then each missing key of the family.
    pub fn from_parts(
        model_type: Option<&str>,
        params: Option<&ParamMap>,
    ) -> Result<Self, ModelError> {
        let params = params.ok_or(ModelError::MissingModelParams)?;
        let model_type: ModelType = model_type
            .ok_or_else(|| ModelError::InvalidModel("model_type is None".to_string()))?
            .parse()?;

        let get = |name: ParamName| -> Result<f64, ModelError> {
            params
                .get(name.as_str())
                .copied()
                .ok_or_else(|| ModelError::MissingParameter {
                    parameter: name.as_str().to_string(),
                    model_type: model_type.as_str().to_string(),
                })
        };

        Ok(match model_type {
            ModelType::InterceptOnly => ModelParams::InterceptOnly {
                intercept: get(ParamName::Intercept)?,
            },
            ModelType::HddOnly => ModelParams::HddOnly {
                intercept: get(ParamName::Intercept)?,
                beta_hdd: get(ParamName::BetaHdd)?,
                heating_balance_point: get(ParamName::HeatingBalancePoint)?,
            },
            ModelType::CddOnly => ModelParams::CddOnly {
                intercept: get(ParamName::Intercept)?,
                beta_cdd: get(ParamName::BetaCdd)?,
                cooling_balance_point: get(ParamName::CoolingBalancePoint)?,
            },
            ModelType::CddHdd => {
                // Heating keys are looked up before cooling keys.
                let intercept = get(ParamName::Intercept)?;
                let beta_hdd = get(ParamName::BetaHdd)?;
                let heating_balance_point = get(ParamName::HeatingBalancePoint)?;
                let beta_cdd = get(ParamName::BetaCdd)?;
                let cooling_balance_point = get(ParamName::CoolingBalancePoint)?;
                ModelParams::CddHdd {
                    intercept,
                    beta_cdd,
                    beta_hdd,
                    cooling_balance_point,
                    heating_balance_point,
                }
            }
        })
    }
}

/// Lifecycle outcome of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CandidateStatus {
    #[serde(rename = "NOT ATTEMPTED")]
    NotAttempted,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "DISQUALIFIED")]
    Disqualified,
    #[serde(rename = "QUALIFIED")]
    Qualified,
}

impl CandidateStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CandidateStatus::NotAttempted => "NOT ATTEMPTED",
            CandidateStatus::Error => "ERROR",
            CandidateStatus::Disqualified => "DISQUALIFIED",
            CandidateStatus::Qualified => "QUALIFIED",
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters and backend output of a candidate that was actually fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateFit {
    pub params: ModelParams,
    pub result: RegressionFit,
    pub r_squared_adj: f64,
}

/// One fitted (or rejected) regression attempt.
///
/// Fields are private so the status/fit pairing cannot drift: `NOT ATTEMPTED`
/// and `ERROR` candidates never hold a fit, `QUALIFIED` and `DISQUALIFIED`
/// always do.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateModel {
    model_type: ModelType,
    formula: Formula,
    status: CandidateStatus,
    warnings: Vec<Warning>,
    fit: Option<CandidateFit>,
}

impl CandidateModel {
    /// A candidate blocked by the pre-fit gate.
    pub fn not_attempted(model_type: ModelType, formula: Formula, warnings: Vec<Warning>) -> Self {
        Self {
            model_type,
            formula,
            status: CandidateStatus::NotAttempted,
            warnings,
            fit: None,
        }
    }

    /// A candidate whose regression failed.
    pub fn errored(model_type: ModelType, formula: Formula, warning: Warning) -> Self {
        Self {
            model_type,
            formula,
            status: CandidateStatus::Error,
            warnings: vec![warning],
            fit: None,
        }
    }

    /// A fitted candidate; any post-fit warning disqualifies it.
    pub fn fitted(formula: Formula, fit: CandidateFit, warnings: Vec<Warning>) -> Self {
        let status = if warnings.is_empty() {
            CandidateStatus::Qualified
        } else {
            CandidateStatus::Disqualified
        };
        Self {
            model_type: fit.params.model_type(),
            formula,
            status,
            warnings,
            fit: Some(fit),
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.model_type
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn status(&self) -> CandidateStatus {
        self.status
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn fit(&self) -> Option<&CandidateFit> {
        self.fit.as_ref()
    }

    pub fn params(&self) -> Option<&ModelParams> {
        self.fit.as_ref().map(|f| &f.params)
    }

    pub fn r_squared_adj(&self) -> Option<f64> {
        self.fit.as_ref().map(|f| f.r_squared_adj)
    }
}

/// Orchestrator settings.
///
/// Defaults follow CalTRACK daily methods. See [`MethodSettings::resolved`]
/// for the billing preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MethodSettings {
    pub fit_cdd: bool,
    pub use_billing_presets: bool,
    pub minimum_non_zero_cdd: usize,
    pub minimum_non_zero_hdd: usize,
    pub minimum_total_cdd: f64,
    pub minimum_total_hdd: f64,
    pub beta_cdd_maximum_p_value: f64,
    pub beta_hdd_maximum_p_value: f64,
    pub fit_intercept_only: bool,
    pub fit_cdd_only: bool,
    pub fit_hdd_only: bool,
    pub fit_cdd_hdd: bool,
}

impl Default for MethodSettings {
    fn default() -> Self {
        Self {
            fit_cdd: true,
            use_billing_presets: false,
            minimum_non_zero_cdd: 10,
            minimum_non_zero_hdd: 10,
            minimum_total_cdd: 20.0,
            minimum_total_hdd: 20.0,
            beta_cdd_maximum_p_value: 1.0,
            beta_hdd_maximum_p_value: 1.0,
            fit_intercept_only: true,
            fit_cdd_only: true,
            fit_hdd_only: true,
            fit_cdd_hdd: true,
        }
    }
}

impl MethodSettings {
    /// Settings after applying the billing preset (all minimum thresholds zeroed).
    pub fn resolved(&self) -> Self {
        let mut out = self.clone();
        if out.use_billing_presets {
            out.minimum_non_zero_cdd = 0;
            out.minimum_non_zero_hdd = 0;
            out.minimum_total_cdd = 0.0;
            out.minimum_total_hdd = 0.0;
        }
        out
    }
}

/// Terminal state of a method run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodStatus {
    #[serde(rename = "NO DATA")]
    NoData,
    #[serde(rename = "NO MODEL")]
    NoModel,
    #[serde(rename = "SUCCESS")]
    Success,
}

impl MethodStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MethodStatus::NoData => "NO DATA",
            MethodStatus::NoModel => "NO MODEL",
            MethodStatus::Success => "SUCCESS",
        }
    }
}

impl fmt::Display for MethodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of [`crate::fit::caltrack_method`].
#[derive(Debug, Clone, PartialEq)]
pub struct MethodResult {
    pub method_name: &'static str,
    pub status: MethodStatus,
    pub model: Option<CandidateModel>,
    pub candidates: Vec<CandidateModel>,
    pub warnings: Vec<Warning>,
    pub settings: MethodSettings,
    pub r_squared_adj: Option<f64>,
    pub metrics: Option<ModelMetrics>,
    pub totals_metrics: Option<ModelMetrics>,
}

impl MethodResult {
    /// Number of candidates per status, in status order.
    pub fn status_counts(&self) -> BTreeMap<CandidateStatus, usize> {
        count_statuses(&self.candidates)
    }
}

/// Histogram of candidate statuses.
pub fn count_statuses(candidates: &[CandidateModel]) -> BTreeMap<CandidateStatus, usize> {
    let mut counts = BTreeMap::new();
    for c in candidates {
        *counts.entry(c.status()).or_insert(0) += 1;
    }
    counts
}
