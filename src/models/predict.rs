//! Prediction over arbitrary periods.
//!
//! Degree days are recomputed from hourly temperatures for the balance points
//! the parameters reference, then loads are reconstructed as period totals.

use chrono::{DateTime, Utc};

use crate::domain::{CandidateModel, DesignMatrix, ModelParams, ParamMap, Warning};
use crate::error::ModelError;
use crate::features::{
    DegreeDayMethod, TemperatureFeatureSettings, TemperatureSeries, compute_temperature_features,
};
use crate::models::model::{Loads, UnitConvention, predict_design_matrix};

/// Optional extras attached to a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PredictOptions {
    pub with_disaggregated: bool,
    pub with_design_matrix: bool,
}

/// Per-period predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionFrame {
    pub index: Vec<DateTime<Utc>>,
    pub predicted_usage: Vec<f64>,
    /// Present when `with_disaggregated` was requested.
    pub loads: Option<Loads>,
    /// Present when `with_design_matrix` was requested.
    pub design_matrix: Option<DesignMatrix>,
}

impl PredictionFrame {
    pub fn len(&self) -> usize {
        self.predicted_usage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicted_usage.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelPrediction {
    pub result: PredictionFrame,
    pub design_matrix: DesignMatrix,
    pub warnings: Vec<Warning>,
}

/// Predict period-total usage over `prediction_index`.
///
/// When no degree days can be computed (no temperature inside the window),
/// the result is a zero-row frame plus a `compute_temperature_features`
/// warning.
pub fn caltrack_predict(
    params: &ModelParams,
    temperature: &TemperatureSeries,
    prediction_index: &[DateTime<Utc>],
    method: DegreeDayMethod,
    options: PredictOptions,
) -> Result<ModelPrediction, ModelError> {
    let heating: Vec<f64> = params.heating().map(|t| t.balance_point).into_iter().collect();
    let cooling: Vec<f64> = params.cooling().map(|t| t.balance_point).into_iter().collect();
    let settings = TemperatureFeatureSettings {
        use_mean_daily_values: false,
        ..TemperatureFeatureSettings::default()
    };
    let features = compute_temperature_features(
        prediction_index,
        temperature,
        &heating,
        &cooling,
        method,
        &settings,
    )?;

    if features.is_empty() {
        let warning = Warning::EmptyDesignMatrix {
            n_temperature_observations: temperature.len(),
            n_temperature_non_null: temperature.n_non_null(),
        };
        let loads = options.with_disaggregated.then(|| Loads {
            base_load: Vec::new(),
            heating_load: Vec::new(),
            cooling_load: Vec::new(),
        });
        return Ok(ModelPrediction {
            result: PredictionFrame {
                index: Vec::new(),
                predicted_usage: Vec::new(),
                loads,
                design_matrix: None,
            },
            design_matrix: features,
            warnings: vec![warning],
        });
    }

    let n_days = features
        .coverage()
        .map(|c| c.n_days())
        .unwrap_or_else(|| vec![f64::NAN; features.len()]);
    let features = features.with_n_days(n_days)?;

    let loads = predict_design_matrix(params, &features, UnitConvention::TOTALS)?;
    let result = PredictionFrame {
        index: prediction_index.to_vec(),
        predicted_usage: loads.total(),
        loads: options.with_disaggregated.then_some(loads),
        design_matrix: options.with_design_matrix.then(|| features.clone()),
    };
    Ok(ModelPrediction {
        result,
        design_matrix: features,
        warnings: Vec::new(),
    })
}

/// [`caltrack_predict`] for callers holding an untyped model tag and
/// parameter map.
pub fn caltrack_predict_from_parts(
    model_type: Option<&str>,
    params: Option<&ParamMap>,
    temperature: &TemperatureSeries,
    prediction_index: &[DateTime<Utc>],
    method: DegreeDayMethod,
    options: PredictOptions,
) -> Result<ModelPrediction, ModelError> {
    let params = ModelParams::from_parts(model_type, params)?;
    caltrack_predict(&params, temperature, prediction_index, method, options)
}

impl CandidateModel {
    /// Predict with this candidate's fitted parameters.
    ///
    /// Candidates that were never fitted (`NOT ATTEMPTED`, `ERROR`) cannot
    /// predict.
    pub fn predict(
        &self,
        temperature: &TemperatureSeries,
        prediction_index: &[DateTime<Utc>],
        method: DegreeDayMethod,
        options: PredictOptions,
    ) -> Result<ModelPrediction, ModelError> {
        let params = self.params().ok_or_else(|| {
            ModelError::InvalidModel(format!(
                "{} candidate {} has no fitted parameters",
                self.status(),
                self.formula()
            ))
        })?;
        caltrack_predict(params, temperature, prediction_index, method, options)
    }
}
