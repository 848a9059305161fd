//! CalTRACK method orchestrator.
//!
//! ```text
//! normalize partial rows ──► no complete rows ──► NO DATA
//!          │
//!          ▼
//! candidates (intercept, hdd, cdd, cdd+hdd)
//!          │
//!          ▼
//!      selection ──► none qualified ──► NO MODEL
//!          │
//!          ▼
//!  SUCCESS + metrics on averages and totals
//! ```

use log::info;

use crate::domain::{
    CandidateModel, DesignMatrix, MethodResult, MethodSettings, MethodStatus, Warning,
};
use crate::error::ModelError;
use crate::fit::fitter::{
    FitOptions, cdd_hdd_candidates, cdd_only_candidates, hdd_only_candidates,
    intercept_only_candidates,
};
use crate::fit::selection::select_best_candidate;
use crate::metrics::ModelMetrics;
use crate::models::{UnitConvention, predict_design_matrix};

pub const METHOD_NAME: &str = "caltrack_method";

/// Fit every enabled candidate family and select the best qualified model.
///
/// Data-quality problems end up in the result's status and warnings. Errors
/// are returned only for malformed input: a missing `meter_value` column, or,
/// once a model is selected, day counts that cannot be derived for the rows.
pub fn caltrack_method(
    data: &DesignMatrix,
    settings: &MethodSettings,
) -> Result<MethodResult, ModelError> {
    let settings = settings.resolved();
    if data.meter_value().is_none() {
        return Err(ModelError::MissingColumn("meter_value".to_string()));
    }

    let data = data.clone().overwrite_partial_rows_with_nan();
    if data.complete_rows() == 0 {
        info!("{METHOD_NAME}: NO DATA ({} rows, none complete)", data.len());
        return Ok(MethodResult {
            method_name: METHOD_NAME,
            status: MethodStatus::NoData,
            model: None,
            candidates: Vec::new(),
            warnings: vec![Warning::MethodNoData],
            settings,
            r_squared_adj: None,
            metrics: None,
            totals_metrics: None,
        });
    }

    let opts = FitOptions::from_settings(&settings);
    let mut candidates: Vec<CandidateModel> = Vec::new();
    if settings.fit_intercept_only {
        candidates.extend(intercept_only_candidates(&data));
    }
    if settings.fit_hdd_only {
        candidates.extend(hdd_only_candidates(&data, &opts));
    }
    // Fuels without cooling load skip every cdd family.
    if settings.fit_cdd {
        if settings.fit_cdd_only {
            candidates.extend(cdd_only_candidates(&data, &opts));
        }
        if settings.fit_cdd_hdd {
            candidates.extend(cdd_hdd_candidates(&data, &opts));
        }
    }

    let (best, warnings) = select_best_candidate(&candidates);
    let best = best.cloned();

    let Some(model) = best else {
        info!(
            "{METHOD_NAME}: NO MODEL ({} candidates, none qualified)",
            candidates.len()
        );
        return Ok(MethodResult {
            method_name: METHOD_NAME,
            status: MethodStatus::NoModel,
            model: None,
            candidates,
            warnings,
            settings,
            r_squared_adj: None,
            metrics: None,
            totals_metrics: None,
        });
    };

    let (metrics, totals_metrics) = match model.params() {
        Some(params) => {
            let k = params.model_type().n_degree_day_parameters();
            let observed = data.meter_value().unwrap_or(&[]);

            let predicted = predict_design_matrix(params, &data, UnitConvention::AVERAGES)?;
            let metrics = ModelMetrics::new(observed, &predicted.total(), k);

            // Day counts are only needed for the totals metrics.
            let days = data.days_per_period()?;
            let predicted_totals =
                predict_design_matrix(params, &data, UnitConvention::AVERAGES_TO_TOTALS)?;
            let observed_totals: Vec<f64> =
                observed.iter().zip(&days).map(|(v, d)| v * d).collect();
            let totals_metrics = ModelMetrics::new(&observed_totals, &predicted_totals.total(), k);
            (Some(metrics), Some(totals_metrics))
        }
        None => (None, None),
    };

    let r_squared_adj = model.r_squared_adj();
    info!(
        "{METHOD_NAME}: SUCCESS with {} (adj r2 {:.4})",
        model.formula(),
        r_squared_adj.unwrap_or(f64::NAN)
    );
    Ok(MethodResult {
        method_name: METHOD_NAME,
        status: MethodStatus::Success,
        model: Some(model),
        candidates,
        warnings,
        settings,
        r_squared_adj,
        metrics,
        totals_metrics,
    })
}
