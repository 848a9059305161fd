use approx::assert_relative_eq;
use caltrack::domain::{CandidateModel, Formula, ModelParams, ModelType, ParamMap};
use caltrack::error::ModelError;
use caltrack::features::{DegreeDayMethod, TemperatureSeries};
use caltrack::models::{PredictOptions, caltrack_predict, caltrack_predict_from_parts};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()
}

fn daily_index(days: i64) -> Vec<DateTime<Utc>> {
    (0..=days).map(|d| start() + Duration::days(d)).collect()
}

fn hourly(days: i64, temperature: f64) -> TemperatureSeries {
    TemperatureSeries::from_pairs(
        (0..days * 24)
            .map(|h| (start() + Duration::hours(h), temperature))
            .collect(),
    )
}

#[test]
fn intercept_only_totals_are_intercept_times_days() {
    let days = 10;
    let params = ModelParams::InterceptOnly { intercept: 3.0 };
    for method in [DegreeDayMethod::Daily, DegreeDayMethod::Hourly] {
        let prediction = caltrack_predict(
            &params,
            &hourly(days, 50.0),
            &daily_index(days),
            method,
            PredictOptions::default(),
        )
        .unwrap();
        let usage = &prediction.result.predicted_usage;
        assert_eq!(usage.len(), days as usize + 1);
        assert!(usage[days as usize].is_nan());
        let total: f64 = usage.iter().filter(|v| !v.is_nan()).sum();
        assert_eq!(total, 3.0 * days as f64);
    }
}

#[test]
fn heating_load_follows_degree_days() {
    let params = ModelParams::HddOnly {
        intercept: 1.0,
        beta_hdd: 2.0,
        heating_balance_point: 60.0,
    };
    let prediction = caltrack_predict(
        &params,
        &hourly(3, 50.0),
        &daily_index(3),
        DegreeDayMethod::Daily,
        PredictOptions {
            with_disaggregated: true,
            with_design_matrix: true,
        },
    )
    .unwrap();
    let loads = prediction.result.loads.as_ref().unwrap();
    assert_relative_eq!(loads.heating_load[0], 20.0, epsilon = 1e-9);
    assert_relative_eq!(loads.base_load[0], 1.0, epsilon = 1e-9);
    assert_eq!(loads.cooling_load[0], 0.0);
    assert_relative_eq!(prediction.result.predicted_usage[1], 21.0, epsilon = 1e-9);
    assert!(prediction.result.design_matrix.is_some());
    assert!(prediction.warnings.is_empty());
}

#[test]
fn missing_temperatures_give_an_empty_frame_with_warning() {
    let temps = TemperatureSeries::from_pairs(
        (0..48)
            .map(|h| (start() + Duration::hours(h), f64::NAN))
            .collect(),
    );
    let params = ModelParams::InterceptOnly { intercept: 1.0 };
    let prediction = caltrack_predict(
        &params,
        &temps,
        &daily_index(2),
        DegreeDayMethod::Daily,
        PredictOptions::default(),
    )
    .unwrap();
    assert!(prediction.result.is_empty());
    assert!(prediction.design_matrix.is_empty());
    assert_eq!(prediction.warnings.len(), 1);
    assert_eq!(
        prediction.warnings[0].qualified_name(),
        "eemeter.caltrack.compute_temperature_features"
    );
}

#[test]
fn loosely_typed_entry_point_reports_configuration_errors() {
    let temps = hourly(2, 50.0);
    let index = daily_index(2);
    let call = |model_type: Option<&str>, params: Option<&ParamMap>| {
        caltrack_predict_from_parts(
            model_type,
            params,
            &temps,
            &index,
            DegreeDayMethod::Daily,
            PredictOptions::default(),
        )
    };

    assert_eq!(call(Some("hdd_only"), None).unwrap_err(), ModelError::MissingModelParams);

    let mut params = ParamMap::new();
    params.insert("intercept".to_string(), 1.0);
    assert!(matches!(
        call(None, Some(&params)).unwrap_err(),
        ModelError::InvalidModel(_)
    ));
    assert_eq!(
        call(Some("tri_linear"), Some(&params)).unwrap_err(),
        ModelError::UnrecognizedModelType("tri_linear".into())
    );
    assert_eq!(
        call(Some("hdd_only"), Some(&params)).unwrap_err(),
        ModelError::MissingParameter {
            parameter: "beta_hdd".into(),
            model_type: "hdd_only".into(),
        }
    );
    assert!(call(Some("intercept_only"), Some(&params)).is_ok());
}

#[test]
fn unfitted_candidates_cannot_predict() {
    let candidate =
        CandidateModel::not_attempted(ModelType::CddOnly, Formula::cdd_only(65.0), Vec::new());
    let err = candidate
        .predict(
            &hourly(2, 70.0),
            &daily_index(2),
            DegreeDayMethod::Daily,
            PredictOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, ModelError::InvalidModel(_)));
}
