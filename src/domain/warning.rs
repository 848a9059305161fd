//! Warning ledger.
//!
//! Every data-quality finding is a [`Warning`] value with a typed payload.
//! Warnings are collected into lists and returned next to results; nothing in
//! the pipeline raises for them.
//!
//! External consumers that expect the flat `{qualified_name, description,
//! data}` record get it through [`Warning::to_record`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::domain::types::{CandidateStatus, DegreeDayKind, ModelParams, ModelType, ParamName};

/// Flat projection of a [`Warning`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EEMeterWarning {
    pub qualified_name: String,
    pub description: String,
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Warning {
    /// Fewer strictly-positive degree days than required.
    TooFewNonZeroDegreeDays {
        model_type: ModelType,
        kind: DegreeDayKind,
        balance_point: f64,
        n_non_zero: usize,
        minimum_non_zero: usize,
    },
    /// Summed degree days below the required total.
    TotalDegreeDaysTooLow {
        model_type: ModelType,
        kind: DegreeDayKind,
        balance_point: f64,
        total: f64,
        minimum_total: f64,
    },
    ParameterNegative {
        parameter: ParamName,
        params: ModelParams,
    },
    ParameterPValueTooHigh {
        parameter: ParamName,
        p_value: f64,
        maximum_p_value: f64,
        params: ModelParams,
    },
    /// The regression backend failed.
    ModelFitFailed { model_type: ModelType, error: String },
    NoQualifiedCandidates {
        status_counts: BTreeMap<CandidateStatus, usize>,
    },
    MethodNoData,
    /// Prediction-time degree days could not be computed.
    EmptyDesignMatrix {
        n_temperature_observations: usize,
        n_temperature_non_null: usize,
    },
    SufficiencyNoData,
    ExtraDataAfterRequestedEnd {
        requested_end: DateTime<Utc>,
        data_end: DateTime<Utc>,
    },
    ExtraDataBeforeRequestedStart {
        requested_start: DateTime<Utc>,
        data_start: DateTime<Utc>,
    },
    NegativeMeterValues { n_negative_meter_values: usize },
    IncorrectNumberOfTotalDays { num_days: i64, n_days_total: i64 },
    TooManyDaysWithMissingData { n_valid_days: i64, n_days_total: i64 },
    TooManyDaysWithMissingMeterData {
        n_valid_meter_data_days: i64,
        n_days_total: i64,
    },
    TooManyDaysWithMissingTemperatureData {
        n_valid_temperature_data_days: i64,
        n_days_total: i64,
    },
}

const DAILY: &str = "eemeter.caltrack_daily";
const SUFFICIENCY: &str = "eemeter.caltrack_sufficiency_criteria";

fn params_data(params: &ModelParams) -> Map<String, Value> {
    params
        .to_map()
        .into_iter()
        .map(|(k, v)| (k, json!(v)))
        .collect()
}

fn iso(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

impl Warning {
    pub fn qualified_name(&self) -> String {
        match self {
            Warning::TooFewNonZeroDegreeDays {
                model_type, kind, ..
            } => format!("{DAILY}.{model_type}.too_few_non_zero_{kind}"),
            Warning::TotalDegreeDaysTooLow {
                model_type, kind, ..
            } => format!("{DAILY}.{model_type}.total_{kind}_too_low"),
            Warning::ParameterNegative { parameter, params } => {
                format!("{DAILY}.{}.{parameter}_negative", params.model_type())
            }
            Warning::ParameterPValueTooHigh {
                parameter, params, ..
            } => format!("{DAILY}.{}.{parameter}_p_value_too_high", params.model_type()),
            Warning::ModelFitFailed { model_type, .. } => {
                format!("{DAILY}.{model_type}.model_results")
            }
            Warning::NoQualifiedCandidates { .. } => {
                format!("{DAILY}.select_best_candidate.no_candidates")
            }
            Warning::MethodNoData => "eemeter.caltrack_method.no_data".to_string(),
            Warning::EmptyDesignMatrix { .. } => {
                "eemeter.caltrack.compute_temperature_features".to_string()
            }
            Warning::SufficiencyNoData => format!("{SUFFICIENCY}.no_data"),
            Warning::ExtraDataAfterRequestedEnd { .. } => {
                format!("{SUFFICIENCY}.extra_data_after_requested_end_date")
            }
            Warning::ExtraDataBeforeRequestedStart { .. } => {
                format!("{SUFFICIENCY}.extra_data_before_requested_start_date")
            }
            Warning::NegativeMeterValues { .. } => format!("{SUFFICIENCY}.negative_meter_values"),
            Warning::IncorrectNumberOfTotalDays { .. } => {
                format!("{SUFFICIENCY}.incorrect_number_of_total_days")
            }
            Warning::TooManyDaysWithMissingData { .. } => {
                format!("{SUFFICIENCY}.too_many_days_with_missing_data")
            }
            Warning::TooManyDaysWithMissingMeterData { .. } => {
                format!("{SUFFICIENCY}.too_many_days_with_missing_meter_data")
            }
            Warning::TooManyDaysWithMissingTemperatureData { .. } => {
                format!("{SUFFICIENCY}.too_many_days_with_missing_temperature_data")
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            Warning::TooFewNonZeroDegreeDays { kind, .. } => format!(
                "Number of non-zero daily {} values below accepted minimum. Candidate fit not attempted.",
                kind.as_str().to_uppercase()
            ),
            Warning::TotalDegreeDaysTooLow { kind, .. } => format!(
                "Total {} below accepted minimum. Candidate fit not attempted.",
                kind.as_str().to_uppercase()
            ),
            Warning::ParameterNegative { parameter, .. } => format!(
                "Model fit {parameter} parameter is negative. Candidate model rejected."
            ),
            Warning::ParameterPValueTooHigh { parameter, .. } => format!(
                "Model fit {parameter} p-value is too high. Candidate model rejected."
            ),
            Warning::ModelFitFailed { .. } => {
                "Error encountered in weighted least squares fit. (Empty data?)".to_string()
            }
            Warning::NoQualifiedCandidates { .. } => {
                "No qualified model candidates available.".to_string()
            }
            Warning::MethodNoData => "No data available. Cannot fit model.".to_string(),
            Warning::EmptyDesignMatrix { .. } => {
                "Design matrix empty, compute_temperature_features failed".to_string()
            }
            Warning::SufficiencyNoData => "No data available.".to_string(),
            Warning::ExtraDataAfterRequestedEnd { .. } => {
                "Extra data found after requested end date.".to_string()
            }
            Warning::ExtraDataBeforeRequestedStart { .. } => {
                "Extra data found before requested start date.".to_string()
            }
            Warning::NegativeMeterValues { .. } => {
                "Found negative meter data values, which may indicate presence of solar net metering."
                    .to_string()
            }
            Warning::IncorrectNumberOfTotalDays { .. } => {
                "Total data span does not match the required value.".to_string()
            }
            Warning::TooManyDaysWithMissingData { .. } => {
                "Too many days in data have missing meter data or temperature data.".to_string()
            }
            Warning::TooManyDaysWithMissingMeterData { .. } => {
                "Too many days in data have missing meter data.".to_string()
            }
            Warning::TooManyDaysWithMissingTemperatureData { .. } => {
                "Too many days in data have missing temperature data.".to_string()
            }
        }
    }

    /// Structured payload, keyed the way downstream triage scripts expect.
    pub fn data(&self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            Warning::TooFewNonZeroDegreeDays {
                kind,
                balance_point,
                n_non_zero,
                minimum_non_zero,
                ..
            } => {
                data.insert(format!("n_non_zero_{kind}"), json!(n_non_zero));
                data.insert(format!("minimum_non_zero_{kind}"), json!(minimum_non_zero));
                data.insert(format!("{kind}_balance_point"), json!(balance_point));
            }
            Warning::TotalDegreeDaysTooLow {
                kind,
                balance_point,
                total,
                minimum_total,
                ..
            } => {
                data.insert(format!("total_{kind}"), json!(total));
                data.insert(format!("total_{kind}_minimum"), json!(minimum_total));
                data.insert(format!("{kind}_balance_point"), json!(balance_point));
            }
            Warning::ParameterNegative { params, .. } => {
                data = params_data(params);
            }
            Warning::ParameterPValueTooHigh {
                parameter,
                p_value,
                maximum_p_value,
                params,
            } => {
                data.insert(format!("{parameter}_p_value"), json!(p_value));
                data.insert(format!("{parameter}_maximum_p_value"), json!(maximum_p_value));
                data.extend(params_data(params));
            }
            Warning::ModelFitFailed { error, .. } => {
                data.insert("error".to_string(), json!(error));
            }
            Warning::NoQualifiedCandidates { status_counts } => {
                for (status, count) in status_counts {
                    data.insert(format!("status_count:{status}"), json!(count));
                }
            }
            Warning::MethodNoData | Warning::SufficiencyNoData => {}
            Warning::EmptyDesignMatrix {
                n_temperature_observations,
                n_temperature_non_null,
            } => {
                data.insert(
                    "n_temperature_observations".to_string(),
                    json!(n_temperature_observations),
                );
                data.insert(
                    "n_temperature_non_null".to_string(),
                    json!(n_temperature_non_null),
                );
            }
            Warning::ExtraDataAfterRequestedEnd {
                requested_end,
                data_end,
            } => {
                data.insert("requested_end".to_string(), json!(iso(requested_end)));
                data.insert("data_end".to_string(), json!(iso(data_end)));
            }
            Warning::ExtraDataBeforeRequestedStart {
                requested_start,
                data_start,
            } => {
                data.insert("requested_start".to_string(), json!(iso(requested_start)));
                data.insert("data_start".to_string(), json!(iso(data_start)));
            }
            Warning::NegativeMeterValues {
                n_negative_meter_values,
            } => {
                data.insert(
                    "n_negative_meter_values".to_string(),
                    json!(n_negative_meter_values),
                );
            }
            Warning::IncorrectNumberOfTotalDays {
                num_days,
                n_days_total,
            } => {
                data.insert("num_days".to_string(), json!(num_days));
                data.insert("n_days_total".to_string(), json!(n_days_total));
            }
            Warning::TooManyDaysWithMissingData {
                n_valid_days,
                n_days_total,
            } => {
                data.insert("n_valid_days".to_string(), json!(n_valid_days));
                data.insert("n_days_total".to_string(), json!(n_days_total));
            }
            Warning::TooManyDaysWithMissingMeterData {
                n_valid_meter_data_days,
                n_days_total,
            } => {
                data.insert(
                    "n_valid_meter_data_days".to_string(),
                    json!(n_valid_meter_data_days),
                );
                data.insert("n_days_total".to_string(), json!(n_days_total));
            }
            Warning::TooManyDaysWithMissingTemperatureData {
                n_valid_temperature_data_days,
                n_days_total,
            } => {
                data.insert(
                    "n_valid_temperature_data_days".to_string(),
                    json!(n_valid_temperature_data_days),
                );
                data.insert("n_days_total".to_string(), json!(n_days_total));
            }
        }
        data
    }

    pub fn to_record(&self) -> EEMeterWarning {
        EEMeterWarning {
            qualified_name: self.qualified_name(),
            description: self.description(),
            data: self.data(),
        }
    }
}

impl From<&Warning> for EEMeterWarning {
    fn from(warning: &Warning) -> Self {
        warning.to_record()
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.qualified_name(), self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degree_day_warning_names_embed_model_and_kind() {
        let w = Warning::TooFewNonZeroDegreeDays {
            model_type: ModelType::CddOnly,
            kind: DegreeDayKind::Cdd,
            balance_point: 65.0,
            n_non_zero: 5,
            minimum_non_zero: 10,
        };
        assert_eq!(
            w.qualified_name(),
            "eemeter.caltrack_daily.cdd_only.too_few_non_zero_cdd"
        );
        let data = w.data();
        assert_eq!(data["n_non_zero_cdd"], json!(5));
        assert_eq!(data["minimum_non_zero_cdd"], json!(10));
        assert_eq!(data["cdd_balance_point"], json!(65.0));
        assert!(w.description().contains("daily CDD values"));
    }

    #[test]
    fn p_value_warning_names_the_checked_parameter() {
        let params = ModelParams::CddHdd {
            intercept: 1.0,
            beta_cdd: 2.0,
            beta_hdd: 3.0,
            cooling_balance_point: 70.0,
            heating_balance_point: 60.0,
        };
        let w = Warning::ParameterPValueTooHigh {
            parameter: ParamName::BetaHdd,
            p_value: 0.5,
            maximum_p_value: 0.1,
            params,
        };
        assert_eq!(
            w.qualified_name(),
            "eemeter.caltrack_daily.cdd_hdd.beta_hdd_p_value_too_high"
        );
        let data = w.data();
        assert_eq!(data["beta_hdd_p_value"], json!(0.5));
        assert_eq!(data["beta_hdd_maximum_p_value"], json!(0.1));
        assert_eq!(data["intercept"], json!(1.0));
        assert_eq!(data.len(), 7);
    }

    #[test]
    fn no_candidates_payload_is_a_status_histogram() {
        let mut status_counts = BTreeMap::new();
        status_counts.insert(CandidateStatus::Disqualified, 3);
        status_counts.insert(CandidateStatus::NotAttempted, 2);
        let record = Warning::NoQualifiedCandidates { status_counts }.to_record();
        assert_eq!(
            record.qualified_name,
            "eemeter.caltrack_daily.select_best_candidate.no_candidates"
        );
        assert_eq!(record.data["status_count:DISQUALIFIED"], json!(3));
        assert_eq!(record.data["status_count:NOT ATTEMPTED"], json!(2));
    }

    #[test]
    fn record_serializes_flat() {
        let record = Warning::NegativeMeterValues {
            n_negative_meter_values: 4,
        }
        .to_record();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value["qualified_name"],
            json!("eemeter.caltrack_sufficiency_criteria.negative_meter_values")
        );
        assert_eq!(value["data"]["n_negative_meter_values"], json!(4));
    }
}
