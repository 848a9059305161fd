//! Data sufficiency criteria.
//!
//! Checks whether a period of meter data is usable for fitting before any
//! model is attempted. Every failed criterion becomes a [`Warning`]; the
//! overall status is `FAIL` when any warning was produced.

use std::fmt;

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::domain::{Warning, day_counts};
use crate::error::ModelError;

const SECONDS_PER_DAY: i64 = 86_400;

/// Per-period meter values and hourly temperature coverage counts.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuality {
    index: Vec<DateTime<Utc>>,
    meter_value: Vec<f64>,
    temperature_null: Vec<f64>,
    temperature_not_null: Vec<f64>,
}

impl DataQuality {
    pub fn new(
        index: Vec<DateTime<Utc>>,
        meter_value: Vec<f64>,
        temperature_null: Vec<f64>,
        temperature_not_null: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let expected = index.len();
        for (column, got) in [
            ("meter_value", meter_value.len()),
            ("temperature_null", temperature_null.len()),
            ("temperature_not_null", temperature_not_null.len()),
        ] {
            if got != expected {
                return Err(ModelError::ShapeMismatch {
                    column: column.to_string(),
                    expected,
                    got,
                });
            }
        }
        Ok(Self {
            index,
            meter_value,
            temperature_null,
            temperature_not_null,
        })
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SufficiencyStatus {
    #[serde(rename = "NO DATA")]
    NoData,
    #[serde(rename = "FAIL")]
    Fail,
    #[serde(rename = "PASS")]
    Pass,
}

impl SufficiencyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SufficiencyStatus::NoData => "NO DATA",
            SufficiencyStatus::Fail => "FAIL",
            SufficiencyStatus::Pass => "PASS",
        }
    }
}

impl fmt::Display for SufficiencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SufficiencySettings {
    /// Exact number of days the data (plus requested extent) must span.
    pub num_days: i64,
    pub min_fraction_daily_coverage: f64,
    /// A period with a smaller share of non-null hourly temperatures counts as missing.
    pub min_fraction_hourly_temperature_coverage_per_period: f64,
}

impl Default for SufficiencySettings {
    fn default() -> Self {
        Self {
            num_days: 365,
            min_fraction_daily_coverage: 0.9,
            min_fraction_hourly_temperature_coverage_per_period: 0.9,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataSufficiency {
    pub status: SufficiencyStatus,
    pub criteria_name: &'static str,
    pub warnings: Vec<Warning>,
    pub settings: SufficiencySettings,
}

/// Whole days in `later - earlier`, rounded toward negative infinity.
fn floor_days(later: DateTime<Utc>, earlier: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().div_euclid(SECONDS_PER_DAY)
}

fn fraction(n_valid: i64, n_days_total: i64) -> f64 {
    if n_days_total > 0 {
        n_valid as f64 / n_days_total as f64
    } else {
        0.0
    }
}

/// CalTRACK daily data sufficiency criteria.
///
/// When given, `requested_start` and `requested_end` replace the data's own
/// extent when counting total days.
pub fn caltrack_sufficiency_criteria(
    data_quality: &DataQuality,
    requested_start: Option<DateTime<Utc>>,
    requested_end: Option<DateTime<Utc>>,
    settings: &SufficiencySettings,
) -> DataSufficiency {
    let criteria_name = "caltrack_sufficiency_criteria";

    let (Some(&data_start), Some(&data_end)) = (
        data_quality.index.iter().min(),
        data_quality.index.iter().max(),
    ) else {
        info!("sufficiency: no data");
        return DataSufficiency {
            status: SufficiencyStatus::NoData,
            criteria_name,
            warnings: vec![Warning::SufficiencyNoData],
            settings: settings.clone(),
        };
    };

    let n_days_data = floor_days(data_end, data_start);
    let mut n_days_start_gap = requested_start.map_or(0, |s| floor_days(data_start, s));
    let mut n_days_end_gap = requested_end.map_or(0, |e| floor_days(e, data_end));

    let mut warnings = Vec::new();

    if let Some(requested_end) = requested_end.filter(|_| n_days_end_gap < 0) {
        warnings.push(Warning::ExtraDataAfterRequestedEnd {
            requested_end,
            data_end,
        });
        n_days_end_gap = 0;
    }
    if let Some(requested_start) = requested_start.filter(|_| n_days_start_gap < 0) {
        warnings.push(Warning::ExtraDataBeforeRequestedStart {
            requested_start,
            data_start,
        });
        n_days_start_gap = 0;
    }

    let n_days_total = n_days_data + n_days_start_gap + n_days_end_gap;

    let n_negative_meter_values = data_quality
        .meter_value
        .iter()
        .filter(|v| **v < 0.0)
        .count();
    if n_negative_meter_values > 0 {
        warnings.push(Warning::NegativeMeterValues {
            n_negative_meter_values,
        });
    }

    let threshold = settings.min_fraction_hourly_temperature_coverage_per_period;
    let row_day_counts = day_counts(&data_quality.index);
    let mut meter_days = 0.0;
    let mut temperature_days = 0.0;
    let mut valid_days = 0.0;
    for i in 0..data_quality.len() {
        let days = row_day_counts[i];
        if days.is_nan() {
            continue;
        }
        let meter_ok = !data_quality.meter_value[i].is_nan();
        let not_null = data_quality.temperature_not_null[i];
        let null = data_quality.temperature_null[i];
        let temperature_ok = not_null / (not_null + null) > threshold;
        if meter_ok {
            meter_days += days;
        }
        if temperature_ok {
            temperature_days += days;
        }
        if meter_ok && temperature_ok {
            valid_days += days;
        }
    }
    let n_valid_meter_data_days = meter_days as i64;
    let n_valid_temperature_data_days = temperature_days as i64;
    let n_valid_days = valid_days as i64;

    if n_days_total != settings.num_days {
        warnings.push(Warning::IncorrectNumberOfTotalDays {
            num_days: settings.num_days,
            n_days_total,
        });
    }
    let min_coverage = settings.min_fraction_daily_coverage;
    if fraction(n_valid_days, n_days_total) < min_coverage {
        warnings.push(Warning::TooManyDaysWithMissingData {
            n_valid_days,
            n_days_total,
        });
    }
    if fraction(n_valid_meter_data_days, n_days_total) < min_coverage {
        warnings.push(Warning::TooManyDaysWithMissingMeterData {
            n_valid_meter_data_days,
            n_days_total,
        });
    }
    if fraction(n_valid_temperature_data_days, n_days_total) < min_coverage {
        warnings.push(Warning::TooManyDaysWithMissingTemperatureData {
            n_valid_temperature_data_days,
            n_days_total,
        });
    }

    let status = if warnings.is_empty() {
        SufficiencyStatus::Pass
    } else {
        SufficiencyStatus::Fail
    };
    info!(
        "sufficiency: {status} ({} warnings, {n_valid_days}/{n_days_total} valid days)",
        warnings.len()
    );

    DataSufficiency {
        status,
        criteria_name,
        warnings,
        settings: settings.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 1, 1, 0, 0, 0).unwrap()
    }

    /// `n` daily rows with full temperature coverage.
    fn daily(n: usize) -> DataQuality {
        let index = (0..n).map(|i| start() + Duration::days(i as i64)).collect();
        DataQuality::new(index, vec![1.0; n], vec![0.0; n], vec![24.0; n]).unwrap()
    }

    fn names(result: &DataSufficiency) -> Vec<String> {
        result.warnings.iter().map(|w| w.qualified_name()).collect()
    }

    #[test]
    fn empty_input_is_no_data() {
        let dq = DataQuality::new(vec![], vec![], vec![], vec![]).unwrap();
        let result = caltrack_sufficiency_criteria(&dq, None, None, &SufficiencySettings::default());
        assert_eq!(result.status, SufficiencyStatus::NoData);
        assert_eq!(result.criteria_name, "caltrack_sufficiency_criteria");
        assert_eq!(
            names(&result),
            vec!["eemeter.caltrack_sufficiency_criteria.no_data"]
        );
    }

    #[test]
    fn full_year_passes() {
        let result =
            caltrack_sufficiency_criteria(&daily(366), None, None, &SufficiencySettings::default());
        assert_eq!(result.status, SufficiencyStatus::Pass);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn extra_data_outside_requested_window() {
        let dq = daily(366);
        let requested_start = start() + Duration::days(10);
        let requested_end = start() + Duration::days(300);
        let result = caltrack_sufficiency_criteria(
            &dq,
            Some(requested_start),
            Some(requested_end),
            &SufficiencySettings::default(),
        );
        assert_eq!(result.status, SufficiencyStatus::Fail);
        // Both gaps clamp to zero so the data span itself is counted.
        assert_eq!(
            names(&result),
            vec![
                "eemeter.caltrack_sufficiency_criteria.extra_data_after_requested_end_date",
                "eemeter.caltrack_sufficiency_criteria.extra_data_before_requested_start_date",
            ]
        );
    }

    #[test]
    fn requested_window_extends_total_days() {
        let dq = daily(200);
        let requested_end = start() + Duration::days(365);
        let result = caltrack_sufficiency_criteria(
            &dq,
            Some(start()),
            Some(requested_end),
            &SufficiencySettings::default(),
        );
        let record = result
            .warnings
            .iter()
            .find(|w| matches!(w, Warning::TooManyDaysWithMissingData { .. }))
            .unwrap();
        assert_eq!(
            record,
            &Warning::TooManyDaysWithMissingData {
                n_valid_days: 199,
                n_days_total: 365,
            }
        );
        assert!(!names(&result).iter().any(|n| n.ends_with("incorrect_number_of_total_days")));
    }

    #[test]
    fn negative_and_missing_values() {
        let n = 366;
        let index: Vec<_> = (0..n).map(|i| start() + Duration::days(i as i64)).collect();
        let mut meter = vec![1.0; n];
        meter[0] = -1.0;
        for v in meter.iter_mut().skip(10).take(60) {
            *v = f64::NAN;
        }
        let mut not_null = vec![24.0; n];
        let mut null = vec![0.0; n];
        // 0.9 coverage is not strictly above the threshold.
        for i in 100..150 {
            not_null[i] = 18.0;
            null[i] = 2.0;
        }
        let dq = DataQuality::new(index, meter, null, not_null).unwrap();
        let result = caltrack_sufficiency_criteria(&dq, None, None, &SufficiencySettings::default());
        assert_eq!(result.status, SufficiencyStatus::Fail);
        assert_eq!(
            result.warnings,
            vec![
                Warning::NegativeMeterValues {
                    n_negative_meter_values: 1
                },
                Warning::TooManyDaysWithMissingData {
                    n_valid_days: 255,
                    n_days_total: 365,
                },
                Warning::TooManyDaysWithMissingMeterData {
                    n_valid_meter_data_days: 305,
                    n_days_total: 365,
                },
                Warning::TooManyDaysWithMissingTemperatureData {
                    n_valid_temperature_data_days: 315,
                    n_days_total: 365,
                },
            ]
        );
    }

    #[test]
    fn wrong_span_and_single_row() {
        let result =
            caltrack_sufficiency_criteria(&daily(30), None, None, &SufficiencySettings::default());
        assert!(names(&result)[0].ends_with("incorrect_number_of_total_days"));

        // A single row spans zero days: every fraction is zero.
        let result =
            caltrack_sufficiency_criteria(&daily(1), None, None, &SufficiencySettings::default());
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn shape_is_checked() {
        let err = DataQuality::new(vec![start()], vec![], vec![0.0], vec![24.0]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }
}
