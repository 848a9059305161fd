//! Temperature feature computation.
//!
//! Turns hourly temperature observations into a degree-day design matrix over
//! a period index. Period `i` spans `[index[i], index[i + 1])`; the last index
//! entry only closes the previous period, so its row is all-missing.
//!
//! Two aggregation methods:
//!
//! - [`DegreeDayMethod::Daily`]: hourly values are averaged per UTC calendar
//!   day, degree days are computed on daily means and summed per period.
//! - [`DegreeDayMethod::Hourly`]: degree days are computed per hour and summed
//!   per period in units of days (`/ 24`).

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{CoverageUnit, DegreeDayKind, DesignMatrix, PeriodCoverage, PeriodIndex};
use crate::error::ModelError;
use crate::math::degrees;

const SECONDS_PER_HOUR: i64 = 3_600;

/// Hourly temperature observations, sorted by time. Missing values are NaN.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TemperatureSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TemperatureSeries {
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self, ModelError> {
        if timestamps.len() != values.len() {
            return Err(ModelError::ShapeMismatch {
                column: "temperature".to_string(),
                expected: timestamps.len(),
                got: values.len(),
            });
        }
        Ok(Self::from_pairs(timestamps.into_iter().zip(values).collect()))
    }

    pub fn from_pairs(mut pairs: Vec<(DateTime<Utc>, f64)>) -> Self {
        pairs.sort_by_key(|(ts, _)| *ts);
        let (timestamps, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { timestamps, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn n_non_null(&self) -> usize {
        self.values.iter().filter(|v| v.is_finite()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeDayMethod {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemperatureFeatureSettings {
    /// Minimum fraction of a day's 24 hours needed to keep the day (daily method).
    pub percent_hourly_coverage_per_day: f64,
    /// Minimum kept fraction for a period's degree days to be defined.
    pub percent_hourly_coverage_per_period: f64,
    /// Report mean degree days per kept day instead of period totals.
    pub use_mean_daily_values: bool,
}

impl Default for TemperatureFeatureSettings {
    fn default() -> Self {
        Self {
            percent_hourly_coverage_per_day: 0.5,
            percent_hourly_coverage_per_period: 0.9,
            use_mean_daily_values: false,
        }
    }
}

/// Per-period aggregate before degree days are derived.
struct PeriodSample {
    /// Daily means (daily method) or hourly values (hourly method) that were kept.
    kept_values: Vec<f64>,
    n_dropped: usize,
}

/// Compute degree-day features over `index`.
///
/// Returns an empty design matrix when `index` is empty or no finite
/// temperature falls inside `[index[0], index[last])`.
pub fn compute_temperature_features(
    index: &[DateTime<Utc>],
    temperature: &TemperatureSeries,
    heating_balance_points: &[f64],
    cooling_balance_points: &[f64],
    method: DegreeDayMethod,
    settings: &TemperatureFeatureSettings,
) -> Result<DesignMatrix, ModelError> {
    let empty = || DesignMatrix::new(PeriodIndex::Time(Vec::new()));
    let (Some(&first), Some(&last)) = (index.first(), index.last()) else {
        return Ok(empty());
    };
    let in_window: Vec<(DateTime<Utc>, f64)> = temperature
        .iter()
        .filter(|(ts, v)| v.is_finite() && *ts >= first && *ts < last)
        .collect();
    if in_window.is_empty() {
        return Ok(empty());
    }

    let samples: Vec<PeriodSample> = match method {
        DegreeDayMethod::Daily => daily_samples(index, &in_window, settings),
        DegreeDayMethod::Hourly => hourly_samples(index, &in_window),
    };
    // Hourly sums are in hours; divide by 24 to express them as degree days.
    let (unit, unit_scale) = match method {
        DegreeDayMethod::Daily => (CoverageUnit::Days, 1.0),
        DegreeDayMethod::Hourly => (CoverageUnit::Hours, 24.0),
    };

    let n = index.len();
    let mut kept = vec![0.0; n];
    let mut dropped = vec![0.0; n];
    let mut temperature_mean = vec![f64::NAN; n];
    let mut covered = vec![false; n];
    for (i, sample) in samples.iter().enumerate() {
        let n_kept = sample.kept_values.len();
        let total = n_kept + sample.n_dropped;
        kept[i] = n_kept as f64;
        dropped[i] = sample.n_dropped as f64;
        covered[i] = total > 0
            && n_kept > 0
            && n_kept as f64 / total as f64 >= settings.percent_hourly_coverage_per_period;
        if covered[i] {
            temperature_mean[i] = sample.kept_values.iter().sum::<f64>() / n_kept as f64;
        }
    }

    let column = |kind: DegreeDayKind, bp: f64| -> Vec<f64> {
        let mut values = vec![f64::NAN; n];
        for (i, sample) in samples.iter().enumerate() {
            if !covered[i] {
                continue;
            }
            let sum: f64 = sample.kept_values.iter().map(|t| degrees(kind, *t, bp)).sum();
            values[i] = if settings.use_mean_daily_values {
                sum / sample.kept_values.len() as f64
            } else {
                sum / unit_scale
            };
        }
        values
    };

    let mut features = DesignMatrix::new(PeriodIndex::Time(index.to_vec()))
        .with_temperature_mean(temperature_mean)?
        .with_coverage(PeriodCoverage {
            unit,
            kept,
            dropped,
        })?;
    for &bp in heating_balance_points {
        features = features.with_degree_days(DegreeDayKind::Hdd, bp, column(DegreeDayKind::Hdd, bp))?;
    }
    for &bp in cooling_balance_points {
        features = features.with_degree_days(DegreeDayKind::Cdd, bp, column(DegreeDayKind::Cdd, bp))?;
    }
    Ok(features)
}

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Days whose midnight falls in `[start, end)`.
fn days_in_period(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let first = start.date_naive();
    let mut day = if midnight(first) >= start {
        Some(first)
    } else {
        first.succ_opt()
    };
    while let Some(d) = day {
        if midnight(d) >= end {
            break;
        }
        out.push(d);
        day = d.succ_opt();
    }
    out
}

fn daily_samples(
    index: &[DateTime<Utc>],
    observations: &[(DateTime<Utc>, f64)],
    settings: &TemperatureFeatureSettings,
) -> Vec<PeriodSample> {
    let mut by_day: HashMap<NaiveDate, (f64, usize)> = HashMap::new();
    for (ts, v) in observations {
        let entry = by_day.entry(ts.date_naive()).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    let mut samples: Vec<PeriodSample> = index
        .windows(2)
        .map(|w| {
            let days = days_in_period(w[0], w[1]);
            let kept_values: Vec<f64> = days
                .iter()
                .filter_map(|d| by_day.get(d))
                .filter(|(_, count)| {
                    *count > 0
                        && *count as f64 / 24.0 >= settings.percent_hourly_coverage_per_day
                })
                .map(|(sum, count)| sum / *count as f64)
                .collect();
            PeriodSample {
                n_dropped: days.len() - kept_values.len(),
                kept_values,
            }
        })
        .collect();
    samples.push(PeriodSample {
        kept_values: Vec::new(),
        n_dropped: 0,
    });
    samples
}

fn hour_key(ts: DateTime<Utc>) -> i64 {
    ts.timestamp().div_euclid(SECONDS_PER_HOUR)
}

/// First whole hour at or after `ts`.
fn hour_key_ceil(ts: DateTime<Utc>) -> i64 {
    (ts.timestamp() + SECONDS_PER_HOUR - 1).div_euclid(SECONDS_PER_HOUR)
}

fn hourly_samples(
    index: &[DateTime<Utc>],
    observations: &[(DateTime<Utc>, f64)],
) -> Vec<PeriodSample> {
    let mut by_hour: HashMap<i64, f64> = HashMap::new();
    for (ts, v) in observations {
        by_hour.entry(hour_key(*ts)).or_insert(*v);
    }

    let mut samples: Vec<PeriodSample> = index
        .windows(2)
        .map(|w| {
            let hours = hour_key_ceil(w[0])..hour_key_ceil(w[1]);
            let n_hours = hours.clone().count();
            let kept_values: Vec<f64> = hours.filter_map(|h| by_hour.get(&h).copied()).collect();
            PeriodSample {
                n_dropped: n_hours - kept_values.len(),
                kept_values,
            }
        })
        .collect();
    samples.push(PeriodSample {
        kept_values: Vec::new(),
        n_dropped: 0,
    });
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{Duration, TimeZone};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, d, 0, 0, 0).unwrap()
    }

    /// Hourly series from `start` with one value per day repeated 24 times.
    fn hourly(start: DateTime<Utc>, daily: &[f64]) -> TemperatureSeries {
        let pairs = daily
            .iter()
            .enumerate()
            .flat_map(|(d, t)| {
                (0..24).map(move |h| (start + Duration::hours((d * 24 + h) as i64), *t))
            })
            .collect();
        TemperatureSeries::from_pairs(pairs)
    }

    #[test]
    fn daily_degree_days_sum_over_period() {
        let temps = hourly(day(1), &[50.0, 70.0, 60.0, 80.0]);
        let index = [day(1), day(3), day(5)];
        let dm = compute_temperature_features(
            &index,
            &temps,
            &[65.0],
            &[65.0],
            DegreeDayMethod::Daily,
            &TemperatureFeatureSettings::default(),
        )
        .unwrap();

        let hdd = dm.degree_days(DegreeDayKind::Hdd, 65.0).unwrap();
        let cdd = dm.degree_days(DegreeDayKind::Cdd, 65.0).unwrap();
        assert_eq!(hdd[0], 15.0);
        assert_eq!(cdd[0], 5.0);
        assert_eq!(hdd[1], 5.0);
        assert_eq!(cdd[1], 15.0);
        assert!(hdd[2].is_nan() && cdd[2].is_nan());
        assert_eq!(dm.temperature_mean().unwrap()[0], 60.0);
        assert_eq!(dm.coverage().unwrap().n_days(), vec![2.0, 2.0, 0.0]);
    }

    #[test]
    fn mean_daily_values_average_over_kept_days() {
        let temps = hourly(day(1), &[50.0, 70.0, 60.0, 80.0]);
        let index = [day(1), day(3), day(5)];
        let settings = TemperatureFeatureSettings {
            use_mean_daily_values: true,
            ..TemperatureFeatureSettings::default()
        };
        let dm = compute_temperature_features(
            &index,
            &temps,
            &[65.0],
            &[65.0],
            DegreeDayMethod::Daily,
            &settings,
        )
        .unwrap();

        let hdd = dm.degree_days(DegreeDayKind::Hdd, 65.0).unwrap();
        let cdd = dm.degree_days(DegreeDayKind::Cdd, 65.0).unwrap();
        assert_eq!(hdd[0], 7.5);
        assert_eq!(cdd[0], 2.5);
        assert_eq!(hdd[1], 2.5);
        assert_eq!(cdd[1], 7.5);
        assert!(hdd[2].is_nan());
    }

    #[test]
    fn hourly_method_divides_by_24() {
        let temps = hourly(day(1), &[55.0, 75.0]);
        let index = [day(1), day(3)];
        let dm = compute_temperature_features(
            &index,
            &temps,
            &[65.0],
            &[],
            DegreeDayMethod::Hourly,
            &TemperatureFeatureSettings::default(),
        )
        .unwrap();
        assert_relative_eq!(dm.degree_days(DegreeDayKind::Hdd, 65.0).unwrap()[0], 10.0);
        let cov = dm.coverage().unwrap();
        assert_eq!(cov.unit, CoverageUnit::Hours);
        assert_eq!(cov.kept[0], 48.0);
        assert_eq!(cov.n_days()[0], 2.0);
    }

    #[test]
    fn sparse_days_are_dropped_and_poor_periods_blanked() {
        // Only 6 hours on the second day: below the 50% per-day threshold.
        let mut pairs: Vec<(DateTime<Utc>, f64)> =
            (0..24).map(|h| (day(1) + Duration::hours(h), 60.0)).collect();
        pairs.extend((0..6).map(|h| (day(2) + Duration::hours(h), 60.0)));
        let temps = TemperatureSeries::from_pairs(pairs);
        let index = [day(1), day(3)];

        let dm = compute_temperature_features(
            &index,
            &temps,
            &[65.0],
            &[],
            DegreeDayMethod::Daily,
            &TemperatureFeatureSettings::default(),
        )
        .unwrap();
        let cov = dm.coverage().unwrap();
        assert_eq!((cov.kept[0], cov.dropped[0]), (1.0, 1.0));
        assert!(dm.degree_days(DegreeDayKind::Hdd, 65.0).unwrap()[0].is_nan());

        let lenient = TemperatureFeatureSettings {
            percent_hourly_coverage_per_period: 0.5,
            ..TemperatureFeatureSettings::default()
        };
        let dm = compute_temperature_features(
            &index,
            &temps,
            &[65.0],
            &[],
            DegreeDayMethod::Daily,
            &lenient,
        )
        .unwrap();
        assert_eq!(dm.degree_days(DegreeDayKind::Hdd, 65.0).unwrap()[0], 5.0);
    }

    #[test]
    fn all_missing_temperature_is_empty() {
        let temps = TemperatureSeries::from_pairs(
            (0..48).map(|h| (day(1) + Duration::hours(h), f64::NAN)).collect(),
        );
        let dm = compute_temperature_features(
            &[day(1), day(2), day(3)],
            &temps,
            &[65.0],
            &[],
            DegreeDayMethod::Daily,
            &TemperatureFeatureSettings::default(),
        )
        .unwrap();
        assert!(dm.is_empty());
        assert_eq!(temps.n_non_null(), 0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let err = TemperatureSeries::new(vec![day(1)], vec![]).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }
}
