//! Degree-day and parameter validators.
//!
//! Each check is pure and returns zero or one warning. Fitters decide the
//! order by the sequence in which they call them.

use crate::domain::{DegreeDayKind, ModelParams, ModelType, ParamName, Warning};

/// A degree-day column as seen by one candidate.
#[derive(Debug, Clone, Copy)]
pub struct DegreeDaySeries<'a> {
    pub model_type: ModelType,
    pub kind: DegreeDayKind,
    pub balance_point: f64,
    pub values: &'a [f64],
}

/// Warn when fewer than `minimum_non_zero` values are strictly positive.
pub fn too_few_non_zero_degree_days(
    series: &DegreeDaySeries<'_>,
    minimum_non_zero: usize,
) -> Vec<Warning> {
    let n_non_zero = series.values.iter().filter(|v| **v > 0.0).count();
    if n_non_zero < minimum_non_zero {
        vec![Warning::TooFewNonZeroDegreeDays {
            model_type: series.model_type,
            kind: series.kind,
            balance_point: series.balance_point,
            n_non_zero,
            minimum_non_zero,
        }]
    } else {
        Vec::new()
    }
}

/// Warn when the summed degree days (missing values skipped) fall below
/// `minimum_total`.
pub fn total_degree_days_too_low(
    series: &DegreeDaySeries<'_>,
    minimum_total: f64,
) -> Vec<Warning> {
    let total: f64 = series.values.iter().filter(|v| !v.is_nan()).sum();
    if total < minimum_total {
        vec![Warning::TotalDegreeDaysTooLow {
            model_type: series.model_type,
            kind: series.kind,
            balance_point: series.balance_point,
            total,
            minimum_total,
        }]
    } else {
        Vec::new()
    }
}

/// Warn when `parameter` is negative. Parameters the family lacks count as 0.
pub fn parameter_negative(params: &ModelParams, parameter: ParamName) -> Vec<Warning> {
    if params.get(parameter).unwrap_or(0.0) < 0.0 {
        vec![Warning::ParameterNegative {
            parameter,
            params: *params,
        }]
    } else {
        Vec::new()
    }
}

/// Warn when `p_value > maximum_p_value`. Equality passes, and so does an
/// undefined (NaN) p-value.
pub fn parameter_p_value_too_high(
    params: &ModelParams,
    parameter: ParamName,
    p_value: f64,
    maximum_p_value: f64,
) -> Vec<Warning> {
    if p_value > maximum_p_value {
        vec![Warning::ParameterPValueTooHigh {
            parameter,
            p_value,
            maximum_p_value,
            params: *params,
        }]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn series(values: &[f64]) -> DegreeDaySeries<'_> {
        DegreeDaySeries {
            model_type: ModelType::CddOnly,
            kind: DegreeDayKind::Cdd,
            balance_point: 65.0,
            values,
        }
    }

    fn hdd_params(beta_hdd: f64) -> ModelParams {
        ModelParams::HddOnly {
            intercept: 1.0,
            beta_hdd,
            heating_balance_point: 60.0,
        }
    }

    #[test]
    fn non_zero_count_ignores_zeros_and_missing() {
        let values = [0.0, 1.0, f64::NAN, 2.0, 0.0];
        assert!(too_few_non_zero_degree_days(&series(&values), 2).is_empty());
        let w = too_few_non_zero_degree_days(&series(&values), 3);
        assert_eq!(w.len(), 1);
        assert!(
            w[0].qualified_name()
                .ends_with("cdd_only.too_few_non_zero_cdd")
        );
    }

    #[test]
    fn total_skips_missing_values() {
        let values = [10.0, f64::NAN, 10.0];
        assert!(total_degree_days_too_low(&series(&values), 20.0).is_empty());
        let w = total_degree_days_too_low(&series(&values), 20.5);
        assert_eq!(w[0].data()["total_cdd"], serde_json::json!(20.0));
    }

    #[test]
    fn zero_is_not_negative() {
        assert!(parameter_negative(&hdd_params(0.0), ParamName::BetaHdd).is_empty());
        let w = parameter_negative(&hdd_params(-0.1), ParamName::BetaHdd);
        assert_eq!(
            w[0].qualified_name(),
            "eemeter.caltrack_daily.hdd_only.beta_hdd_negative"
        );
        // absent parameter defaults to zero
        assert!(parameter_negative(&hdd_params(-0.1), ParamName::BetaCdd).is_empty());
    }

    #[test]
    fn p_value_boundary_passes() {
        let params = hdd_params(1.0);
        assert!(parameter_p_value_too_high(&params, ParamName::BetaHdd, 0.1, 0.1).is_empty());
        assert!(parameter_p_value_too_high(&params, ParamName::BetaHdd, f64::NAN, 0.1).is_empty());
        let above = f64::from_bits(0.1f64.to_bits() + 1);
        assert_eq!(
            parameter_p_value_too_high(&params, ParamName::BetaHdd, above, 0.1).len(),
            1
        );
    }

    proptest! {
        #[test]
        fn negative_iff_below_zero(beta in -1.0e6f64..1.0e6) {
            let w = parameter_negative(&hdd_params(beta), ParamName::BetaHdd);
            prop_assert_eq!(w.len(), usize::from(beta < 0.0));
        }

        #[test]
        fn non_zero_gate_matches_count(
            values in proptest::collection::vec(0.0f64..5.0, 0..40),
            minimum in 0usize..40,
        ) {
            let n_pos = values.iter().filter(|v| **v > 0.0).count();
            let w = too_few_non_zero_degree_days(&series(&values), minimum);
            prop_assert_eq!(w.is_empty(), n_pos >= minimum);
        }

        #[test]
        fn p_value_gate_is_strict(p in 0.0f64..1.0, max in 0.0f64..1.0) {
            let w = parameter_p_value_too_high(&hdd_params(1.0), ParamName::BetaHdd, p, max);
            prop_assert_eq!(w.len(), usize::from(p > max));
        }
    }
}
