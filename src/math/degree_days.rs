//! Degree-day transforms.
//!
//! - heating: `max(bp - t, 0)`
//! - cooling: `max(t - bp, 0)`
//!
//! A missing temperature stays missing (`f64::max` would otherwise turn
//! `NaN` into `0`).

use crate::domain::DegreeDayKind;

pub fn heating_degrees(temperature: f64, balance_point: f64) -> f64 {
    if temperature.is_nan() {
        return f64::NAN;
    }
    (balance_point - temperature).max(0.0)
}

pub fn cooling_degrees(temperature: f64, balance_point: f64) -> f64 {
    if temperature.is_nan() {
        return f64::NAN;
    }
    (temperature - balance_point).max(0.0)
}

pub fn degrees(kind: DegreeDayKind, temperature: f64, balance_point: f64) -> f64 {
    match kind {
        DegreeDayKind::Hdd => heating_degrees(temperature, balance_point),
        DegreeDayKind::Cdd => cooling_degrees(temperature, balance_point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_are_one_sided() {
        assert_eq!(heating_degrees(50.0, 65.0), 15.0);
        assert_eq!(heating_degrees(70.0, 65.0), 0.0);
        assert_eq!(cooling_degrees(70.0, 65.0), 5.0);
        assert_eq!(cooling_degrees(60.0, 65.0), 0.0);
        assert_eq!(degrees(DegreeDayKind::Cdd, 65.0, 65.0), 0.0);
    }

    #[test]
    fn missing_temperature_stays_missing() {
        assert!(heating_degrees(f64::NAN, 65.0).is_nan());
        assert!(degrees(DegreeDayKind::Cdd, f64::NAN, 65.0).is_nan());
    }
}
