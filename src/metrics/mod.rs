//! Goodness-of-fit metrics for a selected model.
//!
//! Observed and predicted series are paired row by row; pairs with a missing
//! side are dropped before anything is computed.
//!
//! | Metric | Formula |
//! |--------|---------|
//! | R² | squared Pearson correlation of observed vs predicted |
//! | adj R² | `1 - (1 - R²)(n - 1)/(n - 1 - k)` |
//! | RMSE | `√(Σ(p - o)² / n)` |
//! | adj RMSE | `√(Σ(p - o)² / (n - k))` |
//! | CV(RMSE) | `RMSE / mean(o)` |
//! | MAPE | `mean(|(o - p)/o|)` over non-zero observations |
//! | NMAE | `Σ|p - o| / Σo` |
//! | NMBE | `Σ(p - o) / Σo` |
//!
//! `k` is the number of degree-day parameters of the model.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelMetrics {
    pub observed_length: usize,
    pub predicted_length: usize,
    pub merged_length: usize,
    pub num_parameters: usize,
    pub observed_mean: f64,
    pub predicted_mean: f64,
    pub r_squared: f64,
    pub r_squared_adj: f64,
    pub rmse: f64,
    pub rmse_adj: f64,
    pub cvrmse: f64,
    pub cvrmse_adj: f64,
    pub mape: f64,
    pub nmae: f64,
    pub nmbe: f64,
    /// Lag-1 autocorrelation of residuals (`o - p`).
    pub autocorr_resid: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        f64::NAN
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let (mx, my) = (mean(x), mean(y));
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx).powi(2);
        syy += (b - my).powi(2);
    }
    if sxx > 0.0 && syy > 0.0 {
        sxy / (sxx * syy).sqrt()
    } else {
        f64::NAN
    }
}

impl ModelMetrics {
    pub fn new(observed: &[f64], predicted: &[f64], num_parameters: usize) -> Self {
        let (obs, pred): (Vec<f64>, Vec<f64>) = observed
            .iter()
            .zip(predicted)
            .filter(|(o, p)| !o.is_nan() && !p.is_nan())
            .map(|(o, p)| (*o, *p))
            .unzip();
        let n = obs.len();
        let nf = n as f64;
        let k = num_parameters as f64;

        let observed_mean = mean(&obs);
        let predicted_mean = mean(&pred);
        let resid: Vec<f64> = obs.iter().zip(&pred).map(|(o, p)| o - p).collect();
        let sse: f64 = resid.iter().map(|r| r * r).sum();
        let sum_obs: f64 = obs.iter().sum();

        let r_squared = pearson(&obs, &pred).powi(2);
        let r_squared_adj = if nf - 1.0 - k > 0.0 {
            1.0 - (1.0 - r_squared) * (nf - 1.0) / (nf - 1.0 - k)
        } else {
            f64::NAN
        };
        let rmse = if n > 0 { (sse / nf).sqrt() } else { f64::NAN };
        let rmse_adj = if nf - k > 0.0 {
            (sse / (nf - k)).sqrt()
        } else {
            f64::NAN
        };

        let ape: Vec<f64> = obs
            .iter()
            .zip(&pred)
            .filter(|(o, _)| **o != 0.0)
            .map(|(o, p)| ((o - p) / o).abs())
            .collect();

        let nmae = resid.iter().map(|r| r.abs()).sum::<f64>() / sum_obs;
        let nmbe = -resid.iter().sum::<f64>() / sum_obs;

        let autocorr_resid = if n > 2 {
            pearson(&resid[..n - 1], &resid[1..])
        } else {
            f64::NAN
        };

        Self {
            observed_length: observed.len(),
            predicted_length: predicted.len(),
            merged_length: n,
            num_parameters,
            observed_mean,
            predicted_mean,
            r_squared,
            r_squared_adj,
            rmse,
            rmse_adj,
            cvrmse: rmse / observed_mean,
            cvrmse_adj: rmse_adj / observed_mean,
            mape: mean(&ape),
            nmae,
            nmbe,
            autocorr_resid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn perfect_prediction() {
        let obs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let m = ModelMetrics::new(&obs, &obs, 1);
        assert_relative_eq!(m.r_squared, 1.0, epsilon = 1e-12);
        assert_relative_eq!(m.r_squared_adj, 1.0, epsilon = 1e-12);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.nmbe, 0.0);
        assert_eq!(m.mape, 0.0);
    }

    #[test]
    fn known_errors() {
        let obs = [10.0, 20.0, 30.0, 40.0];
        let pred = [12.0, 18.0, 33.0, 37.0];
        let m = ModelMetrics::new(&obs, &pred, 2);
        // sse = 4 + 4 + 9 + 9 = 26
        assert_relative_eq!(m.rmse, (26.0f64 / 4.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.rmse_adj, (26.0f64 / 2.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(m.cvrmse, m.rmse / 25.0, epsilon = 1e-12);
        assert_relative_eq!(m.nmae, 10.0 / 100.0, epsilon = 1e-12);
        assert_relative_eq!(m.nmbe, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn missing_pairs_are_dropped() {
        let obs = [1.0, f64::NAN, 3.0, 4.0];
        let pred = [1.0, 2.0, f64::NAN, 4.0];
        let m = ModelMetrics::new(&obs, &pred, 0);
        assert_eq!(m.observed_length, 4);
        assert_eq!(m.merged_length, 2);
        assert_eq!(m.observed_mean, 2.5);
    }

    #[test]
    fn empty_input_is_all_nan() {
        let m = ModelMetrics::new(&[], &[], 0);
        assert_eq!(m.merged_length, 0);
        assert!(m.rmse.is_nan() && m.r_squared.is_nan());
    }
}
