//! Weighted least squares backend.
//!
//! Candidate fitters solve small regressions of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - Rows with a missing response, regressor or weight are dropped (listwise).
//! - Rows are scaled by `sqrt(w_i)` and the ordinary least squares problem is
//!   solved by SVD. The same decomposition gives `(XᵀWX)⁻¹` for standard errors.
//! - Rank deficiency (e.g. an all-zero degree-day column) is an error rather
//!   than a minimum-norm solution, so degenerate candidates surface as `ERROR`.
//! - p-values are two-sided Student-t with `n - p` degrees of freedom.

use nalgebra::{DMatrix, DVector, Dyn, SVD};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::{DesignMatrix, Formula, Term};
use crate::error::RegressionError;

/// Coefficients and inference for one fitted formula.
///
/// Vectors are aligned with `formula.terms()`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionFit {
    pub formula: Formula,
    pub params: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub r_squared_adj: f64,
    pub n_obs: usize,
    pub df_resid: usize,
}

impl RegressionFit {
    pub fn param(&self, term: &Term) -> Option<f64> {
        self.formula.position(term).map(|i| self.params[i])
    }

    pub fn p_value(&self, term: &Term) -> Option<f64> {
        self.formula.position(term).map(|i| self.p_values[i])
    }
}

/// Solve a least squares problem using SVD.
///
/// Returns the coefficients together with the decomposition so callers can
/// reuse it for the coefficient covariance.
pub fn solve_least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
) -> Result<(DVector<f64>, SVD<f64, Dyn, Dyn>), RegressionError> {
    let (n, p) = x.shape();
    let svd = x.clone().svd(true, true);

    let max_sv = svd.singular_values.max();
    let tol = max_sv * (n.max(p) as f64) * f64::EPSILON;
    let rank = svd.rank(tol);
    if max_sv <= 0.0 || rank < p {
        return Err(RegressionError::Singular { rank, n_params: p });
    }

    let beta = svd
        .solve(y, tol)
        .map_err(|_| RegressionError::Singular { rank, n_params: p })?;
    if !beta.iter().all(|v| v.is_finite()) {
        return Err(RegressionError::NonFinite);
    }
    Ok((beta, svd))
}

/// Fit `formula` against `data` with optional observation weights.
pub fn fit_wls(
    formula: &Formula,
    data: &DesignMatrix,
    weights: Option<&[f64]>,
) -> Result<RegressionFit, RegressionError> {
    let y = data
        .meter_value()
        .ok_or_else(|| RegressionError::MissingColumn("meter_value".to_string()))?;

    let mut columns: Vec<Option<&[f64]>> = Vec::with_capacity(formula.len());
    for term in formula.terms() {
        match term {
            Term::Intercept => columns.push(None),
            Term::Degree(kind, bp) => {
                let col = data
                    .degree_days(*kind, *bp)
                    .ok_or_else(|| RegressionError::MissingColumn(term.to_string()))?;
                columns.push(Some(col));
            }
        }
    }

    if let Some(w) = weights {
        if w.len() != y.len() {
            return Err(RegressionError::InvalidWeights);
        }
    }
    let weight_at = |i: usize| weights.map_or(1.0, |w| w[i]);

    let rows: Vec<usize> = (0..y.len())
        .filter(|&i| {
            y[i].is_finite()
                && weight_at(i).is_finite()
                && columns.iter().flatten().all(|col| col[i].is_finite())
        })
        .collect();

    let n = rows.len();
    let p = formula.len();
    if n == 0 {
        return Err(RegressionError::EmptyData);
    }
    if n < p {
        return Err(RegressionError::Underdetermined {
            n_obs: n,
            n_params: p,
        });
    }
    if rows.iter().any(|&i| weight_at(i) < 0.0) {
        return Err(RegressionError::InvalidWeights);
    }
    let sum_w: f64 = rows.iter().map(|&i| weight_at(i)).sum();
    if sum_w <= 0.0 {
        return Err(RegressionError::InvalidWeights);
    }

    let mut xw = DMatrix::<f64>::zeros(n, p);
    let mut yw = DVector::<f64>::zeros(n);
    for (r, &i) in rows.iter().enumerate() {
        let sw = weight_at(i).sqrt();
        for (j, col) in columns.iter().enumerate() {
            let x = col.map_or(1.0, |c| c[i]);
            xw[(r, j)] = sw * x;
        }
        yw[r] = sw * y[i];
    }

    let (beta, svd) = solve_least_squares(&xw, &yw)?;

    let y_mean = rows.iter().map(|&i| weight_at(i) * y[i]).sum::<f64>() / sum_w;
    let mut rss = 0.0;
    let mut tss = 0.0;
    for &i in &rows {
        let w = weight_at(i);
        let fitted: f64 = (0..p).map(|j| columns[j].map_or(1.0, |c| c[i]) * beta[j]).sum();
        rss += w * (y[i] - fitted).powi(2);
        tss += w * (y[i] - y_mean).powi(2);
    }

    let df_resid = n - p;
    let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { f64::NAN };
    let r_squared_adj = if df_resid > 0 && r_squared.is_finite() {
        1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_resid as f64
    } else {
        f64::NAN
    };

    let sigma2 = if df_resid > 0 {
        rss / df_resid as f64
    } else {
        f64::NAN
    };
    let std_errors = coefficient_std_errors(&svd, sigma2);
    let t_dist = if df_resid > 0 {
        StudentsT::new(0.0, 1.0, df_resid as f64).ok()
    } else {
        None
    };
    let p_values = beta
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| two_sided_p_value(b / se, t_dist.as_ref()))
        .collect();

    Ok(RegressionFit {
        formula: formula.clone(),
        params: beta.iter().copied().collect(),
        std_errors,
        p_values,
        r_squared,
        r_squared_adj,
        n_obs: n,
        df_resid,
    })
}

/// `sqrt(diag(σ² (XᵀWX)⁻¹))` from the SVD of the weighted design.
fn coefficient_std_errors(svd: &SVD<f64, Dyn, Dyn>, sigma2: f64) -> Vec<f64> {
    let s = &svd.singular_values;
    let p = s.len();
    let Some(v_t) = svd.v_t.as_ref() else {
        return vec![f64::NAN; p];
    };
    (0..p)
        .map(|j| {
            let var: f64 = (0..p).map(|k| v_t[(k, j)].powi(2) / s[k].powi(2)).sum();
            (sigma2 * var).sqrt()
        })
        .collect()
}

fn two_sided_p_value(t: f64, dist: Option<&StudentsT>) -> f64 {
    match dist {
        Some(_) if t.is_nan() => f64::NAN,
        Some(_) if t.is_infinite() => 0.0,
        Some(d) => 2.0 * d.sf(t.abs()),
        None => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DegreeDayKind, PeriodIndex};
    use approx::assert_relative_eq;

    fn matrix(y: Vec<f64>, cdd: Vec<f64>) -> DesignMatrix {
        let n = y.len();
        DesignMatrix::new(PeriodIndex::Ordinal(n))
            .with_meter_values(y)
            .unwrap()
            .with_degree_days(DegreeDayKind::Cdd, 65.0, cdd)
            .unwrap()
    }

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let (beta, _) = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn noisy_line_recovers_slope_with_small_p_value() {
        let cdd: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let noise = [0.3, -0.2, 0.1, -0.4, 0.2];
        let y: Vec<f64> = cdd
            .iter()
            .enumerate()
            .map(|(i, x)| 10.0 + 2.0 * x + noise[i % noise.len()])
            .collect();
        let fit = fit_wls(&Formula::cdd_only(65.0), &matrix(y, cdd), None).unwrap();

        let slope = fit.param(&Term::Degree(DegreeDayKind::Cdd, 65.0)).unwrap();
        assert_relative_eq!(slope, 2.0, epsilon = 0.05);
        assert!(fit.p_value(&Term::Degree(DegreeDayKind::Cdd, 65.0)).unwrap() < 1e-10);
        assert!(fit.r_squared > 0.99 && fit.r_squared_adj <= fit.r_squared);
        assert_eq!(fit.n_obs, 20);
        assert_eq!(fit.df_resid, 18);
    }

    #[test]
    fn uncorrelated_regressor_has_large_p_value() {
        let cdd = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let y = vec![5.0, 6.0, 5.0, 6.0, 6.0, 5.0];
        let fit = fit_wls(&Formula::cdd_only(65.0), &matrix(y, cdd), None).unwrap();
        assert!(fit.p_values[1] > 0.5);
    }

    #[test]
    fn missing_rows_are_dropped() {
        let cdd = vec![0.0, 1.0, f64::NAN, 3.0];
        let y = vec![1.0, 3.0, 100.0, 7.0];
        let fit = fit_wls(&Formula::cdd_only(65.0), &matrix(y, cdd), None).unwrap();
        assert_eq!(fit.n_obs, 3);
        assert_relative_eq!(fit.params[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.params[1], 2.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_regressor_is_singular() {
        let err = fit_wls(
            &Formula::cdd_only(65.0),
            &matrix(vec![1.0, 2.0, 3.0], vec![0.0; 3]),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RegressionError::Singular { rank: 1, n_params: 2 }));
    }

    #[test]
    fn empty_and_missing_columns_are_errors() {
        let dm = matrix(vec![f64::NAN; 3], vec![1.0, 2.0, 3.0]);
        assert_eq!(
            fit_wls(&Formula::intercept_only(), &dm, None).unwrap_err(),
            RegressionError::EmptyData
        );
        let dm = matrix(vec![1.0, 2.0], vec![1.0, 2.0]);
        assert_eq!(
            fit_wls(&Formula::hdd_only(60.0), &dm, None).unwrap_err(),
            RegressionError::MissingColumn("hdd_60".into())
        );
    }

    #[test]
    fn weights_pull_the_intercept() {
        let dm = matrix(vec![0.0, 10.0], vec![0.0, 0.0]);
        let fit = fit_wls(&Formula::intercept_only(), &dm, Some(&[3.0, 1.0])).unwrap();
        assert_relative_eq!(fit.params[0], 2.5, epsilon = 1e-12);

        let err = fit_wls(&Formula::intercept_only(), &dm, Some(&[-1.0, 1.0])).unwrap_err();
        assert_eq!(err, RegressionError::InvalidWeights);
    }
}
