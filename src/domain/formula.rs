//! Regression formulas.
//!
//! A [`Formula`] is the ordered list of regressors for one candidate. Terms
//! reference degree-day columns by kind and balance point, never by column
//! name; the `hdd_<bp>` / `cdd_<bp>` names only appear when rendering.

use std::fmt;

use crate::domain::types::DegreeDayKind;

/// Column name for a degree-day series (`cdd_65`, `hdd_57.5`).
pub fn degree_day_column_name(kind: DegreeDayKind, balance_point: f64) -> String {
    format!("{}_{}", kind.as_str(), balance_point)
}

/// One regressor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Term {
    Intercept,
    Degree(DegreeDayKind, f64),
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Intercept => f.write_str("Intercept"),
            Term::Degree(kind, bp) => f.write_str(&degree_day_column_name(*kind, *bp)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    terms: Vec<Term>,
}

impl Formula {
    pub fn intercept_only() -> Self {
        Self {
            terms: vec![Term::Intercept],
        }
    }

    pub fn hdd_only(heating_balance_point: f64) -> Self {
        Self {
            terms: vec![
                Term::Intercept,
                Term::Degree(DegreeDayKind::Hdd, heating_balance_point),
            ],
        }
    }

    pub fn cdd_only(cooling_balance_point: f64) -> Self {
        Self {
            terms: vec![
                Term::Intercept,
                Term::Degree(DegreeDayKind::Cdd, cooling_balance_point),
            ],
        }
    }

    pub fn cdd_hdd(cooling_balance_point: f64, heating_balance_point: f64) -> Self {
        Self {
            terms: vec![
                Term::Intercept,
                Term::Degree(DegreeDayKind::Cdd, cooling_balance_point),
                Term::Degree(DegreeDayKind::Hdd, heating_balance_point),
            ],
        }
    }

    /// Terms in column order of the design matrix (intercept first).
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn position(&self, term: &Term) -> Option<usize> {
        self.terms.iter().position(|t| t == term)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let regressors: Vec<String> = self
            .terms
            .iter()
            .filter(|t| !matches!(t, Term::Intercept))
            .map(|t| t.to_string())
            .collect();
        if regressors.is_empty() {
            write!(f, "meter_value ~ 1")
        } else {
            write!(f, "meter_value ~ {}", regressors.join(" + "))
        }
    }
}
