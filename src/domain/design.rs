//! Design matrix.
//!
//! Columns are typed: degree-day series carry their kind and balance point
//! explicitly, so fitters enumerate balance points from
//! [`DesignMatrix::balance_points`] rather than by scanning column names.
//!
//! Missing values are `f64::NAN` throughout.

use chrono::{DateTime, Utc};

use crate::domain::formula::degree_day_column_name;
use crate::domain::types::DegreeDayKind;
use crate::error::ModelError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Row index of a design matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum PeriodIndex {
    /// Period start times, sorted ascending.
    Time(Vec<DateTime<Utc>>),
    /// Plain row numbers; day counts must come from an `n_days` column.
    Ordinal(usize),
}

impl PeriodIndex {
    pub fn len(&self) -> usize {
        match self {
            PeriodIndex::Time(ts) => ts.len(),
            PeriodIndex::Ordinal(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_time(&self) -> Option<&[DateTime<Utc>]> {
        match self {
            PeriodIndex::Time(ts) => Some(ts.as_slice()),
            PeriodIndex::Ordinal(_) => None,
        }
    }
}

/// One degree-day column at a specific balance point.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeDayColumn {
    pub kind: DegreeDayKind,
    pub balance_point: f64,
    pub values: Vec<f64>,
}

impl DegreeDayColumn {
    pub fn name(&self) -> String {
        degree_day_column_name(self.kind, self.balance_point)
    }
}

/// Whether coverage counts are whole days or hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageUnit {
    Days,
    Hours,
}

/// Kept / dropped observation counts per period from feature computation.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodCoverage {
    pub unit: CoverageUnit,
    pub kept: Vec<f64>,
    pub dropped: Vec<f64>,
}

impl PeriodCoverage {
    /// Days per period implied by the coverage counts.
    ///
    /// Daily: `kept + dropped`. Hourly: `(kept + dropped) / 24`.
    pub fn n_days(&self) -> Vec<f64> {
        self.kept
            .iter()
            .zip(&self.dropped)
            .map(|(k, d)| match self.unit {
                CoverageUnit::Days => k + d,
                CoverageUnit::Hours => (k + d) / 24.0,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Columns are only settable through the `with_*` builders, which check
/// every column against the index length.
pub struct DesignMatrix {
    index: PeriodIndex,
    meter_value: Option<Vec<f64>>,
    degree_days: Vec<DegreeDayColumn>,
    weights: Option<Vec<f64>>,
    n_days: Option<Vec<f64>>,
    temperature_mean: Option<Vec<f64>>,
    coverage: Option<PeriodCoverage>,
}

impl DesignMatrix {
    pub fn new(index: PeriodIndex) -> Self {
        Self {
            index,
            meter_value: None,
            degree_days: Vec::new(),
            weights: None,
            n_days: None,
            temperature_mean: None,
            coverage: None,
        }
    }

    fn check_len(&self, column: impl Into<String>, got: usize) -> Result<(), ModelError> {
        let expected = self.len();
        if got == expected {
            Ok(())
        } else {
            Err(ModelError::ShapeMismatch {
                column: column.into(),
                expected,
                got,
            })
        }
    }

    pub fn with_meter_values(mut self, values: Vec<f64>) -> Result<Self, ModelError> {
        self.check_len("meter_value", values.len())?;
        self.meter_value = Some(values);
        Ok(self)
    }

    /// Add (or replace) the degree-day column for `kind` at `balance_point`.
    pub fn with_degree_days(
        mut self,
        kind: DegreeDayKind,
        balance_point: f64,
        values: Vec<f64>,
    ) -> Result<Self, ModelError> {
        self.check_len(degree_day_column_name(kind, balance_point), values.len())?;
        let column = DegreeDayColumn {
            kind,
            balance_point,
            values,
        };
        match self
            .degree_days
            .iter_mut()
            .find(|c| c.kind == kind && c.balance_point == balance_point)
        {
            Some(existing) => *existing = column,
            None => self.degree_days.push(column),
        }
        Ok(self)
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Result<Self, ModelError> {
        self.check_len("weights", weights.len())?;
        self.weights = Some(weights);
        Ok(self)
    }

    pub fn with_n_days(mut self, n_days: Vec<f64>) -> Result<Self, ModelError> {
        self.check_len("n_days", n_days.len())?;
        self.n_days = Some(n_days);
        Ok(self)
    }

    pub fn with_temperature_mean(mut self, values: Vec<f64>) -> Result<Self, ModelError> {
        self.check_len("temperature_mean", values.len())?;
        self.temperature_mean = Some(values);
        Ok(self)
    }

    pub fn with_coverage(mut self, coverage: PeriodCoverage) -> Result<Self, ModelError> {
        self.check_len("n_kept", coverage.kept.len())?;
        self.check_len("n_dropped", coverage.dropped.len())?;
        self.coverage = Some(coverage);
        Ok(self)
    }

    pub fn index(&self) -> &PeriodIndex {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn meter_value(&self) -> Option<&[f64]> {
        self.meter_value.as_deref()
    }

    pub fn degree_day_columns(&self) -> &[DegreeDayColumn] {
        &self.degree_days
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn n_days(&self) -> Option<&[f64]> {
        self.n_days.as_deref()
    }

    pub fn temperature_mean(&self) -> Option<&[f64]> {
        self.temperature_mean.as_deref()
    }

    pub fn coverage(&self) -> Option<&PeriodCoverage> {
        self.coverage.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn degree_days(&self, kind: DegreeDayKind, balance_point: f64) -> Option<&[f64]> {
        self.degree_days
            .iter()
            .find(|c| c.kind == kind && c.balance_point == balance_point)
            .map(|c| c.values.as_slice())
    }

    /// Balance points available for `kind`, in column order.
    pub fn balance_points(&self, kind: DegreeDayKind) -> Vec<f64> {
        self.degree_days
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.balance_point)
            .collect()
    }

    fn float_columns(&self) -> impl Iterator<Item = &Vec<f64>> {
        self.meter_value
            .iter()
            .chain(self.degree_days.iter().map(|c| &c.values))
            .chain(self.weights.iter())
            .chain(self.n_days.iter())
            .chain(self.temperature_mean.iter())
    }

    fn float_columns_mut(&mut self) -> impl Iterator<Item = &mut Vec<f64>> {
        self.meter_value
            .iter_mut()
            .chain(self.degree_days.iter_mut().map(|c| &mut c.values))
            .chain(self.weights.iter_mut())
            .chain(self.n_days.iter_mut())
            .chain(self.temperature_mean.iter_mut())
    }

    /// True when no column holds a missing value in row `i`.
    pub fn row_is_complete(&self, i: usize) -> bool {
        self.float_columns().all(|col| !col[i].is_nan())
    }

    pub fn complete_rows(&self) -> usize {
        (0..self.len()).filter(|&i| self.row_is_complete(i)).count()
    }

    /// Set every column of a partially-missing row to missing.
    pub fn overwrite_partial_rows_with_nan(mut self) -> Self {
        let incomplete: Vec<usize> = (0..self.len())
            .filter(|&i| !self.row_is_complete(i))
            .collect();
        for col in self.float_columns_mut() {
            for &i in &incomplete {
                col[i] = f64::NAN;
            }
        }
        self
    }

    /// Days covered by each row.
    ///
    /// A time index yields calendar gaps to the next period start (the last
    /// row is missing); otherwise the `n_days` column is required.
    pub fn days_per_period(&self) -> Result<Vec<f64>, ModelError> {
        match &self.index {
            PeriodIndex::Time(ts) => Ok(day_counts(ts)),
            PeriodIndex::Ordinal(_) => self.n_days.clone().ok_or(ModelError::MissingDayCounts),
        }
    }
}

/// Fractional days from each index entry to the next; the last entry is NaN.
pub fn day_counts(index: &[DateTime<Utc>]) -> Vec<f64> {
    let mut counts: Vec<f64> = index
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / SECONDS_PER_DAY)
        .collect();
    if !index.is_empty() {
        counts.push(f64::NAN);
    }
    counts
}
