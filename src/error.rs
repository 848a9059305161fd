//! Error types.
//!
//! Data-quality problems are never errors in this crate: they surface as
//! [`crate::domain::Warning`]s attached to results. The types here cover the
//! remaining failure classes:
//!
//! - [`AppError`]: binary-facing error carrying a process exit code
//! - [`ModelError`]: configuration / programmer errors raised by prediction
//!   and orchestration entry points
//! - [`RegressionError`]: failures of the weighted least squares backend,
//!   which candidate fitters convert into `ERROR` candidates

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        AppError::new(2, err.to_string())
    }
}

/// Hard failures caused by invalid model configuration or malformed inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("model_params is None.")]
    MissingModelParams,

    #[error("Model not valid for prediction: {0}")]
    InvalidModel(String),

    #[error("invalid caltrack model type: {0}")]
    UnrecognizedModelType(String),

    #[error("\"{parameter}\" parameter required for model_type: {model_type}")]
    MissingParameter {
        parameter: String,
        model_type: String,
    },

    #[error("Data needs a time index or an n_days column.")]
    MissingDayCounts,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Column '{column}' has {got} rows, expected {expected}")]
    ShapeMismatch {
        column: String,
        expected: usize,
        got: usize,
    },
}

/// Failures of the weighted least squares backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegressionError {
    #[error("no complete observations to fit")]
    EmptyData,

    #[error("underdetermined system: {n_obs} observations for {n_params} parameters")]
    Underdetermined { n_obs: usize, n_params: usize },

    #[error("singular design matrix: rank {rank} < {n_params} parameters")]
    Singular { rank: usize, n_params: usize },

    #[error("weights must be non-negative with a positive sum")]
    InvalidWeights,

    #[error("regression produced non-finite coefficients")]
    NonFinite,

    #[error("column not found: {0}")]
    MissingColumn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_messages_name_parameter_and_model() {
        let err = ModelError::MissingParameter {
            parameter: "beta_hdd".into(),
            model_type: "hdd_only".into(),
        };
        assert_eq!(
            err.to_string(),
            "\"beta_hdd\" parameter required for model_type: hdd_only"
        );

        let err = ModelError::UnrecognizedModelType("so_hot".into());
        assert_eq!(err.to_string(), "invalid caltrack model type: so_hot");
    }

    #[test]
    fn model_error_converts_to_exit_code_two() {
        let app: AppError = ModelError::MissingDayCounts.into();
        assert_eq!(app.exit_code(), 2);
        assert_eq!(app.to_string(), "Data needs a time index or an n_days column.");
    }

    #[test]
    fn regression_error_display() {
        let err = RegressionError::Singular {
            rank: 1,
            n_params: 2,
        };
        assert_eq!(err.to_string(), "singular design matrix: rank 1 < 2 parameters");
    }
}
