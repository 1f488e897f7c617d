//! Error types for backtest evaluation.

use thiserror::Error;

/// Error returned by a model collaborator. Passed through verbatim, with the
/// failing timestamp and window index attached by the evaluator.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for evaluation operations.
pub type Result<T> = std::result::Result<T, EvalError>;

/// Error types for backtest evaluation operations.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Invalid config '{param}' = '{value}': {reason}")]
    InvalidConfig {
        param: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("Series alignment failed: {0}")]
    Alignment(String),

    #[error("Model fit failed at t={at} (window {window}): {cause}")]
    ModelFit {
        at: i64,
        window: usize,
        cause: ModelError,
    },

    #[error("Model predict failed at t={at} (window {window}): {cause}")]
    ModelPredict {
        at: i64,
        window: usize,
        cause: ModelError,
    },

    #[error("Evaluation aborted by caller at t={at} (window {window})")]
    Aborted { at: i64, window: usize },
}
