//! Model collaborator interface.
//!
//! Concrete forecasting algorithms live outside this crate; the evaluator
//! only needs the fit/predict seam defined here.

use crate::error::ModelError;
use crate::series::TimeSeries;

/// Output of a single fit or predict call.
#[derive(Debug, Clone)]
pub struct Prediction {
    /// Point forecasts.
    pub series: TimeSeries,
    /// Optional uncertainty (standard error) estimate, aligned 1:1 with
    /// `series`. Models that cannot quantify uncertainty return `None`.
    pub stderr: Option<TimeSeries>,
}

impl Prediction {
    pub fn new(series: TimeSeries) -> Self {
        Self {
            series,
            stderr: None,
        }
    }

    pub fn with_stderr(series: TimeSeries, stderr: TimeSeries) -> Self {
        Self {
            series,
            stderr: Some(stderr),
        }
    }
}

/// A trainable forecasting model.
///
/// `fit` replaces any previously fitted state and returns the in-sample
/// forecast; `predict` forecasts values at the given timestamps
/// (microseconds since epoch) using the current fitted state. The evaluator
/// borrows the model exclusively for the duration of a run and leaves it in
/// its final fitted state.
pub trait Forecaster {
    fn fit(&mut self, train: &TimeSeries) -> std::result::Result<Prediction, ModelError>;

    fn predict(&mut self, timestamps: &[i64]) -> std::result::Result<Prediction, ModelError>;
}
