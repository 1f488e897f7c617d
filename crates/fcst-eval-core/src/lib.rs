//! Sliding-window backtest evaluation for time series forecasting models.
//!
//! This crate simulates live deployment of a forecasting model over
//! historical data: a simulated clock steps through a held-out test range,
//! issuing a forecast request every `cadence` covering `horizon` ahead and
//! refitting the model every `retrain_frequency` on all data revealed so
//! far. The retained predictions align with the test series' timestamps and
//! can be scored with the accuracy metrics in [`metrics`].
//!
//! Forecasting algorithms themselves are external collaborators behind the
//! [`Forecaster`] trait.

pub mod error;
pub mod evaluator;
pub mod metrics;
pub mod model;
pub mod series;

// Re-exports for convenience
pub use error::{EvalError, ModelError, Result};
pub use evaluator::{
    evaluate, evaluate_with_progress, EvalConfig, EvalResult, RetainPolicy, StepInfo,
};
pub use metrics::{bias, mae, mape, mse, rmse, score, smape, Metric};
pub use model::{Forecaster, Prediction};
pub use series::TimeSeries;
