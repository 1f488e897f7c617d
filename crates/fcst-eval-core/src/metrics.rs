//! Forecast accuracy metrics.
//!
//! Two layers: slice-level pure functions operating on equally long value
//! arrays, and [`score`], which aligns a ground-truth and a predicted
//! [`TimeSeries`] on their timestamp intersection before scoring. Backtest
//! results may legitimately cover only part of the test range (short
//! horizons leave gaps), so alignment is always by timestamp, never by
//! position.

use crate::error::{EvalError, Result};
use crate::series::TimeSeries;

/// Calculates Mean Absolute Error between actual and predicted values.
///
/// # Formula
/// MAE = (1/n) * Σ|actual_i - forecast_i|
pub fn mae(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).abs())
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Mean Squared Error between actual and predicted values.
///
/// # Formula
/// MSE = (1/n) * Σ(actual_i - forecast_i)²
pub fn mse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| (a - f).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Root Mean Squared Error between actual and predicted values.
///
/// # Formula
/// RMSE = √[(1/n) * Σ(actual_i - forecast_i)²]
pub fn rmse(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    Ok(mse(actual, forecast)?.sqrt())
}

/// Calculates Mean Absolute Percentage Error.
///
/// Timestamps with a zero actual value are excluded from the mean.
/// Returns NaN if every actual value is zero.
///
/// # Formula
/// MAPE = (100/n) * Σ|actual_i - forecast_i| / |actual_i|
pub fn mape(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .filter(|(a, _)| a.abs() > f64::EPSILON)
        .map(|(a, f)| ((a - f) / a).abs())
        .sum();
    let count = actual.iter().filter(|a| a.abs() > f64::EPSILON).count();
    if count == 0 {
        return Ok(f64::NAN);
    }
    Ok(sum / count as f64 * 100.0)
}

/// Calculates Symmetric Mean Absolute Percentage Error.
///
/// Ranges from 0 (perfect) to 200 (maximum error). A point where actual and
/// forecast are both zero contributes zero to the mean rather than being
/// skipped, so sMAPE of two all-zero series is 0, not NaN.
///
/// # Formula
/// sMAPE = (1/n) * Σ 200 * |actual_i - forecast_i| / (|actual_i| + |forecast_i|)
pub fn smape(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual
        .iter()
        .zip(forecast.iter())
        .map(|(a, f)| {
            let denom = a.abs() + f.abs();
            if denom > f64::EPSILON {
                200.0 * (a - f).abs() / denom
            } else {
                0.0
            }
        })
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Calculates Forecast Bias (mean error).
///
/// Positive bias means forecasts are too high on average.
///
/// # Formula
/// Bias = (1/n) * Σ(forecast_i - actual_i)
pub fn bias(actual: &[f64], forecast: &[f64]) -> Result<f64> {
    validate_inputs(actual, forecast)?;
    let sum: f64 = actual.iter().zip(forecast.iter()).map(|(a, f)| f - a).sum();
    Ok(sum / actual.len() as f64)
}

fn validate_inputs(actual: &[f64], forecast: &[f64]) -> Result<()> {
    if actual.len() != forecast.len() {
        return Err(EvalError::InvalidInput(format!(
            "Actual and forecast arrays must have the same length: {} vs {}",
            actual.len(),
            forecast.len()
        )));
    }
    if actual.is_empty() {
        return Err(EvalError::InsufficientData { needed: 1, got: 0 });
    }
    Ok(())
}

/// Named accuracy metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Rmse,
    Smape,
    Mae,
    Mse,
    Mape,
    Bias,
}

impl std::str::FromStr for Metric {
    type Err = EvalError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rmse" => Ok(Metric::Rmse),
            "smape" => Ok(Metric::Smape),
            "mae" => Ok(Metric::Mae),
            "mse" => Ok(Metric::Mse),
            "mape" => Ok(Metric::Mape),
            "bias" => Ok(Metric::Bias),
            _ => Err(EvalError::InvalidInput(format!("Unknown metric: {}", s))),
        }
    }
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Rmse => "RMSE",
            Metric::Smape => "sMAPE",
            Metric::Mae => "MAE",
            Metric::Mse => "MSE",
            Metric::Mape => "MAPE",
            Metric::Bias => "Bias",
        }
    }

    /// Applies the metric to equally long value arrays.
    pub fn compute(&self, actual: &[f64], forecast: &[f64]) -> Result<f64> {
        match self {
            Metric::Rmse => rmse(actual, forecast),
            Metric::Smape => smape(actual, forecast),
            Metric::Mae => mae(actual, forecast),
            Metric::Mse => mse(actual, forecast),
            Metric::Mape => mape(actual, forecast),
            Metric::Bias => bias(actual, forecast),
        }
    }
}

/// Scores a predicted series against ground truth.
///
/// Both series are restricted to their timestamp intersection; per-variable
/// values at each shared timestamp are flattened into one array per side
/// before the metric is applied.
///
/// # Errors
/// Returns `Alignment` when the series differ in dimensionality or share no
/// timestamps.
pub fn score(metric: Metric, actual: &TimeSeries, predicted: &TimeSeries) -> Result<f64> {
    if actual.dim() != predicted.dim() {
        return Err(EvalError::Alignment(format!(
            "Series dimensionality differs: {} vs {}",
            actual.dim(),
            predicted.dim()
        )));
    }
    let shared = actual.intersect_timestamps(predicted);
    if shared.is_empty() {
        return Err(EvalError::Alignment(
            "Series share no overlapping timestamps".to_string(),
        ));
    }

    let mut a = Vec::with_capacity(shared.len() * actual.dim());
    let mut p = Vec::with_capacity(shared.len() * actual.dim());
    for &ts in &shared {
        let a_row = actual
            .value_at(ts)
            .ok_or_else(|| EvalError::Alignment(format!("Missing actual sample at {}", ts)))?;
        let p_row = predicted
            .value_at(ts)
            .ok_or_else(|| EvalError::Alignment(format!("Missing predicted sample at {}", ts)))?;
        a.extend_from_slice(a_row);
        p.extend_from_slice(p_row);
    }
    metric.compute(&a, &p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rmse() {
        let actual = vec![1.0, 2.0, 3.0];
        let forecast = vec![1.0, 2.0, 4.0];
        let result = rmse(&actual, &forecast).unwrap();
        // MSE = 1/3, RMSE = sqrt(1/3)
        assert_relative_eq!(result, (1.0_f64 / 3.0).sqrt(), epsilon = 0.001);
    }

    #[test]
    fn test_rmse_identical_series_is_zero() {
        let actual = vec![1.5, -2.0, 0.0, 4.25];
        let result = rmse(&actual, &actual).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_smape_identical_series_is_zero() {
        let actual = vec![100.0, 50.0, 25.0];
        let result = smape(&actual, &actual).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_smape_both_zero_contributes_zero() {
        // [0] vs [0] is a perfect forecast, not a division by zero
        let result = smape(&[0.0], &[0.0]).unwrap();
        assert_eq!(result, 0.0);
        assert!(!result.is_nan());

        // The zero point is counted in the mean, not skipped
        let result = smape(&[0.0, 100.0], &[0.0, 50.0]).unwrap();
        assert_relative_eq!(result, 200.0 / 3.0 / 2.0, epsilon = 0.001);
    }

    #[test]
    fn test_smape_bounded() {
        let actual = vec![100.0, 50.0, 25.0];
        let forecast = vec![200.0, 10.0, 100.0];
        let result = smape(&actual, &forecast).unwrap();
        assert!(result >= 0.0 && result <= 200.0);
    }

    #[test]
    fn test_mae() {
        let actual = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let forecast = vec![1.1, 2.2, 2.9, 4.1, 4.8];
        let result = mae(&actual, &forecast).unwrap();
        assert_relative_eq!(result, 0.14, epsilon = 0.01);
    }

    #[test]
    fn test_mape_skips_zero_actuals() {
        let actual = vec![0.0, 100.0, 200.0];
        let forecast = vec![10.0, 110.0, 180.0];
        let result = mape(&actual, &forecast).unwrap();
        assert_relative_eq!(result, 10.0, epsilon = 0.001);
    }

    #[test]
    fn test_bias() {
        let actual = vec![1.0, 2.0, 3.0];
        let forecast = vec![2.0, 3.0, 4.0];
        assert_relative_eq!(bias(&actual, &forecast).unwrap(), 1.0, epsilon = 0.001);
        assert_relative_eq!(bias(&forecast, &actual).unwrap(), -1.0, epsilon = 0.001);
    }

    #[test]
    fn test_validate_inputs() {
        assert!(mae(&[1.0, 2.0], &[1.0]).is_err());
        assert!(rmse(&[], &[]).is_err());
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("rmse".parse::<Metric>().unwrap(), Metric::Rmse);
        assert_eq!("sMAPE".parse::<Metric>().unwrap(), Metric::Smape);
        assert_eq!("MAE".parse::<Metric>().unwrap(), Metric::Mae);
        assert!("wape".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_names() {
        assert_eq!(Metric::Rmse.name(), "RMSE");
        assert_eq!(Metric::Smape.name(), "sMAPE");
    }

    #[test]
    fn test_score_aligns_on_intersection() {
        // Predictions cover every other timestamp; only those are scored.
        let actual =
            TimeSeries::univariate(vec![0, 100, 200, 300], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let predicted = TimeSeries::univariate(vec![0, 200], vec![1.0, 3.0]).unwrap();
        let result = score(Metric::Rmse, &actual, &predicted).unwrap();
        assert_eq!(result, 0.0);
    }

    #[test]
    fn test_score_multivariate_flattens_variables() {
        let actual = TimeSeries::new(vec![0, 100], vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let predicted =
            TimeSeries::new(vec![0, 100], vec![vec![1.0, 2.0], vec![3.0, 6.0]]).unwrap();
        // Single off-by-2 among 4 values: MSE = 4/4 = 1, RMSE = 1
        let result = score(Metric::Rmse, &actual, &predicted).unwrap();
        assert_relative_eq!(result, 1.0, epsilon = 0.001);
    }

    #[test]
    fn test_score_disjoint_timestamps_is_alignment_error() {
        let actual = TimeSeries::univariate(vec![0, 100], vec![1.0, 2.0]).unwrap();
        let predicted = TimeSeries::univariate(vec![50, 150], vec![1.0, 2.0]).unwrap();
        assert!(matches!(
            score(Metric::Rmse, &actual, &predicted),
            Err(EvalError::Alignment(_))
        ));
    }

    #[test]
    fn test_score_dim_mismatch_is_alignment_error() {
        let actual = TimeSeries::univariate(vec![0], vec![1.0]).unwrap();
        let predicted = TimeSeries::new(vec![0], vec![vec![1.0, 2.0]]).unwrap();
        assert!(matches!(
            score(Metric::Smape, &actual, &predicted),
            Err(EvalError::Alignment(_))
        ));
    }
}
