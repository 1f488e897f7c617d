//! Sliding-window backtest evaluation.
//!
//! Replays historical data through a model as if it were deployed live:
//! the model is fit once on the training range, then a simulated clock
//! steps through the test range issuing a forecast request every `cadence`
//! covering `horizon` ahead, refitting every `retrain_frequency` on all
//! data revealed so far. The retained per-window predictions line up with
//! the test series' own timestamps, so the result can be scored directly
//! against ground truth.

use chrono::TimeDelta;

use crate::error::{EvalError, Result};
use crate::model::Forecaster;
use crate::series::TimeSeries;

/// Which slice of an overlapping forecast window is retained.
///
/// With `horizon > cadence` successive windows cover some timestamps more
/// than once; exactly one forecast per timestamp is kept, and the policy
/// decides which one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetainPolicy {
    /// Keep the predictions inside `[t, t + cadence)` of each window: the
    /// most recently issued forecast for every timestamp.
    #[default]
    Newest,
    /// Keep every prediction for a timestamp no earlier window has already
    /// covered: the first-issued forecast for every timestamp.
    Oldest,
}

/// Backtest configuration.
#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// How far ahead each forecast request must cover.
    pub horizon: TimeDelta,
    /// Simulated interval between successive forecast requests.
    pub cadence: TimeDelta,
    /// Simulated interval between refits on newly revealed data.
    /// `None` means the model is fit once at the start and never again.
    pub retrain_frequency: Option<TimeDelta>,
    /// Earliest timestamp (microseconds since epoch) at which retraining
    /// may begin. `None` lets the elapsed-time rule alone decide.
    pub retrain_start: Option<i64>,
    /// Overlapping-window retention policy.
    pub retain: RetainPolicy,
}

impl EvalConfig {
    pub fn new(horizon: TimeDelta, cadence: TimeDelta) -> Self {
        Self {
            horizon,
            cadence,
            retrain_frequency: None,
            retrain_start: None,
            retain: RetainPolicy::default(),
        }
    }

    pub fn with_retrain_frequency(mut self, frequency: TimeDelta) -> Self {
        self.retrain_frequency = Some(frequency);
        self
    }

    pub fn with_retrain_start(mut self, timestamp: i64) -> Self {
        self.retrain_start = Some(timestamp);
        self
    }

    pub fn with_retain(mut self, retain: RetainPolicy) -> Self {
        self.retain = retain;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        delta_micros("horizon", self.horizon)?;
        delta_micros("cadence", self.cadence)?;
        if let Some(frequency) = self.retrain_frequency {
            delta_micros("retrain_frequency", frequency)?;
        }
        Ok(())
    }
}

/// Converts a config duration to microseconds, rejecting non-positive or
/// overflowing values.
fn delta_micros(param: &str, delta: TimeDelta) -> Result<i64> {
    let micros = delta.num_microseconds().ok_or_else(|| EvalError::InvalidConfig {
        param: param.to_string(),
        value: format!("{}", delta),
        reason: "duration overflows the microsecond range".to_string(),
    })?;
    if micros <= 0 {
        return Err(EvalError::InvalidConfig {
            param: param.to_string(),
            value: format!("{}", delta),
            reason: "must be a positive duration".to_string(),
        });
    }
    Ok(micros)
}

/// Passed to the progress callback once per loop iteration.
#[derive(Debug, Clone, Copy)]
pub struct StepInfo {
    /// 0-based loop iteration index.
    pub window: usize,
    /// Simulated clock for this window (microseconds since epoch).
    pub at: i64,
    /// Predictions retained from this window.
    pub retained: usize,
}

/// Outcome of a backtest run.
///
/// The final trained model state stays with the caller: the evaluator
/// borrows the model mutably and leaves it fitted on the last retrain
/// window when the run finishes.
#[derive(Debug, Clone)]
pub struct EvalResult {
    /// Retained (timestamp, prediction) pairs, in timestamp order. The
    /// timestamps are a subsequence of the test series' timestamps.
    pub predictions: TimeSeries,
    /// Uncertainty aligned with `predictions`, or `None` if the model
    /// declined to produce an uncertainty estimate on any window.
    pub stderr: Option<TimeSeries>,
    /// Number of predict calls issued.
    pub n_windows: usize,
    /// Number of fit calls issued (initial fit included).
    pub n_fits: usize,
}

/// Runs a sliding-window backtest of `model` over `test`, after an initial
/// fit on `train`.
///
/// `test` must follow `train` chronologically and share its dimensionality.
/// Any fit or predict failure aborts the whole run; partial results are
/// discarded because a stale model state would invalidate every subsequent
/// window.
pub fn evaluate<M: Forecaster>(
    model: &mut M,
    train: &TimeSeries,
    test: &TimeSeries,
    config: &EvalConfig,
) -> Result<EvalResult> {
    evaluate_with_progress(model, train, test, config, |_| true)
}

/// Like [`evaluate`], invoking `on_step` once per loop iteration. Returning
/// `false` from the callback aborts the run with [`EvalError::Aborted`].
pub fn evaluate_with_progress<M, F>(
    model: &mut M,
    train: &TimeSeries,
    test: &TimeSeries,
    config: &EvalConfig,
    mut on_step: F,
) -> Result<EvalResult>
where
    M: Forecaster,
    F: FnMut(&StepInfo) -> bool,
{
    config.validate()?;
    let horizon = delta_micros("horizon", config.horizon)?;
    let cadence = delta_micros("cadence", config.cadence)?;
    let retrain_every = config
        .retrain_frequency
        .map(|f| delta_micros("retrain_frequency", f))
        .transpose()?;

    let train_end = train
        .end()
        .ok_or(EvalError::InsufficientData { needed: 1, got: 0 })?;
    let test_start = test
        .start()
        .ok_or(EvalError::InsufficientData { needed: 1, got: 0 })?;
    let test_end = test.end().unwrap_or(test_start);
    if train.dim() != test.dim() {
        return Err(EvalError::InvalidInput(format!(
            "Train and test dimensionality differ: {} vs {}",
            train.dim(),
            test.dim()
        )));
    }
    if test_start <= train_end {
        return Err(EvalError::InvalidInput(format!(
            "Test range must start after the training range ends: {} <= {}",
            test_start, train_end
        )));
    }
    if let Some(retrain_start) = config.retrain_start {
        if retrain_start <= train_end {
            return Err(EvalError::InvalidConfig {
                param: "retrain_start".to_string(),
                value: retrain_start.to_string(),
                reason: "must be after the training range ends".to_string(),
            });
        }
    }

    // Mandatory initial fit; the in-sample forecast it returns is not used.
    model.fit(train).map_err(|cause| EvalError::ModelFit {
        at: train_end,
        window: 0,
        cause,
    })?;
    let mut n_fits = 1usize;
    let mut n_windows = 0usize;
    let mut last_fit = train_end;

    let mut out_timestamps: Vec<i64> = Vec::new();
    let mut out_values: Vec<Vec<f64>> = Vec::new();
    // Collected while every window supplies an uncertainty estimate.
    let mut out_stderr: Option<(Vec<i64>, Vec<Vec<f64>>)> = Some((Vec::new(), Vec::new()));
    // Exclusive end of the range already covered (Oldest policy only).
    let mut covered_until = test_start;

    let mut t = test_start;
    let mut window = 0usize;
    while t <= test_end {
        if let Some(every) = retrain_every {
            let allowed = config.retrain_start.map_or(true, |start| t >= start);
            if allowed && t - last_fit >= every {
                let observed = train.concat(&test.slice(test_start, t))?;
                model.fit(&observed).map_err(|cause| EvalError::ModelFit {
                    at: t,
                    window,
                    cause,
                })?;
                n_fits += 1;
                last_fit = t;
            }
        }

        let window_end = t.saturating_add(horizon);
        let targets = test.timestamps_in(t, window_end);
        let mut retained = 0usize;
        if !targets.is_empty() {
            let prediction = model
                .predict(targets)
                .map_err(|cause| EvalError::ModelPredict {
                    at: t,
                    window,
                    cause,
                })?;
            n_windows += 1;

            let forecast = &prediction.series;
            if !forecast.is_empty() && forecast.dim() != test.dim() {
                return Err(EvalError::InvalidInput(format!(
                    "Model forecast dimensionality {} does not match series dimensionality {}",
                    forecast.dim(),
                    test.dim()
                )));
            }

            let (keep_from, keep_until) = match config.retain {
                RetainPolicy::Newest => (t, window_end.min(t.saturating_add(cadence))),
                RetainPolicy::Oldest => (covered_until.max(t), window_end),
            };
            for &ts in forecast.timestamps_in(keep_from, keep_until) {
                // Only requested timestamps count; anything else the model
                // returned would break alignment with ground truth.
                if test.value_at(ts).is_none() {
                    continue;
                }
                if let Some(row) = forecast.value_at(ts) {
                    out_timestamps.push(ts);
                    out_values.push(row.to_vec());
                    if let Some((err_ts, err_rows)) = out_stderr.as_mut() {
                        if let Some(err_row) =
                            prediction.stderr.as_ref().and_then(|s| s.value_at(ts))
                        {
                            err_ts.push(ts);
                            err_rows.push(err_row.to_vec());
                        }
                    }
                    retained += 1;
                }
            }
            if prediction.stderr.is_none() {
                out_stderr = None;
            }
            covered_until = covered_until.max(keep_until);
        }

        let info = StepInfo {
            window,
            at: t,
            retained,
        };
        if !on_step(&info) {
            return Err(EvalError::Aborted { at: t, window });
        }

        window += 1;
        t = match t.checked_add(cadence) {
            Some(next) => next,
            None => break,
        };
    }

    let predictions = if out_timestamps.is_empty() {
        TimeSeries::empty(test.dim())
    } else {
        TimeSeries::new(out_timestamps, out_values)?
    };
    let stderr = match out_stderr {
        Some((err_ts, err_rows)) if err_ts.len() == predictions.len() => {
            Some(TimeSeries::new(err_ts, err_rows)?)
        }
        _ => None,
    };

    Ok(EvalResult {
        predictions,
        stderr,
        n_windows,
        n_fits,
    })
}
