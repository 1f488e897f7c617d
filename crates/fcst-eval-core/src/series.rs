//! Time series container used throughout the evaluator.

use crate::error::{EvalError, Result};
use chrono::NaiveDateTime;

/// Convert NaiveDateTime to microseconds since epoch.
fn datetime_to_micros(dt: NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_micros()
}

/// An ordered multivariate time series.
///
/// Timestamps are `i64` microseconds since the Unix epoch, strictly
/// increasing. Every sample carries the same number of variables (`dim`).
/// Instances are immutable once constructed; slicing and concatenation
/// produce new series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    timestamps: Vec<i64>,
    values: Vec<Vec<f64>>,
    dim: usize,
}

impl TimeSeries {
    /// Create a series from parallel timestamp and value arrays.
    ///
    /// # Errors
    /// Returns `InvalidInput` when the arrays differ in length, timestamps
    /// are not strictly increasing, or rows differ in dimensionality.
    pub fn new(timestamps: Vec<i64>, values: Vec<Vec<f64>>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(EvalError::InvalidInput(format!(
                "Timestamps and values must have the same length: {} vs {}",
                timestamps.len(),
                values.len()
            )));
        }
        if let Some(w) = timestamps.windows(2).find(|w| w[1] <= w[0]) {
            return Err(EvalError::InvalidInput(format!(
                "Timestamps must be strictly increasing: {} followed by {}",
                w[0], w[1]
            )));
        }
        let dim = values.first().map_or(0, Vec::len);
        if let Some(row) = values.iter().find(|row| row.len() != dim) {
            return Err(EvalError::InvalidInput(format!(
                "All samples must have the same dimensionality: expected {}, got {}",
                dim,
                row.len()
            )));
        }
        Ok(Self {
            timestamps,
            values,
            dim,
        })
    }

    /// Create an empty series with a known dimensionality.
    pub fn empty(dim: usize) -> Self {
        Self {
            timestamps: Vec::new(),
            values: Vec::new(),
            dim,
        }
    }

    /// Create a single-variable series.
    pub fn univariate(timestamps: Vec<i64>, values: Vec<f64>) -> Result<Self> {
        let values = values.into_iter().map(|v| vec![v]).collect();
        Self::new(timestamps, values)
    }

    /// Create a series from chrono datetimes (interpreted as UTC).
    pub fn from_datetimes(datetimes: &[NaiveDateTime], values: Vec<Vec<f64>>) -> Result<Self> {
        let timestamps = datetimes.iter().map(|dt| datetime_to_micros(*dt)).collect();
        Self::new(timestamps, values)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of variables per sample.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// First timestamp, `None` when empty.
    pub fn start(&self) -> Option<i64> {
        self.timestamps.first().copied()
    }

    /// Last timestamp, `None` when empty.
    pub fn end(&self) -> Option<i64> {
        self.timestamps.last().copied()
    }

    /// Sample at an exact timestamp.
    pub fn value_at(&self, timestamp: i64) -> Option<&[f64]> {
        self.timestamps
            .binary_search(&timestamp)
            .ok()
            .map(|idx| self.values[idx].as_slice())
    }

    /// Timestamps falling within the half-open range `[start, end)`.
    pub fn timestamps_in(&self, start: i64, end: i64) -> &[i64] {
        let lo = self.timestamps.partition_point(|&ts| ts < start);
        let hi = self.timestamps.partition_point(|&ts| ts < end);
        &self.timestamps[lo..hi]
    }

    /// Samples falling within the half-open range `[start, end)`, as a new
    /// series of the same dimensionality.
    pub fn slice(&self, start: i64, end: i64) -> TimeSeries {
        let lo = self.timestamps.partition_point(|&ts| ts < start);
        let hi = self.timestamps.partition_point(|&ts| ts < end);
        TimeSeries {
            timestamps: self.timestamps[lo..hi].to_vec(),
            values: self.values[lo..hi].to_vec(),
            dim: self.dim,
        }
    }

    /// Append a chronologically later series of the same dimensionality.
    ///
    /// # Errors
    /// Returns `InvalidInput` on dimensionality mismatch or when `later`
    /// does not start strictly after this series ends.
    pub fn concat(&self, later: &TimeSeries) -> Result<TimeSeries> {
        if later.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(later.clone());
        }
        if self.dim != later.dim {
            return Err(EvalError::InvalidInput(format!(
                "Cannot concatenate series of different dimensionality: {} vs {}",
                self.dim, later.dim
            )));
        }
        // Bounds checked above; both series are non-empty here.
        let (self_end, later_start) = (self.timestamps[self.len() - 1], later.timestamps[0]);
        if later_start <= self_end {
            return Err(EvalError::InvalidInput(format!(
                "Concatenated series must start after {}, starts at {}",
                self_end, later_start
            )));
        }
        let mut timestamps = self.timestamps.clone();
        timestamps.extend_from_slice(&later.timestamps);
        let mut values = self.values.clone();
        values.extend_from_slice(&later.values);
        Ok(TimeSeries {
            timestamps,
            values,
            dim: self.dim,
        })
    }

    /// Sorted intersection of the two series' timestamps.
    pub fn intersect_timestamps(&self, other: &TimeSeries) -> Vec<i64> {
        let mut shared = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.timestamps.len() && j < other.timestamps.len() {
            match self.timestamps[i].cmp(&other.timestamps[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    shared.push(self.timestamps[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        shared
    }

    /// Modal gap between consecutive samples in microseconds, i.e. the
    /// sampling granularity. `None` for series with fewer than two samples.
    pub fn sample_step(&self) -> Option<i64> {
        if self.timestamps.len() < 2 {
            return None;
        }
        let mut counts = std::collections::HashMap::new();
        for w in self.timestamps.windows(2) {
            *counts.entry(w[1] - w[0]).or_insert(0usize) += 1;
        }
        counts
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(diff, _)| diff)
    }
}
