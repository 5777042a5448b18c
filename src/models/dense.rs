use serde::Serialize;

use crate::models::{RatingEvent, RawRatingSeries};

/// Ratings on a fixed per-millisecond grid, index = milliseconds from start.
///
/// Only the resampler and the aggregator build these; once built they are
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DenseSeries {
    values: Vec<f64>,
}

impl DenseSeries {
    pub(crate) fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Last millisecond index covered by the series.
    pub fn horizon_ms(&self) -> usize {
        self.values.len().saturating_sub(1)
    }

    pub fn get(&self, ms: usize) -> Option<f64> {
        self.values.get(ms).copied()
    }

    /// Back to one event per millisecond slot.
    pub fn to_raw(&self) -> RawRatingSeries {
        self.values
            .iter()
            .enumerate()
            .map(|(ms, &value)| RatingEvent::new(ms as f64 / 1000.0, value))
            .collect()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}
