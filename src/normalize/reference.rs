use serde::{Deserialize, Serialize};

use super::check_event;
use crate::error::{AnalysisError, Result};
use crate::models::{RatingEvent, RawRatingSeries, ReferenceRow, StimulusName};

/// Closed rating scale used by the actor self-reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LikertScale {
    pub min: f64,
    pub max: f64,
}

impl Default for LikertScale {
    fn default() -> Self {
        Self { min: 1.0, max: 9.0 }
    }
}

impl LikertScale {
    /// Map a rating onto [0, 1]; with the default scale this is `(r - 1) / 8`.
    pub fn to_unit(&self, rating: f64) -> f64 {
        (rating - self.min) / (self.max - self.min)
    }
}

/// Rescale an actor's self-ratings to the unit interval and name the stimulus
/// they belong to.
pub fn normalize_reference(
    rows: &[ReferenceRow],
    filename: &str,
    scale: LikertScale,
) -> Result<(RawRatingSeries, StimulusName)> {
    let name = StimulusName::from_filename(filename)?;

    if rows.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let mut series = rows
        .iter()
        .map(|row| check_event(RatingEvent::new(row.time, scale.to_unit(row.rating))))
        .collect::<Result<RawRatingSeries>>()?;
    series.sort_by_time();

    Ok((series, name))
}
