use super::check_event;
use crate::error::{AnalysisError, Result};
use crate::models::{LiveSample, RatingEvent, RawRatingSeries};

/// Turn a trial's mouse samples into a rating series covering at least the
/// reference horizon.
///
/// The player callback clock is ignored; browser time is authoritative. The
/// task never forced an initial rating, so a neutral event is placed at t=0.
/// If the participant stopped moving before the reference ended, their last
/// rating is held out to `reference_horizon_secs`.
///
/// Returns the series and the horizon it actually covers.
pub fn normalize_live(
    samples: &[LiveSample],
    reference_horizon_secs: f64,
    neutral_rating: f64,
) -> Result<(RawRatingSeries, f64)> {
    if samples.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let mut series = RawRatingSeries::new(Vec::with_capacity(samples.len() + 2));
    series.push(RatingEvent::new(0.0, neutral_rating));
    for sample in samples {
        series.push(check_event(RatingEvent::new(
            sample.time_ms() / 1000.0,
            sample.rating(),
        ))?);
    }
    // Upstream logs are not always in time order.
    series.sort_by_time();

    let last = *series.last().ok_or(AnalysisError::EmptySeries)?;
    if last.time < reference_horizon_secs {
        series.push(RatingEvent::new(reference_horizon_secs, last.value));
    }

    Ok((series, last.time.max(reference_horizon_secs)))
}
