pub mod live;
pub mod reference;

pub use live::normalize_live;
pub use reference::{normalize_reference, LikertScale};

use crate::error::{AnalysisError, Result};
use crate::models::RatingEvent;
use crate::series::MAX_HORIZON_SECS;

/// Times must fall in `[0, MAX_HORIZON_SECS]` and values must be finite.
fn check_event(event: RatingEvent) -> Result<RatingEvent> {
    let time_ok = (0.0..=MAX_HORIZON_SECS).contains(&event.time);
    if time_ok && event.value.is_finite() {
        Ok(event)
    } else {
        Err(AnalysisError::InvalidEvent {
            time: event.time,
            value: event.value,
        })
    }
}
