use crate::models::{DenseSeries, RawRatingSeries};

/// Value for slots before the first event. Normalized live series always
/// start at t=0, so this only matters for hand-built input.
pub const DEFAULT_FILL: f64 = 0.5;

/// Absorbs float error when a time was itself derived from a millisecond
/// index (`ms / 1000.0`), so it maps back to the same slot.
const MS_EPSILON: f64 = 1e-6;

/// Longest series the normalizers accept. Clips run for seconds, so
/// anything near this is a corrupt timestamp.
pub const MAX_HORIZON_SECS: f64 = 3600.0;

/// Millisecond slot for a time in seconds.
pub fn ms_index(seconds: f64) -> usize {
    let ms = (seconds * 1000.0 + MS_EPSILON).floor();
    if ms.is_nan() || ms <= 0.0 {
        0
    } else {
        // Saturates at usize::MAX for huge or infinite times.
        ms as usize
    }
}

/// Number of slots in a dense series covering `[0, horizon]` inclusive.
pub fn dense_len(horizon_secs: f64) -> usize {
    ms_index(horizon_secs).saturating_add(1)
}

/// Resample onto a per-millisecond grid by carrying each rating forward
/// until the next one.
///
/// The series must be sorted by time. Events past the horizon are dropped,
/// and when two events share a slot the later one wins.
pub fn resample(series: &RawRatingSeries, horizon_secs: f64) -> DenseSeries {
    let len = dense_len(horizon_secs);
    debug_assert!(series.is_sorted_by_time(), "resample needs time-sorted input");

    let mut slots: Vec<Option<f64>> = vec![None; len];
    for event in series.events() {
        let idx = ms_index(event.time);
        if idx < len {
            slots[idx] = Some(event.value);
        }
    }

    let mut carried = DEFAULT_FILL;
    let values = slots
        .into_iter()
        .map(|slot| {
            if let Some(value) = slot {
                carried = value;
            }
            carried
        })
        .collect();

    DenseSeries::from_values(values)
}
