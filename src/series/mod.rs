pub mod correlation;
pub mod resample;

pub use correlation::pearson;
pub use resample::{dense_len, ms_index, resample, DEFAULT_FILL, MAX_HORIZON_SECS};
