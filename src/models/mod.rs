pub mod dense;
pub mod rating;
pub mod record;
pub mod stimulus;
pub mod trial;

pub use dense::DenseSeries;
pub use rating::{LiveSample, RatingEvent, RawRatingSeries, ReferenceRow};
pub use record::CorrelationRecord;
pub use stimulus::StimulusName;
pub use trial::{Trial, TrialKey};
