//! Error types for the rating alignment core.
//!
//! Per-trial variants (`ParsePattern`, `EmptySeries`, `InvalidEvent`,
//! `ReferenceUnavailable`) are caught by the pipeline and turned into skips. `LengthMismatch` and
//! `StageOrder` mean the pipeline itself is broken and are propagated.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("video filename {filename:?} does not contain a stimulus name")]
    ParsePattern { filename: String },

    #[error("rating series has no events")]
    EmptySeries,

    #[error("rating event at {time}s with value {value} is outside the usable range")]
    InvalidEvent { time: f64, value: f64 },

    #[error("series length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("stimulus {stimulus} has no contributing trials")]
    NoContributors { stimulus: String },

    #[error("reference for stimulus {stimulus} is unavailable: {reason}")]
    ReferenceUnavailable { stimulus: String, reason: String },

    #[error("pipeline is {actual}, expected {expected}")]
    StageOrder {
        expected: &'static str,
        actual: &'static str,
    },
}

impl AnalysisError {
    /// Whether the error only affects the trial it was raised for.
    pub fn is_per_trial(&self) -> bool {
        matches!(
            self,
            AnalysisError::ParsePattern { .. }
                | AnalysisError::EmptySeries
                | AnalysisError::InvalidEvent { .. }
                | AnalysisError::ReferenceUnavailable { .. }
                | AnalysisError::NoContributors { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
