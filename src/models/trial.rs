//! Trial-related data models.
//!
//! A `Trial` is one video viewing by one participant in one session. It is
//! validated once at the ingestion boundary and consumed once by the pipeline.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::models::{LiveSample, StimulusName};

/// Identifies a trial in logs and output rows.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialKey {
    pub participant: String,
    pub session: String,
    pub trial_index: u32,
}

impl fmt::Display for TrialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ppt {} session {} trial {}",
            self.participant, self.session, self.trial_index
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trial {
    pub key: TrialKey,
    pub affect: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Older task builds did not record which video was shown.
    pub video_filename: Option<String>,
    pub responses: Vec<LiveSample>,
}

impl Trial {
    /// Resolve the stimulus shown in this trial.
    pub fn stimulus(&self) -> Result<StimulusName> {
        StimulusName::from_filename(self.video_filename.as_deref().unwrap_or_default())
    }
}
