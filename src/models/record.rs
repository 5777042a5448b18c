use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::models::{StimulusName, TrialKey};

/// One output row: how closely a participant tracked the actor and the crowd.
///
/// Correlations are `NaN` when either series is constant; that is a valid
/// result and is written out as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRecord {
    pub participant: String,
    pub session: String,
    pub trial_index: u32,
    pub affect: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub stimulus: StimulusName,
    pub pearson_vs_reference: f64,
    pub pearson_vs_mean: f64,
}

impl CorrelationRecord {
    pub fn key(&self) -> TrialKey {
        TrialKey {
            participant: self.participant.clone(),
            session: self.session.clone(),
            trial_index: self.trial_index,
        }
    }
}
