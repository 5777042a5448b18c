use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PipelineStage {
    Ingesting,
    Aggregating,
    Correlating,
    Done,
}

impl Default for PipelineStage {
    fn default() -> Self {
        PipelineStage::Ingesting
    }
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Ingesting => "Ingesting",
            PipelineStage::Aggregating => "Aggregating",
            PipelineStage::Correlating => "Correlating",
            PipelineStage::Done => "Done",
        }
    }

    /// The only stage allowed to follow this one.
    pub fn next(&self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Ingesting => Some(PipelineStage::Aggregating),
            PipelineStage::Aggregating => Some(PipelineStage::Correlating),
            PipelineStage::Correlating => Some(PipelineStage::Done),
            PipelineStage::Done => None,
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
