use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};

/// Actor code plus polarity-coded clip index, e.g. `EA03-N1`.
const STIMULUS_PATTERN: &str = r"EA\d+-[NP]\d+";

fn stimulus_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(STIMULUS_PATTERN).expect("stimulus pattern is valid"))
}

/// Name of a rated video, shared by every trial that showed it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StimulusName(String);

impl StimulusName {
    /// Pull the stimulus name out of a video filename or URL.
    pub fn from_filename(filename: &str) -> Result<Self> {
        stimulus_regex()
            .find(filename)
            .map(|m| Self(m.as_str().to_string()))
            .ok_or_else(|| AnalysisError::ParsePattern {
                filename: filename.to_string(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StimulusName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
