use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::normalize::LikertScale;
use crate::pipeline::PipelineConfig;

const ENABLE_LOGS: bool = true;

/// Settings for one analysis run, read from a JSON file. Every field has a
/// default, so an empty `{}` (or no file at all) is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Rating assumed for a participant before they first touch the control.
    pub neutral_rating: f64,
    pub likert_min: f64,
    pub likert_max: f64,
    /// Offset used to render trial timestamps in the output.
    pub utc_offset_minutes: i32,
    /// Directory holding `<stimulus>.csv` actor self-ratings.
    pub reference_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Only read export rows whose metadata says `"payload": "full"`.
    pub require_full_payload: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            neutral_rating: 0.5,
            likert_min: 1.0,
            likert_max: 9.0,
            utc_offset_minutes: 0,
            reference_dir: PathBuf::from("original-ratings"),
            output_dir: PathBuf::from("."),
            require_full_payload: true,
        }
    }
}

impl AnalysisSettings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            crate::log_info!("No settings at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings in {}", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.likert_max.partial_cmp(&self.likert_min) != Some(std::cmp::Ordering::Greater) {
            anyhow::bail!(
                "likert_max ({}) must be greater than likert_min ({})",
                self.likert_max,
                self.likert_min
            );
        }
        self.timezone()?;
        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .with_context(|| format!("utc_offset_minutes {} is out of range", self.utc_offset_minutes))
    }

    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        Ok(PipelineConfig {
            neutral_rating: self.neutral_rating,
            scale: LikertScale {
                min: self.likert_min,
                max: self.likert_max,
            },
            timezone: self.timezone()?,
        })
    }

    pub fn reference_dir(&self) -> &Path {
        &self.reference_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}
