//! Batch orchestration: ingest every trial, build the per-stimulus means,
//! then correlate each trial against its reference and its stimulus mean.
//!
//! The mean for a stimulus includes every trial that rated it, so nothing can
//! be correlated against a mean until ingestion has finished.

pub mod references;
pub mod state;

pub use references::{CsvReferenceDir, PreparedReference, ReferenceCache, ReferenceSource};
pub use state::PipelineStage;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::aggregate::{AggregateMeans, Aggregator};
use crate::error::{AnalysisError, Result};
use crate::models::{
    CorrelationRecord, DenseSeries, RawRatingSeries, StimulusName, Trial, TrialKey,
};
use crate::normalize::{normalize_live, LikertScale};
use crate::series::{dense_len, pearson, resample};

const ENABLE_LOGS: bool = true;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub neutral_rating: f64,
    pub scale: LikertScale,
    /// Zone trial timestamps are reported in.
    pub timezone: FixedOffset,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            neutral_rating: 0.5,
            scale: LikertScale::default(),
            timezone: Utc.fix(),
        }
    }
}

/// A trial that produced no output row, and why.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedTrial {
    pub key: TrialKey,
    pub reason: String,
}

/// What survives ingestion until correlation.
struct IngestedTrial {
    key: TrialKey,
    affect: String,
    timestamp: Option<DateTime<FixedOffset>>,
    stimulus: StimulusName,
    reference: Arc<PreparedReference>,
    live: RawRatingSeries,
    effective_horizon_secs: f64,
    /// Position of this trial's series among its stimulus's contributions.
    slot: usize,
}

/// Output of ingesting one trial, computed off the main thread.
struct PreparedTrial {
    live: RawRatingSeries,
    effective_horizon_secs: f64,
    aligned: DenseSeries,
}

pub struct Pipeline<S> {
    config: PipelineConfig,
    references: ReferenceCache<S>,
    stage: PipelineStage,
    aggregator: Aggregator,
    ingested: Vec<IngestedTrial>,
    skipped: Vec<SkippedTrial>,
    means: AggregateMeans,
}

impl<S: ReferenceSource> Pipeline<S> {
    pub fn new(config: PipelineConfig, source: S) -> Self {
        let references = ReferenceCache::new(source, config.scale);
        Self {
            config,
            references,
            stage: PipelineStage::Ingesting,
            aggregator: Aggregator::new(),
            ingested: Vec::new(),
            skipped: Vec::new(),
            means: AggregateMeans::default(),
        }
    }

    pub fn stage(&self) -> PipelineStage {
        self.stage
    }

    pub fn skipped(&self) -> &[SkippedTrial] {
        &self.skipped
    }

    /// Run all stages over one batch of trials.
    pub fn run(mut self, trials: Vec<Trial>) -> Result<PipelineReport> {
        self.ingest(trials)?;
        self.aggregate()?;
        let records = self.correlate()?;
        Ok(self.into_report(records))
    }

    /// Normalize and resample trials, filing each under its stimulus. May be
    /// called repeatedly until `aggregate`.
    pub fn ingest(&mut self, trials: Vec<Trial>) -> Result<()> {
        self.expect_stage(PipelineStage::Ingesting)?;

        // References are shared between trials, so they are resolved here,
        // before the per-trial work fans out.
        let mut resolved = Vec::with_capacity(trials.len());
        for trial in trials {
            let found = trial
                .stimulus()
                .and_then(|stimulus| Ok((self.references.get(&stimulus)?, stimulus)));
            match found {
                Ok((reference, stimulus)) => resolved.push((trial, stimulus, reference)),
                Err(err) => self.skip(trial.key, &err),
            }
        }

        let neutral = self.config.neutral_rating;
        let prepared: Vec<Result<PreparedTrial>> = resolved
            .par_iter()
            .map(|(trial, _, reference)| prepare_trial(trial, reference, neutral))
            .collect();

        for ((trial, stimulus, reference), outcome) in resolved.into_iter().zip(prepared) {
            let prepared = match outcome {
                Ok(prepared) => prepared,
                Err(err) if err.is_per_trial() => {
                    self.skip(trial.key, &err);
                    continue;
                }
                Err(err) => return Err(err),
            };

            let slot = self
                .aggregator
                .file(stimulus.clone(), trial.key.clone(), prepared.aligned)?;
            crate::log_debug!(
                "Ingested {} ({}, {:.3}s)",
                trial.key,
                stimulus,
                prepared.effective_horizon_secs
            );
            self.ingested.push(IngestedTrial {
                key: trial.key,
                affect: trial.affect,
                timestamp: trial.timestamp,
                stimulus,
                reference,
                live: prepared.live,
                effective_horizon_secs: prepared.effective_horizon_secs,
                slot,
            });
        }

        Ok(())
    }

    /// Close ingestion and build the per-stimulus means.
    pub fn aggregate(&mut self) -> Result<()> {
        self.expect_stage(PipelineStage::Ingesting)?;
        self.advance();

        self.means = self.aggregator.compute_means()?;
        crate::log_info!(
            "Aggregated {} trials into {} stimulus means ({} skipped)",
            self.aggregator.trial_count(),
            self.means.len(),
            self.skipped.len()
        );

        self.advance();
        Ok(())
    }

    /// One record per ingested trial, in ingestion order.
    pub fn correlate(&mut self) -> Result<Vec<CorrelationRecord>> {
        self.expect_stage(PipelineStage::Correlating)?;

        let mut records = Vec::with_capacity(self.ingested.len());
        for trial in std::mem::take(&mut self.ingested) {
            let aligned = &self.aggregator.contributions(&trial.stimulus)[trial.slot].series;

            let pearson_vs_mean = match self.means.get(&trial.stimulus) {
                Ok(mean) => pearson(mean, aligned)?,
                Err(err) => {
                    crate::log_warn!("No mean comparison for {}: {}", trial.key, err);
                    f64::NAN
                }
            };

            // A trial that ran longer than the reference is compared with the
            // reference over its own length, reference held at its last value.
            let pearson_vs_reference =
                if dense_len(trial.effective_horizon_secs) > trial.reference.dense.len() {
                    let horizon = trial.effective_horizon_secs;
                    pearson(
                        &resample(&trial.reference.raw, horizon),
                        &resample(&trial.live, horizon),
                    )?
                } else {
                    pearson(&trial.reference.dense, aligned)?
                };

            if pearson_vs_reference.is_nan() || pearson_vs_mean.is_nan() {
                crate::log_info!("{} has a constant series; correlation is NaN", trial.key);
            }
            crate::log_debug!(
                "{} {}: r(reference)={} r(mean)={}",
                trial.key,
                trial.stimulus,
                pearson_vs_reference,
                pearson_vs_mean
            );

            records.push(CorrelationRecord {
                participant: trial.key.participant,
                session: trial.key.session,
                trial_index: trial.key.trial_index,
                affect: trial.affect,
                timestamp: trial
                    .timestamp
                    .map(|ts| ts.with_timezone(&self.config.timezone)),
                stimulus: trial.stimulus,
                pearson_vs_reference,
                pearson_vs_mean,
            });
        }

        self.advance();
        Ok(records)
    }

    /// Hand back everything an external reporter or plotter needs.
    pub fn into_report(self, records: Vec<CorrelationRecord>) -> PipelineReport {
        let references = self
            .references
            .loaded()
            .map(|reference| (reference.stimulus.clone(), Arc::clone(reference)))
            .collect();
        PipelineReport {
            records,
            skipped: self.skipped,
            references,
            aggregator: self.aggregator,
            means: self.means,
        }
    }

    fn skip(&mut self, key: TrialKey, err: &AnalysisError) {
        crate::log_warn!("Skipping {}: {}", key, err);
        self.skipped.push(SkippedTrial {
            key,
            reason: err.to_string(),
        });
    }

    fn expect_stage(&self, expected: PipelineStage) -> Result<()> {
        if self.stage != expected {
            return Err(AnalysisError::StageOrder {
                expected: expected.as_str(),
                actual: self.stage.as_str(),
            });
        }
        Ok(())
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            crate::log_info!("Pipeline {} -> {}", self.stage, next);
            self.stage = next;
        }
    }
}

fn prepare_trial(
    trial: &Trial,
    reference: &PreparedReference,
    neutral_rating: f64,
) -> Result<PreparedTrial> {
    let (live, effective_horizon_secs) =
        normalize_live(&trial.responses, reference.horizon_secs, neutral_rating)?;
    // Always the stimulus horizon, so every series of a stimulus lines up.
    let aligned = resample(&live, reference.horizon_secs);
    Ok(PreparedTrial {
        live,
        effective_horizon_secs,
        aligned,
    })
}

/// Series for one stimulus as plain arrays, indexed by millisecond.
#[derive(Debug, Serialize)]
pub struct StimulusSeries<'a> {
    pub stimulus: &'a StimulusName,
    pub reference: &'a [f64],
    pub mean: &'a [f64],
    pub trials: Vec<(&'a TrialKey, &'a [f64])>,
}

pub struct PipelineReport {
    pub records: Vec<CorrelationRecord>,
    pub skipped: Vec<SkippedTrial>,
    references: BTreeMap<StimulusName, Arc<PreparedReference>>,
    aggregator: Aggregator,
    means: AggregateMeans,
}

impl PipelineReport {
    /// Reference, mean and per-trial series for every stimulus that has a
    /// mean. Stimuli without contributors are left out.
    pub fn stimulus_series(&self) -> Vec<StimulusSeries<'_>> {
        self.means
            .iter()
            .filter_map(|(stimulus, mean)| {
                let reference = self.references.get(stimulus)?;
                Some(StimulusSeries {
                    stimulus,
                    reference: reference.dense.values(),
                    mean: mean.values(),
                    trials: self
                        .aggregator
                        .contributions(stimulus)
                        .iter()
                        .map(|c| (&c.key, c.series.values()))
                        .collect(),
                })
            })
            .collect()
    }

    pub fn mean_for(&self, stimulus: &StimulusName) -> Result<&[f64]> {
        self.means.get(stimulus).map(|mean| mean.values())
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }
}
