//! Collects every trial's dense series per stimulus and averages them.
//!
//! Means are only defined once collection is finished, because each trial is
//! later compared against a mean that includes its own contribution.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::error::{AnalysisError, Result};
use crate::models::{DenseSeries, StimulusName, TrialKey};

const ENABLE_LOGS: bool = true;

/// One trial's series filed under its stimulus.
#[derive(Debug, Clone)]
pub struct Contribution {
    pub key: TrialKey,
    pub series: DenseSeries,
}

/// Running elementwise sum plus count. Partial accumulators merge in any
/// order, which is what lets the mean be computed in parallel.
#[derive(Debug, Clone)]
pub struct MeanAccumulator {
    sums: Vec<f64>,
    count: usize,
}

impl MeanAccumulator {
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0.0; len],
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn add(mut self, series: &DenseSeries) -> Result<Self> {
        if series.len() != self.sums.len() {
            return Err(AnalysisError::LengthMismatch {
                left: self.sums.len(),
                right: series.len(),
            });
        }
        for (sum, value) in self.sums.iter_mut().zip(series.values()) {
            *sum += value;
        }
        self.count += 1;
        Ok(self)
    }

    pub fn merge(mut self, other: MeanAccumulator) -> Result<Self> {
        if other.sums.len() != self.sums.len() {
            return Err(AnalysisError::LengthMismatch {
                left: self.sums.len(),
                right: other.sums.len(),
            });
        }
        for (sum, value) in self.sums.iter_mut().zip(other.sums) {
            *sum += value;
        }
        self.count += other.count;
        Ok(self)
    }

    /// `None` until at least one series has been added.
    pub fn mean(&self) -> Option<DenseSeries> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        Some(DenseSeries::from_values(
            self.sums.iter().map(|sum| sum / n).collect(),
        ))
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    by_stimulus: BTreeMap<StimulusName, Vec<Contribution>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a trial's series under its stimulus and return its position
    /// there. Every series for one stimulus must have been resampled at that
    /// stimulus's horizon.
    pub fn file(
        &mut self,
        stimulus: StimulusName,
        key: TrialKey,
        series: DenseSeries,
    ) -> Result<usize> {
        let entries = self.by_stimulus.entry(stimulus).or_default();
        if let Some(first) = entries.first() {
            if first.series.len() != series.len() {
                return Err(AnalysisError::LengthMismatch {
                    left: first.series.len(),
                    right: series.len(),
                });
            }
        }
        entries.push(Contribution { key, series });
        Ok(entries.len() - 1)
    }

    pub fn stimuli(&self) -> impl Iterator<Item = &StimulusName> {
        self.by_stimulus.keys()
    }

    pub fn contributions(&self, stimulus: &StimulusName) -> &[Contribution] {
        self.by_stimulus
            .get(stimulus)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Series grouped by (participant, session), in trial order.
    pub fn by_participant(&self) -> BTreeMap<(String, String), Vec<(&StimulusName, &Contribution)>> {
        let mut grouped: BTreeMap<(String, String), Vec<(&StimulusName, &Contribution)>> =
            BTreeMap::new();
        for (stimulus, contributions) in &self.by_stimulus {
            for contribution in contributions {
                grouped
                    .entry((
                        contribution.key.participant.clone(),
                        contribution.key.session.clone(),
                    ))
                    .or_default()
                    .push((stimulus, contribution));
            }
        }
        for trials in grouped.values_mut() {
            trials.sort_by_key(|(_, c)| c.key.trial_index);
        }
        grouped
    }

    pub fn trial_count(&self) -> usize {
        self.by_stimulus.values().map(Vec::len).sum()
    }

    /// Elementwise mean per stimulus across every filed trial.
    pub fn compute_means(&self) -> Result<AggregateMeans> {
        let means = self
            .by_stimulus
            .par_iter()
            .filter(|(_, contributions)| !contributions.is_empty())
            .map(|(stimulus, contributions)| {
                let len = contributions[0].series.len();
                let acc = contributions
                    .par_iter()
                    .try_fold(
                        || MeanAccumulator::new(len),
                        |acc, contribution| acc.add(&contribution.series),
                    )
                    .try_reduce(|| MeanAccumulator::new(len), MeanAccumulator::merge)?;
                crate::log_debug!(
                    "Mean for {} built from {} trials",
                    stimulus,
                    acc.count()
                );
                let mean = acc.mean().ok_or_else(|| AnalysisError::NoContributors {
                    stimulus: stimulus.to_string(),
                })?;
                Ok((stimulus.clone(), mean))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        Ok(AggregateMeans { means })
    }
}

/// Per-stimulus mean series, owned by the pipeline after aggregation.
#[derive(Debug, Default)]
pub struct AggregateMeans {
    means: BTreeMap<StimulusName, DenseSeries>,
}

impl AggregateMeans {
    pub fn get(&self, stimulus: &StimulusName) -> Result<&DenseSeries> {
        self.means
            .get(stimulus)
            .ok_or_else(|| AnalysisError::NoContributors {
                stimulus: stimulus.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StimulusName, &DenseSeries)> {
        self.means.iter()
    }
}
