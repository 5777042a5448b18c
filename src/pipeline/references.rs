//! Actor self-ratings, loaded at most once per stimulus.

use anyhow::{anyhow, bail, Context};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{AnalysisError, Result};
use crate::models::{DenseSeries, RawRatingSeries, ReferenceRow, StimulusName};
use crate::normalize::{normalize_reference, LikertScale};
use crate::series::resample;

const ENABLE_LOGS: bool = true;

/// Where reference ratings come from.
pub trait ReferenceSource {
    fn load(&self, stimulus: &StimulusName) -> anyhow::Result<Vec<ReferenceRow>>;
}

/// Headerless `rating,time` CSV files named `<stimulus>.csv`.
#[derive(Debug, Clone)]
pub struct CsvReferenceDir {
    dir: PathBuf,
}

impl CsvReferenceDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, stimulus: &StimulusName) -> PathBuf {
        self.dir.join(format!("{stimulus}.csv"))
    }
}

impl ReferenceSource for CsvReferenceDir {
    fn load(&self, stimulus: &StimulusName) -> anyhow::Result<Vec<ReferenceRow>> {
        let path = self.path_for(stimulus);
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read reference ratings {}", path.display()))?;
        parse_reference_csv(&contents).with_context(|| format!("in {}", path.display()))
    }
}

pub fn parse_reference_csv(contents: &str) -> anyhow::Result<Vec<ReferenceRow>> {
    let mut rows = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(',').map(str::trim);
        let (Some(rating), Some(time), None) = (fields.next(), fields.next(), fields.next()) else {
            return Err(anyhow!("line {}: expected `rating,time`, got {line:?}", line_no + 1));
        };
        let number = |field: &str, what: &str| -> anyhow::Result<f64> {
            field
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| anyhow!("line {}: bad {what} {field:?}", line_no + 1))
        };
        let row = ReferenceRow {
            rating: number(rating, "rating")?,
            time: number(time, "time")?,
        };
        if row.time < 0.0 {
            bail!("line {}: negative time {time:?}", line_no + 1);
        }
        rows.push(row);
    }
    Ok(rows)
}

impl<S: ReferenceSource + ?Sized> ReferenceSource for &S {
    fn load(&self, stimulus: &StimulusName) -> anyhow::Result<Vec<ReferenceRow>> {
        (**self).load(stimulus)
    }
}

impl ReferenceSource for HashMap<StimulusName, Vec<ReferenceRow>> {
    fn load(&self, stimulus: &StimulusName) -> anyhow::Result<Vec<ReferenceRow>> {
        self.get(stimulus)
            .cloned()
            .ok_or_else(|| anyhow!("no reference ratings for {stimulus}"))
    }
}

/// A reference ready for comparison: normalized, and resampled at its own
/// horizon, which is the horizon every trial of this stimulus is aligned to.
#[derive(Debug)]
pub struct PreparedReference {
    pub stimulus: StimulusName,
    pub raw: RawRatingSeries,
    pub dense: DenseSeries,
    pub horizon_secs: f64,
}

pub struct ReferenceCache<S> {
    source: S,
    scale: LikertScale,
    entries: HashMap<StimulusName, std::result::Result<Arc<PreparedReference>, String>>,
}

impl<S: ReferenceSource> ReferenceCache<S> {
    pub fn new(source: S, scale: LikertScale) -> Self {
        Self {
            source,
            scale,
            entries: HashMap::new(),
        }
    }

    /// Fetch a prepared reference, loading it on first use. Failures are
    /// cached too, so a broken file is reported once and then every trial
    /// that needs it is refused.
    pub fn get(&mut self, stimulus: &StimulusName) -> Result<Arc<PreparedReference>> {
        if !self.entries.contains_key(stimulus) {
            let entry = self.prepare(stimulus).map(Arc::new).map_err(|err| {
                let reason = format!("{err:#}");
                crate::log_error!("Reference for {} unavailable: {}", stimulus, reason);
                reason
            });
            self.entries.insert(stimulus.clone(), entry);
        }

        match &self.entries[stimulus] {
            Ok(prepared) => Ok(Arc::clone(prepared)),
            Err(reason) => Err(AnalysisError::ReferenceUnavailable {
                stimulus: stimulus.to_string(),
                reason: reason.clone(),
            }),
        }
    }

    /// Every reference that loaded successfully.
    pub fn loaded(&self) -> impl Iterator<Item = &Arc<PreparedReference>> {
        self.entries.values().filter_map(|entry| entry.as_ref().ok())
    }

    fn prepare(&self, stimulus: &StimulusName) -> anyhow::Result<PreparedReference> {
        let rows = self.source.load(stimulus)?;
        let (raw, name) = normalize_reference(&rows, stimulus.as_str(), self.scale)?;
        let horizon_secs = raw.last_time().ok_or(AnalysisError::EmptySeries)?;
        let dense = resample(&raw, horizon_secs);
        crate::log_info!(
            "Loaded reference {} ({} rows, {:.3}s)",
            name,
            raw.len(),
            horizon_secs
        );
        Ok(PreparedReference {
            stimulus: name,
            raw,
            dense,
            horizon_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingSource {
        rows: Vec<ReferenceRow>,
        calls: Cell<usize>,
    }

    impl ReferenceSource for CountingSource {
        fn load(&self, _stimulus: &StimulusName) -> anyhow::Result<Vec<ReferenceRow>> {
            self.calls.set(self.calls.get() + 1);
            if self.rows.is_empty() {
                anyhow::bail!("file is missing");
            }
            Ok(self.rows.clone())
        }
    }

    fn stimulus() -> StimulusName {
        StimulusName::from_filename("EA03-N1").unwrap()
    }

    #[test]
    fn parses_headerless_csv() {
        let rows = parse_reference_csv("5,0\n\n7, 1.5\n9,3.25\n").unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], ReferenceRow { rating: 7.0, time: 1.5 });
    }

    #[test]
    fn rejects_malformed_csv() {
        assert!(parse_reference_csv("5,0\nfive,1\n").is_err());
        assert!(parse_reference_csv("5,0,1\n").is_err());
        assert!(parse_reference_csv("5\n").is_err());
        assert!(parse_reference_csv("1,0\n9,inf\n").is_err());
        assert!(parse_reference_csv("NaN,1\n").is_err());
        assert!(parse_reference_csv("5,-0.5\n").is_err());
    }

    #[test]
    fn loads_once_and_prepares_dense_series() {
        let source = CountingSource {
            rows: vec![
                ReferenceRow { rating: 1.0, time: 0.0 },
                ReferenceRow { rating: 9.0, time: 2.0 },
            ],
            calls: Cell::new(0),
        };
        let mut cache = ReferenceCache::new(&source, LikertScale::default());

        let first = cache.get(&stimulus()).unwrap();
        let second = cache.get(&stimulus()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(source.calls.get(), 1);

        assert_eq!(first.horizon_secs, 2.0);
        assert_eq!(first.dense.len(), 2001);
        assert_eq!(first.dense.get(1999), Some(0.0));
        assert_eq!(first.dense.get(2000), Some(1.0));
    }

    #[test]
    fn failure_is_cached() {
        let source = CountingSource {
            rows: Vec::new(),
            calls: Cell::new(0),
        };
        let mut cache = ReferenceCache::new(&source, LikertScale::default());

        for _ in 0..3 {
            let err = cache.get(&stimulus()).unwrap_err();
            assert!(matches!(err, AnalysisError::ReferenceUnavailable { .. }));
        }
        assert_eq!(source.calls.get(), 1);
        assert_eq!(cache.loaded().count(), 0);
    }

    #[test]
    fn reads_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("EA03-N1.csv"), "1,0\n9,2\n").unwrap();
        let source = CsvReferenceDir::new(dir.path());
        let rows = source.load(&stimulus()).unwrap();
        assert_eq!(rows.len(), 2);

        let missing = StimulusName::from_filename("EA04-P2").unwrap();
        assert!(source.load(&missing).is_err());
    }
}
