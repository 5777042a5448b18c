//! Dense series dumped as CSV for whatever draws the plots.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::models::TrialKey;
use crate::pipeline::StimulusSeries;

const ENABLE_LOGS: bool = true;

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

pub fn trial_file_name(stimulus: &str, key: &TrialKey) -> String {
    let safe = |s: &str| -> String {
        s.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect()
    };
    format!(
        "{}_ppt{}_s{}_t{}.csv",
        stimulus,
        safe(&key.participant),
        safe(&key.session),
        key.trial_index
    )
}

/// Writes `<stimulus>.csv` (`ms,reference,mean`) and one `ms,rating` file per
/// trial. Returns the paths written.
pub fn write_stimulus_series(dir: &Path, series: &[StimulusSeries<'_>]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create series directory {}", dir.display()))?;

    let mut written = Vec::new();
    for stimulus in series {
        let path = dir.join(format!("{}.csv", stimulus.stimulus));
        let mut out = create(&path)?;
        writeln!(out, "ms,reference,mean")?;
        for (ms, (reference, mean)) in stimulus.reference.iter().zip(stimulus.mean).enumerate() {
            writeln!(out, "{ms},{reference},{mean}")?;
        }
        out.flush()?;
        written.push(path);

        for (key, values) in &stimulus.trials {
            let path = dir.join(trial_file_name(stimulus.stimulus.as_str(), key));
            let mut out = create(&path)?;
            writeln!(out, "ms,rating")?;
            for (ms, value) in values.iter().enumerate() {
                writeln!(out, "{ms},{value}")?;
            }
            out.flush()?;
            written.push(path);
        }
    }

    crate::log_info!("Wrote {} series files to {}", written.len(), dir.display());
    Ok(written)
}
