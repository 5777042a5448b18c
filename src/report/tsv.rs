//! Tab-separated correlation table, one row per trial.

use anyhow::{anyhow, bail, Context, Result};
use chrono::DateTime;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::{CorrelationRecord, StimulusName};

const ENABLE_LOGS: bool = true;

pub const HEADER: [&str; 8] = [
    "ppt",
    "session",
    "trial",
    "affect",
    "timestamp",
    "stimulus",
    "pearson_reference",
    "pearson_mean",
];

/// Keep free text from breaking the column layout.
fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

pub fn write_records<W: Write>(mut out: W, records: &[CorrelationRecord]) -> Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))?;
    for record in records {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            clean(&record.participant),
            clean(&record.session),
            record.trial_index,
            clean(&record.affect),
            record
                .timestamp
                .map(|ts| ts.to_rfc3339())
                .unwrap_or_default(),
            record.stimulus,
            record.pearson_vs_reference,
            record.pearson_vs_mean,
        )?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_records(path: &Path, records: &[CorrelationRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    write_records(BufWriter::new(file), records)
        .with_context(|| format!("failed to write {}", path.display()))?;
    crate::log_info!("Wrote {} correlation rows to {}", records.len(), path.display());
    Ok(())
}

pub fn parse_records(contents: &str) -> Result<Vec<CorrelationRecord>> {
    let mut lines = contents.lines().enumerate();
    match lines.next() {
        Some((_, header)) if header.split('\t').eq(HEADER.iter().copied()) => {}
        Some((_, header)) => bail!("unexpected header {header:?}"),
        None => bail!("file is empty"),
    }

    let mut records = Vec::new();
    for (line_no, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_line(line).with_context(|| format!("line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

fn parse_line(line: &str) -> Result<CorrelationRecord> {
    let fields: Vec<&str> = line.split('\t').collect();
    let &[participant, session, trial, affect, timestamp, stimulus, reference, mean] =
        fields.as_slice()
    else {
        return Err(anyhow!("expected {} fields, got {}", HEADER.len(), fields.len()));
    };

    let timestamp = if timestamp.is_empty() {
        None
    } else {
        Some(DateTime::parse_from_rfc3339(timestamp).context("bad timestamp")?)
    };

    Ok(CorrelationRecord {
        participant: participant.to_string(),
        session: session.to_string(),
        trial_index: trial.parse().context("bad trial index")?,
        affect: affect.to_string(),
        timestamp,
        stimulus: StimulusName::from_filename(stimulus)?,
        pearson_vs_reference: reference.parse().context("bad pearson_reference")?,
        pearson_vs_mean: mean.parse().context("bad pearson_mean")?,
    })
}

pub fn load_records(path: &Path) -> Result<Vec<CorrelationRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_records(&contents).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(ppt: &str, reference: f64, mean: f64) -> CorrelationRecord {
        CorrelationRecord {
            participant: ppt.into(),
            session: "1".into(),
            trial_index: 3,
            affect: "sad\tish".into(),
            timestamp: Some(DateTime::parse_from_rfc3339("2021-03-04T10:22:01-05:00").unwrap()),
            stimulus: StimulusName::from_filename("EA03-N1").unwrap(),
            pearson_vs_reference: reference,
            pearson_vs_mean: mean,
        }
    }

    #[test]
    fn writes_header_and_nan() {
        let mut out = Vec::new();
        write_records(&mut out, &[record("7", f64::NAN, 0.25)]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), HEADER.join("\t"));
        assert_eq!(
            lines.next().unwrap(),
            "7\t1\t3\tsad ish\t2021-03-04T10:22:01-05:00\tEA03-N1\tNaN\t0.25"
        );
    }

    #[test]
    fn reads_back_what_it_writes() {
        let mut without_ts = record("8", 0.5, -0.125);
        without_ts.timestamp = None;
        let mut out = Vec::new();
        write_records(&mut out, &[record("7", f64::NAN, 0.25), without_ts]).unwrap();

        let parsed = parse_records(&String::from_utf8(out).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert!(parsed[0].pearson_vs_reference.is_nan());
        assert_eq!(parsed[0].affect, "sad ish");
        assert!(parsed[0].timestamp.is_some());
        assert_eq!(parsed[1].timestamp, None);
        assert_eq!(parsed[1].pearson_vs_mean, -0.125);
    }

    #[test]
    fn rejects_foreign_tables() {
        assert!(parse_records("a\tb\n1\t2\n").is_err());
        assert!(parse_records("").is_err());
        let short = format!("{}\n7\t1\t3\n", HEADER.join("\t"));
        assert!(parse_records(&short).is_err());
    }
}
