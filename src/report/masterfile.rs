//! Per-participant summary for the lab's master spreadsheet: each session's
//! trials averaged, sessions spread across columns.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::models::CorrelationRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionMeans {
    pub pearson_vs_reference: f64,
    pub pearson_vs_mean: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterRow {
    pub participant: String,
    pub sessions: BTreeMap<String, SessionMeans>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterTable {
    pub sessions: Vec<String>,
    pub rows: Vec<MasterRow>,
}

/// Mean of the non-NaN values; NaN if there are none.
fn mean_skip_nan(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

pub fn rotate(records: &[CorrelationRecord]) -> MasterTable {
    let mut grouped: BTreeMap<(&str, &str), Vec<&CorrelationRecord>> = BTreeMap::new();
    for record in records {
        grouped
            .entry((record.participant.as_str(), record.session.as_str()))
            .or_default()
            .push(record);
    }

    let mut sessions = BTreeSet::new();
    let mut rows: BTreeMap<&str, MasterRow> = BTreeMap::new();
    for ((participant, session), trials) in grouped {
        sessions.insert(session.to_string());
        let means = SessionMeans {
            pearson_vs_reference: mean_skip_nan(trials.iter().map(|r| r.pearson_vs_reference)),
            pearson_vs_mean: mean_skip_nan(trials.iter().map(|r| r.pearson_vs_mean)),
        };
        rows.entry(participant)
            .or_insert_with(|| MasterRow {
                participant: participant.to_string(),
                sessions: BTreeMap::new(),
            })
            .sessions
            .insert(session.to_string(), means);
    }

    MasterTable {
        sessions: sessions.into_iter().collect(),
        rows: rows.into_values().collect(),
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_table<W: Write>(mut out: W, table: &MasterTable) -> Result<()> {
    let mut header = vec!["ppt".to_string()];
    header.extend(table.sessions.iter().map(|s| format!("pearson_reference_{s}")));
    header.extend(table.sessions.iter().map(|s| format!("pearson_mean_{s}")));
    writeln!(out, "{}", header.join("\t"))?;

    for row in &table.rows {
        let mut fields = vec![row.participant.clone()];
        fields.extend(
            table
                .sessions
                .iter()
                .map(|s| cell(row.sessions.get(s).map(|m| m.pearson_vs_reference))),
        );
        fields.extend(
            table
                .sessions
                .iter()
                .map(|s| cell(row.sessions.get(s).map(|m| m.pearson_vs_mean))),
        );
        writeln!(out, "{}", fields.join("\t"))?;
    }
    out.flush()?;
    Ok(())
}

pub fn save_table(path: &Path, table: &MasterTable) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_table(BufWriter::new(file), table)
        .with_context(|| format!("failed to write {}", path.display()))
}
