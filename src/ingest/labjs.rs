//! Reads trials out of an exported lab.js event log.
//!
//! Each export row is one upload from the task: a session id, the upload
//! metadata, and the lab.js data array. Only `Video` entries become trials.
//! Both `metadata` and `data` may arrive JSON-encoded as strings, which is
//! how the event log stores them.

use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::models::{LiveSample, Trial, TrialKey};

const ENABLE_LOGS: bool = true;

const SENDER_VIDEO: &str = "Video";
const SENDER_INSTRUCTIONS: &str = "Instructions Start";

#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(deserialize_with = "id_string")]
    session: String,
    #[serde(default)]
    metadata: Option<Value>,
    data: Value,
}

#[derive(Debug, Deserialize)]
struct VideoEntry {
    #[serde(deserialize_with = "id_string")]
    ppt: String,
    #[serde(default)]
    trial_count: u32,
    affect: String,
    response: Vec<LiveSample>,
    #[serde(default)]
    video_filename: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
}

/// Participant and session ids show up as either strings or numbers.
fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// Unwrap a value that may have been stored as a JSON string.
fn decode_nested(value: Value) -> Result<Value> {
    match value {
        Value::String(encoded) => {
            serde_json::from_str(&encoded).context("failed to decode embedded JSON")
        }
        other => Ok(other),
    }
}

fn is_full_payload(metadata: Option<Value>) -> Result<bool> {
    let Some(metadata) = metadata else {
        return Ok(true);
    };
    let metadata = decode_nested(metadata)?;
    Ok(match metadata.get("payload") {
        Some(Value::String(payload)) => payload == "full",
        Some(_) => false,
        None => true,
    })
}

pub fn load_export(path: &Path, require_full_payload: bool) -> Result<Vec<Trial>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read lab.js export {}", path.display()))?;
    parse_export(&contents, require_full_payload)
        .with_context(|| format!("failed to parse lab.js export {}", path.display()))
}

/// Parse an export into trials, in upload order.
pub fn parse_export(json: &str, require_full_payload: bool) -> Result<Vec<Trial>> {
    let rows: Vec<ExportRow> = serde_json::from_str(json).context("export is not a row array")?;

    let mut trials = Vec::new();
    for (row_index, row) in rows.into_iter().enumerate() {
        if require_full_payload && !is_full_payload(row.metadata)? {
            crate::log_debug!("Row {} for session {} is a partial upload", row_index, row.session);
            continue;
        }

        let entries = match decode_nested(row.data)? {
            Value::Array(entries) => entries,
            other => return Err(anyhow!("row {row_index}: data is not an array: {other}")),
        };

        for (entry_index, entry) in entries.into_iter().enumerate() {
            let sender = entry.get("sender").and_then(Value::as_str).map(str::to_owned);
            match sender.as_deref() {
                Some(SENDER_INSTRUCTIONS) => {
                    if let Some(ppt) = entry.get("ppt") {
                        crate::log_info!(
                            "PPT {}: reading row {} for session {}",
                            ppt,
                            row_index,
                            row.session
                        );
                    }
                }
                Some(SENDER_VIDEO) => {
                    let video: VideoEntry = serde_json::from_value(entry).with_context(|| {
                        format!("row {row_index}, entry {entry_index}: malformed Video entry")
                    })?;
                    trials.push(video_to_trial(video, &row.session).with_context(|| {
                        format!("row {row_index}, entry {entry_index}")
                    })?);
                }
                _ => {}
            }
        }
    }

    Ok(trials)
}

fn video_to_trial(video: VideoEntry, session: &str) -> Result<Trial> {
    let timestamp = video
        .timestamp
        .as_deref()
        .map(|raw| DateTime::parse_from_rfc3339(raw))
        .transpose()
        .context("invalid timestamp")?;

    crate::log_debug!(
        "Got video {} with {} mouse movements for {}",
        video.trial_count,
        video.response.len(),
        video.ppt
    );

    Ok(Trial {
        key: TrialKey {
            participant: video.ppt,
            session: session.to_string(),
            trial_index: video.trial_count,
        },
        affect: video.affect,
        timestamp,
        video_filename: video.video_filename,
        responses: video.response,
    })
}
