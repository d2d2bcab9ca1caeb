//! Transaction file loader and report writer

use crate::metrics::GroundTruth;
use crate::types::transaction::RawRecord;
use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{info, warn};

/// Supported input formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    /// A single JSON array of records
    Json,
    /// One JSON object per line
    JsonLines,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("csv") => Ok(InputFormat::Csv),
            Some("json") => Ok(InputFormat::Json),
            Some("jsonl") | Some("ndjson") => Ok(InputFormat::JsonLines),
            _ => bail!("Unsupported file format: {}", path.display()),
        }
    }
}

/// Load raw transaction records from a CSV, JSON or JSON-lines file
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let format = InputFormat::from_path(path)?;
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let records = match format {
        InputFormat::Csv => read_csv(file),
        InputFormat::Json => read_json(file),
        InputFormat::JsonLines => read_json_lines(file),
    }
    .with_context(|| format!("Failed to read records from {}", path.display()))?;

    info!(
        path = %path.display(),
        format = ?format,
        records = records.len(),
        "Loaded transaction records"
    );

    Ok(records)
}

/// Short rows are kept; their missing columns surface as schema errors in validation
fn read_csv(file: File) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let record: RawRecord = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.trim().to_string(), Value::String(value.to_string())))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn read_json(file: File) -> Result<Vec<RawRecord>> {
    let values: Vec<Value> = serde_json::from_reader(BufReader::new(file))?;
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| into_record(value).with_context(|| format!("Element {} is not an object", i)))
        .collect()
}

fn read_json_lines(file: File) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(&line).with_context(|| format!("Invalid JSON on line {}", i + 1))?;
        records.push(into_record(value).with_context(|| format!("Line {} is not an object", i + 1))?);
    }
    Ok(records)
}

fn into_record(value: Value) -> Result<RawRecord> {
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, found {}", other),
    }
}

/// Load ground-truth labels (`transaction_id`, `abuse`) from any supported file.
///
/// Rows without a usable 0/1 label are skipped.
pub fn load_ground_truth<P: AsRef<Path>>(path: P) -> Result<Vec<GroundTruth>> {
    let records = load_records(path)?;
    let mut labels = Vec::with_capacity(records.len());

    for record in &records {
        let id = record.get("transaction_id").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let abuse = record.get("abuse").and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            Value::Bool(b) => Some(u64::from(*b)),
            _ => None,
        });

        match (id, abuse) {
            (Some(id), Some(abuse @ (0 | 1))) => labels.push(GroundTruth::new(id, abuse as u8)),
            _ => {
                let row = Value::Object(record.clone());
                warn!(record = %row, "Skipping ground-truth row without a usable label");
            }
        }
    }

    Ok(labels)
}

/// Write any serializable report as pretty-printed JSON
pub fn write_report<P: AsRef<Path>, T: Serialize>(path: P, report: &T) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    writer.flush()?;

    info!(path = %path.display(), "Report written");
    Ok(())
}
