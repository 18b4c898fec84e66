//! Wire codecs for the run log (CSV), the run document, the anomaly log
//! (JSONL) and the snapshot document.

use serde::Deserialize;
use serde_json::Number;

use crate::clock::{Timestamp, TimestampParseError};
use crate::constants::CSV_COLUMNS;
use crate::error::{MalformedRecordError, PipelineError, RecordProblem, Result, ValidationError};
use crate::model::{AnomalyRecord, DashboardSnapshot, VerificationRun};
use crate::schema::ArtifactKind;

// ============================================================================
// RUN LOG (CSV)
// ============================================================================

pub fn render_csv_header() -> String {
    CSV_COLUMNS.join(",")
}

/// One data row, without the line terminator
pub fn render_csv_row(run: &VerificationRun) -> String {
    format!(
        "{},{},{},{},{}",
        run.timestamp, run.certs, run.ok, run.fails, run.elapsed
    )
}

/// Header plus one row per run, `\n`-terminated
pub fn render_csv(runs: &[VerificationRun]) -> String {
    let mut out = render_csv_header();
    out.push('\n');
    for run in runs {
        out.push_str(&render_csv_row(run));
        out.push('\n');
    }
    out
}

/// Parse a run log. Shape problems are `ValidationError`s, counter problems
/// are `MalformedRecordError`s naming the first offending line.
pub fn parse_csv(text: &str) -> Result<Vec<VerificationRun>> {
    parse_csv_rows(text)?
        .into_iter()
        .map(|row| row.map_err(PipelineError::from))
        .collect()
}

/// Parse a run log keeping one entry per data row, so callers can skip
/// rows whose counters are broken. Shape problems still fail the whole log.
pub fn parse_csv_rows(text: &str) -> Result<Vec<std::result::Result<VerificationRun, MalformedRecordError>>> {
    let mut lines = text.lines();
    let expected = render_csv_header();
    let header = lines.next().unwrap_or_default();
    if header != expected {
        return Err(ValidationError::single(
            ArtifactKind::RunRow,
            "header",
            format!("expected `{}`, got `{}`", expected, header),
        )
        .into());
    }

    let mut rows = Vec::new();
    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        if line.trim().is_empty() {
            continue;
        }
        match parse_row(line, line_no) {
            Ok(run) => rows.push(Ok(run)),
            Err(PipelineError::Malformed(e)) => rows.push(Err(e)),
            Err(e) => return Err(e),
        }
    }

    Ok(rows)
}

fn parse_row(line: &str, line_no: usize) -> Result<VerificationRun> {
    let cells: Vec<&str> = line.split(',').collect();
    let [timestamp, certs, ok, fails, elapsed] = &cells[..] else {
        return Err(ValidationError::single(
            ArtifactKind::RunRow,
            format!("line {}", line_no),
            format!("expected {} columns, got {}", CSV_COLUMNS.len(), cells.len()),
        )
        .into());
    };

    let timestamp: Timestamp = timestamp.parse().map_err(|e: TimestampParseError| {
        ValidationError::single(
            ArtifactKind::RunRow,
            format!("line {}.timestamp", line_no),
            e.to_string(),
        )
    })?;
    let run = VerificationRun::new(
        timestamp,
        parse_count(certs, "certs", line_no)?,
        parse_count(ok, "ok", line_no)?,
        parse_count(fails, "fails", line_no)?,
        parse_count(elapsed, "elapsed", line_no)?,
    );
    run.check()
        .map_err(|problem| MalformedRecordError::new(format!("line {}", line_no), problem))?;
    Ok(run)
}

/// Digits only, matching what the run schema accepts for integer cells.
/// A `-` followed by digits is a negative counter, not a shape problem.
fn parse_count(cell: &str, field: &'static str, line_no: usize) -> Result<u64> {
    let invalid = |message: String| {
        PipelineError::from(ValidationError::single(
            ArtifactKind::RunRow,
            format!("line {}.{}", line_no, field),
            message,
        ))
    };

    if let Some(magnitude) = cell.strip_prefix('-') {
        if is_digits(magnitude) {
            let value = cell.parse::<i64>().unwrap_or(i64::MIN);
            return Err(MalformedRecordError::new(
                format!("line {}", line_no),
                RecordProblem::Negative { field, value },
            )
            .into());
        }
    }
    if !is_digits(cell) {
        return Err(invalid(format!("expected digits, got `{}`", cell)));
    }
    cell.parse::<u64>()
        .map_err(|_| invalid(format!("`{}` is larger than {}", cell, u64::MAX)))
}

fn is_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// RUN DOCUMENT (JSON)
// ============================================================================

pub fn render_run_document(run: &VerificationRun) -> Result<String> {
    Ok(serde_json::to_string_pretty(run)?)
}

/// Inbound run: counters are kept as raw JSON numbers so a negative value
/// can be named instead of surfacing as a generic parse failure.
#[derive(Debug, Deserialize)]
struct RunDocument {
    timestamp: Timestamp,
    certs: Number,
    ok: Number,
    fails: Number,
    elapsed: Number,
}

pub fn parse_run_document(text: &str) -> Result<VerificationRun> {
    let doc: RunDocument = serde_json::from_str(text)?;
    let count = |value: &Number, field: &'static str| document_count(value, field, doc.timestamp);
    let run = VerificationRun::new(
        doc.timestamp,
        count(&doc.certs, "certs")?,
        count(&doc.ok, "ok")?,
        count(&doc.fails, "fails")?,
        count(&doc.elapsed, "elapsed")?,
    );
    run.check()
        .map_err(|problem| MalformedRecordError::new(run.timestamp.to_string(), problem))?;
    Ok(run)
}

fn document_count(value: &Number, field: &'static str, timestamp: Timestamp) -> Result<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    match value.as_i64() {
        Some(n) => Err(MalformedRecordError::new(
            timestamp.to_string(),
            RecordProblem::Negative { field, value: n },
        )
        .into()),
        None => Err(ValidationError::single(
            ArtifactKind::RunDocument,
            field,
            format!("expected a non-negative integer, got {}", value),
        )
        .into()),
    }
}

// ============================================================================
// ANOMALY LOG (JSONL)
// ============================================================================

/// Compact single-line JSON, no terminator
pub fn render_jsonl_line(anomaly: &AnomalyRecord) -> Result<String> {
    Ok(serde_json::to_string(anomaly)?)
}

pub fn render_jsonl(anomalies: &[AnomalyRecord]) -> Result<String> {
    let mut out = String::new();
    for anomaly in anomalies {
        out.push_str(&render_jsonl_line(anomaly)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn parse_jsonl(text: &str) -> Result<Vec<AnomalyRecord>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(PipelineError::from))
        .collect()
}

// ============================================================================
// SNAPSHOT (JSON)
// ============================================================================

pub fn render_snapshot(snapshot: &DashboardSnapshot) -> Result<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn parse_snapshot(text: &str) -> Result<DashboardSnapshot> {
    Ok(serde_json::from_str(text)?)
}
