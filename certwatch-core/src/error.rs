//! Error taxonomy
//!
//! - `MalformedRecordError`: a run breaks its own invariant
//! - `ValidationError`: a rendered artifact does not match its schema
//! - `ConfigurationError`: a setting is unusable, fatal at startup

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::schema::ArtifactKind;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("schema document `{name}` is unusable: {reason}")]
    Schema { name: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ============================================================================
// MALFORMED RECORDS
// ============================================================================

/// A run whose counters contradict each other.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed run {run}: {problem}")]
pub struct MalformedRecordError {
    /// Position and timestamp of the offending run, e.g. `#2 (2025-01-01T00:00:00Z)`
    pub run: String,
    pub problem: RecordProblem,
}

impl MalformedRecordError {
    pub fn new(run: impl Into<String>, problem: RecordProblem) -> Self {
        Self { run: run.into(), problem }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordProblem {
    #[error("ok ({ok}) + fails ({fails}) != certs ({certs})")]
    CountMismatch { certs: u64, ok: u64, fails: u64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: i64 },
}

// ============================================================================
// SCHEMA VALIDATION
// ============================================================================

/// One schema violation; `field` is a path such as `anomalies[0].factor`
/// or `line 3.elapsed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found in one artifact, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} failed schema validation ({} violation(s)): {}", .violations.len(), join_violations(.violations))]
pub struct ValidationError {
    pub kind: ArtifactKind,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    pub fn single(kind: ArtifactKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { kind, violations: vec![Violation::new(field, message)] }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ")
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{setting} must be positive, got {value}")]
    NotPositive { setting: &'static str, value: String },

    #[error("{setting} could not be parsed from `{value}`")]
    Unparsable { setting: &'static str, value: String },
}
