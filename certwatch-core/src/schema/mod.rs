//! Schema Module - declared shapes of every published artifact
//!
//! Schemas are JSON documents kept in `schemas/` beside the crate. They are
//! compiled in as defaults and can be replaced from a directory at runtime,
//! so the wire format can move without touching the engine.
//!
//! # Architecture
//! - `SchemaDocument` / `FieldSchema`: document model (a small JSON-Schema
//!   subset plus `columns` for tabular rows and `parallel` for equal-length
//!   sequences)
//! - `validate.rs`: `SchemaValidator`, the publish gate

pub mod validate;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{ANOMALY_SCHEMA_FILE, RUN_SCHEMA_FILE, SNAPSHOT_SCHEMA_FILE};
use crate::error::{PipelineError, Result};

pub use validate::SchemaValidator;

// ============================================================================
// ARTIFACT KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Run log, CSV text including the header
    RunRow,
    /// Single run as a JSON object
    RunDocument,
    /// Anomaly log, one JSON object per line
    AnomalyLine,
    /// Dashboard snapshot JSON document
    Snapshot,
}

impl ArtifactKind {
    pub fn schema_file(&self) -> &'static str {
        match self {
            ArtifactKind::RunRow | ArtifactKind::RunDocument => RUN_SCHEMA_FILE,
            ArtifactKind::AnomalyLine => ANOMALY_SCHEMA_FILE,
            ArtifactKind::Snapshot => SNAPSHOT_SCHEMA_FILE,
        }
    }

    /// Guess the kind from a file name: `*.csv`, `*.jsonl`,
    /// `dashboard*.json` / `data*.json`, `verify_stats*.json`.
    pub fn infer(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".csv") {
            Some(ArtifactKind::RunRow)
        } else if name.ends_with(".jsonl") {
            Some(ArtifactKind::AnomalyLine)
        } else if name.ends_with(".json") {
            if name.starts_with("dashboard") || name.starts_with("data") {
                Some(ArtifactKind::Snapshot)
            } else if name.starts_with("verify_stats") {
                Some(ArtifactKind::RunDocument)
            } else {
                None
            }
        } else {
            None
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::RunRow => "run log (CSV)",
            ArtifactKind::RunDocument => "run document",
            ArtifactKind::AnomalyLine => "anomaly log (JSONL)",
            ArtifactKind::Snapshot => "dashboard snapshot",
        };
        f.write_str(name)
    }
}

// ============================================================================
// SCHEMA DOCUMENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDocument {
    #[serde(rename = "$id")]
    pub id: String,

    pub version: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(flatten)]
    pub root: FieldSchema,

    /// Column order for the tabular form
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel: Option<ParallelRule>,
}

impl SchemaDocument {
    pub fn parse(name: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| PipelineError::Schema {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &text)
    }

    pub fn property(&self, name: &str) -> Option<&FieldSchema> {
        self.root.properties.get(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub kind: FieldType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<FieldFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    #[serde(default, rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl FieldType {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, FieldType::Array | FieldType::Object)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldFormat {
    /// `YYYY-MM-DDTHH:MM:SSZ`
    #[serde(rename = "utc-z")]
    UtcZ,
}

/// Array properties that must all have the same length, optionally equal to
/// an integer property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelRule {
    pub fields: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
}
