//! Schema Validator
//!
//! Checks a rendered artifact against its schema document and reports every
//! violation it finds. Nothing is published without passing through here.

use std::path::Path;

use serde_json::Value;

use super::{ArtifactKind, FieldFormat, FieldSchema, FieldType, ParallelRule, SchemaDocument};
use crate::clock::is_utc_z;
use crate::constants::{ANOMALY_SCHEMA_FILE, RUN_SCHEMA_FILE, SNAPSHOT_SCHEMA_FILE};
use crate::error::{PipelineError, Result, ValidationError, Violation};

const BUNDLED_RUN_SCHEMA: &str = include_str!("../../schemas/verify_stats.schema.json");
const BUNDLED_ANOMALY_SCHEMA: &str = include_str!("../../schemas/anomaly.schema.json");
const BUNDLED_SNAPSHOT_SCHEMA: &str = include_str!("../../schemas/dashboard.schema.json");

#[derive(Debug, Clone)]
pub struct SchemaValidator {
    run: SchemaDocument,
    anomaly: SchemaDocument,
    snapshot: SchemaDocument,
}

impl SchemaValidator {
    /// Validator over the schemas shipped with the crate
    pub fn bundled() -> Result<Self> {
        Self::from_documents(
            SchemaDocument::parse(RUN_SCHEMA_FILE, BUNDLED_RUN_SCHEMA)?,
            SchemaDocument::parse(ANOMALY_SCHEMA_FILE, BUNDLED_ANOMALY_SCHEMA)?,
            SchemaDocument::parse(SNAPSHOT_SCHEMA_FILE, BUNDLED_SNAPSHOT_SCHEMA)?,
        )
    }

    /// Load schemas from `dir`; files that are absent fall back to the
    /// bundled copy.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let load = |file: &str, bundled: &str| -> Result<SchemaDocument> {
            let path = dir.join(file);
            if path.exists() {
                log::info!("Loading schema {:?}", path);
                SchemaDocument::load(&path)
            } else {
                log::warn!("Schema {:?} not found, using bundled copy", path);
                SchemaDocument::parse(file, bundled)
            }
        };

        Self::from_documents(
            load(RUN_SCHEMA_FILE, BUNDLED_RUN_SCHEMA)?,
            load(ANOMALY_SCHEMA_FILE, BUNDLED_ANOMALY_SCHEMA)?,
            load(SNAPSHOT_SCHEMA_FILE, BUNDLED_SNAPSHOT_SCHEMA)?,
        )
    }

    pub fn from_documents(
        run: SchemaDocument,
        anomaly: SchemaDocument,
        snapshot: SchemaDocument,
    ) -> Result<Self> {
        check_document_shape(&run, true)?;
        check_document_shape(&anomaly, false)?;
        check_document_shape(&snapshot, false)?;
        Ok(Self { run, anomaly, snapshot })
    }

    pub fn schema(&self, kind: ArtifactKind) -> &SchemaDocument {
        match kind {
            ArtifactKind::RunRow | ArtifactKind::RunDocument => &self.run,
            ArtifactKind::AnomalyLine => &self.anomaly,
            ArtifactKind::Snapshot => &self.snapshot,
        }
    }

    /// Validate serialized `payload` as an artifact of `kind`.
    pub fn validate(&self, payload: &str, kind: ArtifactKind) -> std::result::Result<(), ValidationError> {
        let schema = self.schema(kind);
        let mut violations = Vec::new();

        match kind {
            ArtifactKind::RunRow => check_csv(schema, payload, &mut violations),
            ArtifactKind::AnomalyLine => check_lines(schema, payload, &mut violations),
            ArtifactKind::RunDocument | ArtifactKind::Snapshot => match serde_json::from_str::<Value>(payload) {
                Ok(value) => check_document(schema, &value, "", &mut violations),
                Err(e) => violations.push(Violation::new("$", format!("invalid JSON: {}", e))),
            },
        }

        finish(kind, violations)
    }

    /// Validate an already-parsed JSON value. A `RunRow` value is checked as
    /// the equivalent run object.
    pub fn validate_value(&self, value: &Value, kind: ArtifactKind) -> std::result::Result<(), ValidationError> {
        let mut violations = Vec::new();
        check_document(self.schema(kind), value, "", &mut violations);
        finish(kind, violations)
    }
}

fn finish(kind: ArtifactKind, violations: Vec<Violation>) -> std::result::Result<(), ValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        log::debug!("{} rejected with {} violation(s)", kind, violations.len());
        Err(ValidationError { kind, violations })
    }
}

/// Reject schema documents the validator could not apply consistently.
fn check_document_shape(doc: &SchemaDocument, tabular: bool) -> Result<()> {
    let invalid = |reason: String| PipelineError::Schema {
        name: doc.id.clone(),
        reason,
    };

    if doc.root.kind != FieldType::Object {
        return Err(invalid(format!("root type must be object, got {}", doc.root.kind)));
    }
    for name in &doc.root.required {
        if !doc.root.properties.contains_key(name) {
            return Err(invalid(format!("required field `{}` has no property", name)));
        }
    }

    if tabular {
        if doc.columns.is_empty() {
            return Err(invalid("tabular schema declares no columns".to_string()));
        }
        for column in &doc.columns {
            match doc.property(column) {
                Some(field) if field.kind.is_scalar() => {}
                Some(field) => {
                    return Err(invalid(format!("column `{}` has non-scalar type {}", column, field.kind)))
                }
                None => return Err(invalid(format!("column `{}` has no property", column))),
            }
        }
    }

    if let Some(rule) = &doc.parallel {
        for name in &rule.fields {
            match doc.property(name) {
                Some(field) if field.kind == FieldType::Array => {}
                _ => return Err(invalid(format!("parallel field `{}` is not an array property", name))),
            }
        }
        if let Some(length) = &rule.length {
            match doc.property(length) {
                Some(field) if field.kind == FieldType::Integer => {}
                _ => return Err(invalid(format!("parallel length `{}` is not an integer property", length))),
            }
        }
    }

    Ok(())
}

// ============================================================================
// TABULAR
// ============================================================================

fn check_csv(schema: &SchemaDocument, payload: &str, out: &mut Vec<Violation>) {
    let mut lines = payload.lines();
    let expected = schema.columns.join(",");

    match lines.next() {
        None => {
            out.push(Violation::new("header", format!("missing, expected `{}`", expected)));
            return;
        }
        Some(header) if header != expected => {
            out.push(Violation::new(
                "header",
                format!("expected `{}`, got `{}`", expected, header),
            ));
        }
        Some(_) => {}
    }

    for (offset, line) in lines.enumerate() {
        let line_no = offset + 2;
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != schema.columns.len() {
            out.push(Violation::new(
                format!("line {}", line_no),
                format!("expected {} columns, got {}", schema.columns.len(), cells.len()),
            ));
            continue;
        }

        for (column, cell) in schema.columns.iter().zip(cells) {
            if let Some(field) = schema.property(column) {
                check_cell(field, cell, &format!("line {}.{}", line_no, column), out);
            }
        }
    }
}

fn check_cell(field: &FieldSchema, cell: &str, path: &str, out: &mut Vec<Violation>) {
    match field.kind {
        FieldType::Integer => {
            if cell.is_empty() || !cell.bytes().all(|b| b.is_ascii_digit()) {
                out.push(Violation::new(path, format!("expected digits, got `{}`", cell)));
            } else if let Ok(n) = cell.parse::<f64>() {
                check_bounds(field, n, path, out);
            }
        }
        FieldType::Number => match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => check_bounds(field, n, path, out),
            _ => out.push(Violation::new(path, format!("expected a number, got `{}`", cell))),
        },
        FieldType::Boolean => {
            if cell != "true" && cell != "false" {
                out.push(Violation::new(path, format!("expected true or false, got `{}`", cell)));
            }
        }
        FieldType::String => check_format(field, cell, path, out),
        FieldType::Array | FieldType::Object => {}
    }
}

// ============================================================================
// JSON
// ============================================================================

fn check_lines(schema: &SchemaDocument, payload: &str, out: &mut Vec<Violation>) {
    for (offset, line) in payload.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let prefix = format!("line {}", offset + 1);
        match serde_json::from_str::<Value>(line) {
            Ok(value) => check_value(&schema.root, &value, &prefix, out),
            Err(e) => out.push(Violation::new(prefix, format!("invalid JSON: {}", e))),
        }
    }
}

fn check_document(schema: &SchemaDocument, value: &Value, path: &str, out: &mut Vec<Violation>) {
    check_value(&schema.root, value, path, out);
    if let (Some(rule), Some(object)) = (&schema.parallel, value.as_object()) {
        check_parallel(rule, object, out);
    }
}

fn check_value(field: &FieldSchema, value: &Value, path: &str, out: &mut Vec<Violation>) {
    let here = if path.is_empty() { "$" } else { path };

    match field.kind {
        FieldType::Object => {
            let Some(object) = value.as_object() else {
                return out.push(type_violation(here, field.kind, value));
            };
            for name in &field.required {
                if !object.contains_key(name) {
                    out.push(Violation::new(join(path, name), "required field is missing"));
                }
            }
            for (name, sub) in &field.properties {
                if let Some(child) = object.get(name) {
                    check_value(sub, child, &join(path, name), out);
                }
            }
        }
        FieldType::Array => {
            let Some(items) = value.as_array() else {
                return out.push(type_violation(here, field.kind, value));
            };
            if let Some(item_schema) = &field.items {
                for (i, item) in items.iter().enumerate() {
                    check_value(item_schema, item, &format!("{}[{}]", here, i), out);
                }
            }
        }
        FieldType::Integer => {
            if value.is_i64() || value.is_u64() {
                if let Some(n) = value.as_f64() {
                    check_bounds(field, n, here, out);
                }
            } else {
                out.push(type_violation(here, field.kind, value));
            }
        }
        FieldType::Number => match value.as_f64() {
            Some(n) => check_bounds(field, n, here, out),
            None => out.push(type_violation(here, field.kind, value)),
        },
        FieldType::Boolean => {
            if !value.is_boolean() {
                out.push(type_violation(here, field.kind, value));
            }
        }
        FieldType::String => match value.as_str() {
            Some(s) => check_format(field, s, here, out),
            None => out.push(type_violation(here, field.kind, value)),
        },
    }
}

fn check_parallel(rule: &ParallelRule, object: &serde_json::Map<String, Value>, out: &mut Vec<Violation>) {
    let lengths: Vec<(&str, usize)> = rule
        .fields
        .iter()
        .filter_map(|name| object.get(name)?.as_array().map(|a| (name.as_str(), a.len())))
        .collect();

    let expected = rule
        .length
        .as_ref()
        .and_then(|name| object.get(name)?.as_u64().map(|n| (name.as_str(), n as usize)))
        .or_else(|| lengths.first().copied());

    if let Some((source, expected)) = expected {
        for (name, len) in lengths {
            if len != expected {
                out.push(Violation::new(
                    name,
                    format!("has {} entries, expected {} (same as {})", len, expected, source),
                ));
            }
        }
    }
}

// ============================================================================
// SHARED CHECKS
// ============================================================================

fn check_bounds(field: &FieldSchema, n: f64, path: &str, out: &mut Vec<Violation>) {
    if let Some(min) = field.minimum {
        if n < min {
            out.push(Violation::new(path, format!("{} is below minimum {}", n, min)));
        }
    }
    if let Some(min) = field.exclusive_minimum {
        if n <= min {
            out.push(Violation::new(path, format!("{} must be greater than {}", n, min)));
        }
    }
}

fn check_format(field: &FieldSchema, s: &str, path: &str, out: &mut Vec<Violation>) {
    if field.format == Some(FieldFormat::UtcZ) && !is_utc_z(s) {
        out.push(Violation::new(
            path,
            format!("`{}` is not a YYYY-MM-DDTHH:MM:SSZ timestamp", s),
        ));
    }
}

fn type_violation(path: &str, expected: FieldType, value: &Value) -> Violation {
    Violation::new(path, format!("expected {}, got {}", expected, json_type(value)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn join(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
