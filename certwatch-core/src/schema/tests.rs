use std::path::Path;

use serde_json::json;

use super::{ArtifactKind, SchemaDocument, SchemaValidator};
use crate::error::PipelineError;

fn validator() -> SchemaValidator {
    SchemaValidator::bundled().unwrap()
}

fn fields(err: &crate::error::ValidationError) -> Vec<&str> {
    err.violations.iter().map(|v| v.field.as_str()).collect()
}

#[test]
fn test_bundled_schemas_load() {
    let v = validator();
    assert_eq!(
        v.schema(ArtifactKind::RunRow).columns,
        vec!["timestamp", "certs", "ok", "fails", "elapsed"]
    );
    assert!(v.schema(ArtifactKind::Snapshot).parallel.is_some());
}

#[test]
fn test_csv_accepts_well_formed_log() {
    let csv = "timestamp,certs,ok,fails,elapsed\n\
               2025-01-01T00:00:00Z,10,10,0,12\n\
               2025-01-01T01:00:00Z,12,12,0,11\n";
    assert!(validator().validate(csv, ArtifactKind::RunRow).is_ok());
}

#[test]
fn test_csv_header_must_match_exactly() {
    let csv = "timestamp,ok,certs,fails,elapsed\n2025-01-01T00:00:00Z,10,10,0,12\n";
    let err = validator().validate(csv, ArtifactKind::RunRow).unwrap_err();
    assert_eq!(fields(&err), vec!["header"]);
}

#[test]
fn test_csv_reports_every_bad_cell() {
    let csv = "timestamp,certs,ok,fails,elapsed\n\
               2025-01-01T00:00:00,10,ten,0,-4\n\
               2025-01-01T01:00:00Z,12,12,0\n";
    let err = validator().validate(csv, ArtifactKind::RunRow).unwrap_err();
    assert_eq!(
        fields(&err),
        vec!["line 2.timestamp", "line 2.ok", "line 2.elapsed", "line 3"]
    );
    assert_eq!(err.kind, ArtifactKind::RunRow);
}

#[test]
fn test_empty_csv_is_missing_header() {
    let err = validator().validate("", ArtifactKind::RunRow).unwrap_err();
    assert_eq!(fields(&err), vec!["header"]);
}

#[test]
fn test_run_document_reports_all_missing_and_mistyped_fields() {
    let doc = json!({ "timestamp": "2025-01-01T00:00:00Z", "certs": "12", "ok": 12.5 }).to_string();
    let err = validator().validate(&doc, ArtifactKind::RunDocument).unwrap_err();
    let got = fields(&err);
    assert!(got.contains(&"fails"));
    assert!(got.contains(&"elapsed"));
    assert!(got.contains(&"certs"));
    assert!(got.contains(&"ok"));
    assert_eq!(got.len(), 4);
}

#[test]
fn test_run_document_allows_extra_keys() {
    let doc = json!({
        "timestamp": "2025-01-01T00:00:00Z",
        "certs": 12, "ok": 12, "fails": 0, "elapsed": 11,
        "host": "ci-7"
    });
    assert!(validator().validate_value(&doc, ArtifactKind::RunDocument).is_ok());
}

#[test]
fn test_invalid_json_is_a_violation() {
    let err = validator().validate("{not json", ArtifactKind::Snapshot).unwrap_err();
    assert_eq!(fields(&err), vec!["$"]);
}

#[test]
fn test_anomaly_lines_are_numbered() {
    let jsonl = "{\"timestamp\":\"2025-01-01T00:00:00Z\",\"elapsed\":10,\"factor\":1.2}\n\
                 {\"timestamp\":\"2025-01-01T00:00:00Z\",\"elapsed\":10.5,\"factor\":\"high\"}\n";
    let err = validator().validate(jsonl, ArtifactKind::AnomalyLine).unwrap_err();
    assert_eq!(fields(&err), vec!["line 2.elapsed", "line 2.factor"]);
}

#[test]
fn test_anomaly_factor_may_be_integral() {
    let jsonl = "{\"timestamp\":\"2025-01-01T00:00:00Z\",\"elapsed\":11,\"factor\":1}\n";
    assert!(validator().validate(jsonl, ArtifactKind::AnomalyLine).is_ok());
}

#[test]
fn test_snapshot_sample_document_validates() {
    let doc = json!({
        "generated_at": "2025-01-01T00:00:00Z",
        "total": 2, "ok": 2, "fails": 0,
        "timestamps": ["2025-01-01T00:00:00Z", "2025-01-01T01:00:00Z"],
        "elapsed": [10, 11],
        "ok_per_run": [1, 1], "fails_per_run": [0, 0],
        "anomalies": [],
        "alert_factor": 2.0, "window": 5
    });
    assert!(validator().validate_value(&doc, ArtifactKind::Snapshot).is_ok());
}

#[test]
fn test_snapshot_parallel_sequences_must_agree() {
    let doc = json!({
        "generated_at": "2025-01-01T00:00:00Z",
        "total": 2, "ok": 2, "fails": 0,
        "timestamps": ["2025-01-01T00:00:00Z"],
        "elapsed": [10, 11],
        "ok_per_run": [1, 1], "fails_per_run": [0, 0],
        "anomalies": [{ "timestamp": "2025-01-01T00:00:00Z", "elapsed": 3 }],
        "alert_factor": 0.0, "window": 0
    });
    let err = validator().validate_value(&doc, ArtifactKind::Snapshot).unwrap_err();
    let got = fields(&err);
    assert!(got.contains(&"timestamps"));
    assert!(got.contains(&"anomalies[0].factor"));
    assert!(got.contains(&"alert_factor"));
    assert!(got.contains(&"window"));
}

#[test]
fn test_custom_schema_document_is_honored() {
    let run = SchemaDocument::parse(
        "run",
        r#"{
            "$id": "custom/run", "version": 2, "type": "object",
            "required": ["timestamp", "elapsed"],
            "properties": {
                "timestamp": { "type": "string", "format": "utc-z" },
                "elapsed": { "type": "integer" }
            },
            "columns": ["timestamp", "elapsed"]
        }"#,
    )
    .unwrap();
    let bundled = validator();
    let custom = SchemaValidator::from_documents(
        run,
        bundled.schema(ArtifactKind::AnomalyLine).clone(),
        bundled.schema(ArtifactKind::Snapshot).clone(),
    )
    .unwrap();

    assert!(custom
        .validate("timestamp,elapsed\n2025-01-01T00:00:00Z,5\n", ArtifactKind::RunRow)
        .is_ok());
    assert!(custom
        .validate("timestamp,certs,ok,fails,elapsed\n", ArtifactKind::RunRow)
        .is_err());
}

#[test]
fn test_tabular_schema_without_columns_is_rejected() {
    let bundled = validator();
    let mut run = bundled.schema(ArtifactKind::RunRow).clone();
    run.columns.clear();
    let err = SchemaValidator::from_documents(
        run,
        bundled.schema(ArtifactKind::AnomalyLine).clone(),
        bundled.schema(ArtifactKind::Snapshot).clone(),
    )
    .unwrap_err();
    assert!(matches!(err, PipelineError::Schema { .. }));
}

#[test]
fn test_from_dir_falls_back_to_bundled() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("anomaly.schema.json"),
        r#"{"$id":"strict/anomaly","version":9,"type":"object",
            "required":["timestamp","elapsed","factor","host"],
            "properties":{
                "timestamp":{"type":"string","format":"utc-z"},
                "elapsed":{"type":"integer"},
                "factor":{"type":"number"},
                "host":{"type":"string"}
            }}"#,
    )
    .unwrap();

    let v = SchemaValidator::from_dir(dir.path()).unwrap();
    assert_eq!(v.schema(ArtifactKind::AnomalyLine).version, 9);
    assert_eq!(v.schema(ArtifactKind::Snapshot).id, "certwatch/dashboard");

    let line = "{\"timestamp\":\"2025-01-01T00:00:00Z\",\"elapsed\":10,\"factor\":1.2}\n";
    let err = v.validate(line, ArtifactKind::AnomalyLine).unwrap_err();
    assert_eq!(fields(&err), vec!["line 1.host"]);
}

#[test]
fn test_infer_kind_from_file_name() {
    assert_eq!(ArtifactKind::infer(Path::new("out/verify_stats.csv")), Some(ArtifactKind::RunRow));
    assert_eq!(ArtifactKind::infer(Path::new("anomalies.jsonl")), Some(ArtifactKind::AnomalyLine));
    assert_eq!(
        ArtifactKind::infer(Path::new("verify_stats.sample.json")),
        Some(ArtifactKind::RunDocument)
    );
    assert_eq!(ArtifactKind::infer(Path::new("data.json")), Some(ArtifactKind::Snapshot));
    assert_eq!(ArtifactKind::infer(Path::new("notes.txt")), None);
}
