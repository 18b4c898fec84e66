//! Central Configuration Constants
//!
//! Single source of truth for pipeline defaults, environment keys and
//! artifact names.

use std::path::PathBuf;

/// Default number of prior runs averaged into the baseline
pub const DEFAULT_WINDOW: usize = 5;

/// Default elapsed/baseline ratio at which a run is flagged
pub const DEFAULT_ALERT_FACTOR: f64 = 2.0;

pub const ENV_WINDOW: &str = "CERTWATCH_WINDOW";
pub const ENV_ALERT_FACTOR: &str = "CERTWATCH_ALERT_FACTOR";
pub const ENV_SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";
pub const ENV_DATA_DIR: &str = "CERTWATCH_DATA_DIR";
pub const ENV_SCHEMA_DIR: &str = "CERTWATCH_SCHEMA_DIR";

/// Run log columns, in order
pub const CSV_COLUMNS: [&str; 5] = ["timestamp", "certs", "ok", "fails", "elapsed"];

/// `YYYY-MM-DDTHH:MM:SSZ`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// Artifact file names
pub const RUN_LOG_FILE: &str = "verify_stats.csv";
pub const RUN_SAMPLE_FILE: &str = "verify_stats.sample.json";
pub const ANOMALY_LOG_FILE: &str = "anomalies.jsonl";
pub const SNAPSHOT_FILE: &str = "dashboard.json";

// Schema document file names
pub const RUN_SCHEMA_FILE: &str = "verify_stats.schema.json";
pub const ANOMALY_SCHEMA_FILE: &str = "anomaly.schema.json";
pub const SNAPSHOT_SCHEMA_FILE: &str = "dashboard.schema.json";

/// Get the default directory for persisted artifacts
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("certwatch")
}
