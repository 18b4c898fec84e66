//! Artifact Sink - validated file outputs
//!
//! Every artifact is rendered, validated against its schema, and only then
//! written. A rejected artifact leaves the files on disk untouched.
//!
//! - `verify_stats.csv`: append-only run log, header written on creation
//! - `anomalies.jsonl`: append-only anomaly log
//! - `dashboard.json`: rewritten whole on every publish

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::codec;
use crate::constants::{ANOMALY_LOG_FILE, RUN_LOG_FILE, SNAPSHOT_FILE};
use crate::error::{MalformedRecordError, Result};
use crate::model::{AnomalyRecord, DashboardSnapshot, VerificationRun};
use crate::schema::{ArtifactKind, SchemaValidator};

pub struct ArtifactSink {
    base_dir: PathBuf,
    validator: Arc<SchemaValidator>,
    /// Serializes appends so rows never interleave
    write_lock: Mutex<()>,
}

impl ArtifactSink {
    pub fn new(base_dir: impl Into<PathBuf>, validator: Arc<SchemaValidator>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(Self {
            base_dir,
            validator,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn run_log_path(&self) -> PathBuf {
        self.base_dir.join(RUN_LOG_FILE)
    }

    pub fn anomaly_log_path(&self) -> PathBuf {
        self.base_dir.join(ANOMALY_LOG_FILE)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.base_dir.join(SNAPSHOT_FILE)
    }

    /// Append one run to the run log
    pub fn append_run(&self, run: &VerificationRun) -> Result<()> {
        self.append_ingested(run, None)
    }

    /// Append a run and, when it was flagged, its anomaly as one unit.
    ///
    /// Both are rendered and validated before anything is written. If the
    /// anomaly line cannot be written the run row is cut back off, so the
    /// run log never holds a run the anomaly log missed.
    pub fn append_ingested(&self, run: &VerificationRun, anomaly: Option<&AnomalyRecord>) -> Result<()> {
        let row = codec::render_csv_row(run);
        // Rows are validated together with the header they will sit under
        let candidate = format!("{}\n{}\n", codec::render_csv_header(), row);
        self.validator.validate(&candidate, ArtifactKind::RunRow)?;
        let line = match anomaly {
            Some(anomaly) => Some(self.checked_line(anomaly)?),
            None => None,
        };

        let _guard = self.write_lock.lock();
        let run_log = self.run_log_path();
        let prior_len = fs::metadata(&run_log).map(|m| m.len()).unwrap_or(0);

        if let Err(e) = append_row(&run_log, prior_len, &row) {
            rollback(&run_log, prior_len);
            return Err(e.into());
        }
        if let Some(line) = line {
            if let Err(e) = append_line(&self.anomaly_log_path(), &line) {
                log::error!("Anomaly for {} not written, dropping its run row: {}", run.timestamp, e);
                rollback(&run_log, prior_len);
                return Err(e.into());
            }
        }
        Ok(())
    }

    /// Append one anomaly to the anomaly log
    pub fn append_anomaly(&self, anomaly: &AnomalyRecord) -> Result<()> {
        let line = self.checked_line(anomaly)?;
        let _guard = self.write_lock.lock();
        append_line(&self.anomaly_log_path(), &line)?;
        Ok(())
    }

    fn checked_line(&self, anomaly: &AnomalyRecord) -> Result<String> {
        let line = codec::render_jsonl_line(anomaly)?;
        self.validator.validate(&line, ArtifactKind::AnomalyLine)?;
        Ok(line)
    }

    /// Replace the run log with `runs`
    pub fn write_run_log(&self, runs: &[VerificationRun]) -> Result<PathBuf> {
        let text = codec::render_csv(runs);
        self.validator.validate(&text, ArtifactKind::RunRow)?;
        self.replace(RUN_LOG_FILE, &text)
    }

    /// Replace the anomaly log with `anomalies`
    pub fn write_anomaly_log(&self, anomalies: &[AnomalyRecord]) -> Result<PathBuf> {
        let text = codec::render_jsonl(anomalies)?;
        self.validator.validate(&text, ArtifactKind::AnomalyLine)?;
        self.replace(ANOMALY_LOG_FILE, &text)
    }

    /// Write a single run as a JSON document under `file_name`
    pub fn write_run_document(&self, run: &VerificationRun, file_name: &str) -> Result<PathBuf> {
        let text = codec::render_run_document(run)?;
        self.validator.validate(&text, ArtifactKind::RunDocument)?;
        self.replace(file_name, &text)
    }

    pub fn write_snapshot(&self, snapshot: &DashboardSnapshot) -> Result<PathBuf> {
        let text = codec::render_snapshot(snapshot)?;
        self.validator.validate(&text, ArtifactKind::Snapshot)?;
        self.replace(SNAPSHOT_FILE, &text)
    }

    /// Rows persisted so far, one entry per run; empty when there is no
    /// run log yet. Rows with broken counters come back as errors.
    pub fn load_runs(&self) -> Result<Vec<std::result::Result<VerificationRun, MalformedRecordError>>> {
        let path = self.run_log_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&path)?;
        codec::parse_csv_rows(&text)
    }

    /// Write to a sibling temp file, then rename over the target
    fn replace(&self, file_name: &str, text: &str) -> Result<PathBuf> {
        let _guard = self.write_lock.lock();
        let path = self.base_dir.join(file_name);
        let tmp = self.base_dir.join(format!(".{}.tmp", file_name));
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &path)?;
        log::info!("Published {:?}", path);
        Ok(path)
    }
}

/// Header first when the log is empty
fn append_row(path: &Path, prior_len: u64, row: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if prior_len == 0 {
        writeln!(file, "{}", codec::render_csv_header())?;
    }
    writeln!(file, "{}", row)?;
    file.flush()
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", line)?;
    file.flush()
}

fn rollback(path: &Path, len: u64) {
    let result = OpenOptions::new().write(true).open(path).and_then(|f| f.set_len(len));
    if let Err(e) = result {
        log::error!("Could not truncate {:?} back to {} bytes: {}", path, len, e);
    }
}
