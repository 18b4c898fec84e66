//! Aggregator - folds the run history into a `DashboardSnapshot`
//!
//! Per-run tallies are pass/fail units: a run with no failed certificate
//! contributes `1` to `ok_per_run`, any other run contributes `1` to
//! `fails_per_run`. Snapshot-level `ok`/`fails` are the sums of those
//! sequences, so `total == ok + fails`.

use crate::clock::Timestamp;
use crate::config::PipelineConfig;
use crate::error::MalformedRecordError;
use crate::model::{AnomalyRecord, DashboardSnapshot, VerificationRun};

/// Build a snapshot stamped with the config's clock.
pub fn build(
    runs: &[VerificationRun],
    anomalies: &[AnomalyRecord],
    config: &PipelineConfig,
) -> Result<DashboardSnapshot, MalformedRecordError> {
    build_at(runs, anomalies, config, config.clock().now())
}

/// Build a snapshot stamped with `generated_at`.
///
/// Fails on the first run whose counters disagree, naming it; nothing is
/// summed from a corrupt history.
pub fn build_at(
    runs: &[VerificationRun],
    anomalies: &[AnomalyRecord],
    config: &PipelineConfig,
    generated_at: Timestamp,
) -> Result<DashboardSnapshot, MalformedRecordError> {
    let mut timestamps = Vec::with_capacity(runs.len());
    let mut elapsed = Vec::with_capacity(runs.len());
    let mut ok_per_run = Vec::with_capacity(runs.len());
    let mut fails_per_run = Vec::with_capacity(runs.len());

    for (index, run) in runs.iter().enumerate() {
        run.check_at(index)?;

        let passed = u64::from(run.passed());
        timestamps.push(run.timestamp);
        elapsed.push(run.elapsed);
        ok_per_run.push(passed);
        fails_per_run.push(1 - passed);
    }

    Ok(DashboardSnapshot {
        generated_at,
        total: runs.len() as u64,
        ok: ok_per_run.iter().sum(),
        fails: fails_per_run.iter().sum(),
        timestamps,
        elapsed,
        ok_per_run,
        fails_per_run,
        anomalies: anomalies.to_vec(),
        alert_factor: config.alert_factor,
        window: config.window,
    })
}
