//! Sample artifact generator
//!
//! Writes a small, schema-valid set of artifacts for consumers and CI:
//! `verify_stats.csv`, `verify_stats.sample.json` and `anomalies.jsonl`.
//! Pass a `FixedClock` (e.g. from `SOURCE_DATE_EPOCH`) for byte-identical
//! output across runs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::clock::Clock;
use crate::constants::RUN_SAMPLE_FILE;
use crate::error::Result;
use crate::model::{AnomalyRecord, VerificationRun};
use crate::schema::SchemaValidator;
use crate::sink::ArtifactSink;

pub fn write_samples(
    dir: impl Into<PathBuf>,
    clock: &dyn Clock,
    validator: Arc<SchemaValidator>,
) -> Result<Vec<PathBuf>> {
    let sink = ArtifactSink::new(dir, validator)?;
    let now = clock.now();

    let runs = [
        VerificationRun::new(now, 10, 10, 0, 12),
        VerificationRun::new(now, 12, 12, 0, 11),
    ];
    let anomalies = [
        AnomalyRecord { timestamp: now, elapsed: 10, factor: 1.2 },
        AnomalyRecord { timestamp: now, elapsed: 11, factor: 1.0 },
    ];

    let written = vec![
        sink.write_run_log(&runs)?,
        sink.write_run_document(&runs[1], RUN_SAMPLE_FILE)?,
        sink.write_anomaly_log(&anomalies)?,
    ];
    log::info!("Wrote {} sample artifact(s) to {:?}", written.len(), sink.dir());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, Timestamp};
    use crate::schema::ArtifactKind;
    use std::fs;

    #[test]
    fn test_samples_are_reproducible_and_valid() {
        let clock = FixedClock::new(Timestamp::from_epoch_seconds(1_735_689_600).unwrap());
        let validator = Arc::new(SchemaValidator::bundled().unwrap());

        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let a = write_samples(first.path(), &clock, validator.clone()).unwrap();
        let b = write_samples(second.path(), &clock, validator.clone()).unwrap();
        assert_eq!(a.len(), 3);

        for (left, right) in a.iter().zip(&b) {
            assert_eq!(fs::read(left).unwrap(), fs::read(right).unwrap());
            let kind = ArtifactKind::infer(left).unwrap();
            let text = fs::read_to_string(left).unwrap();
            assert!(validator.validate(&text, kind).is_ok(), "{:?}", left);
        }

        let csv = fs::read_to_string(first.path().join("verify_stats.csv")).unwrap();
        assert_eq!(
            csv,
            "timestamp,certs,ok,fails,elapsed\n\
             2025-01-01T00:00:00Z,10,10,0,12\n\
             2025-01-01T00:00:00Z,12,12,0,11\n"
        );
    }
}
