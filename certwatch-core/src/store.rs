//! Record Store - append-only run and anomaly history
//!
//! Both sequences sit behind `Arc`s. Readers take a [`History`] (two
//! pointer clones) and keep a stable view; an append while a view is alive
//! copies the vector instead of mutating what the reader sees.

use std::sync::Arc;

use crate::error::MalformedRecordError;
use crate::model::{AnomalyRecord, VerificationRun};

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    runs: Arc<Vec<VerificationRun>>,
    anomalies: Arc<Vec<AnomalyRecord>>,
}

/// Immutable view of the store at one point in time
#[derive(Debug, Clone, Default)]
pub struct History {
    runs: Arc<Vec<VerificationRun>>,
    anomalies: Arc<Vec<AnomalyRecord>>,
}

impl History {
    pub fn runs(&self) -> &[VerificationRun] {
        &self.runs
    }

    pub fn anomalies(&self) -> &[AnomalyRecord] {
        &self.anomalies
    }
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run, rejecting it if its counters disagree.
    /// Returns the run's position.
    pub fn append_run(&mut self, run: VerificationRun) -> Result<usize, MalformedRecordError> {
        let index = self.runs.len();
        run.check_at(index)?;
        Arc::make_mut(&mut self.runs).push(run);
        Ok(index)
    }

    pub fn append_anomaly(&mut self, anomaly: AnomalyRecord) {
        Arc::make_mut(&mut self.anomalies).push(anomaly);
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }

    pub fn history(&self) -> History {
        History {
            runs: Arc::clone(&self.runs),
            anomalies: Arc::clone(&self.anomalies),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Timestamp;

    fn run(n: i64, elapsed: u64) -> VerificationRun {
        let ts = Timestamp::from_epoch_seconds(1_735_689_600 + n * 3600).unwrap();
        VerificationRun::new(ts, 10, 10, 0, elapsed)
    }

    #[test]
    fn test_append_preserves_insertion_order() {
        let mut store = RecordStore::new();
        assert_eq!(store.append_run(run(1, 12)).unwrap(), 0);
        assert_eq!(store.append_run(run(0, 11)).unwrap(), 1);

        let history = store.history();
        let elapsed: Vec<u64> = history.runs().iter().map(|r| r.elapsed).collect();
        assert_eq!(elapsed, vec![12, 11]);
    }

    #[test]
    fn test_malformed_run_is_not_stored() {
        let mut store = RecordStore::new();
        let bad = VerificationRun::new(run(0, 1).timestamp, 5, 3, 1, 9);
        let err = store.append_run(bad).unwrap_err();
        assert!(err.run.starts_with("#0"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_view_is_stable_across_appends() {
        let mut store = RecordStore::new();
        store.append_run(run(0, 10)).unwrap();
        let view = store.history();

        store.append_run(run(1, 11)).unwrap();
        store.append_anomaly(AnomalyRecord::for_run(&run(1, 11), 3.0));

        assert_eq!(view.runs().len(), 1);
        assert!(view.anomalies().is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.anomaly_count(), 1);
    }
}
