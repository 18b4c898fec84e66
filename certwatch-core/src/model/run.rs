use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::error::{MalformedRecordError, RecordProblem};

/// One completed certificate-verification job.
///
/// Created once and never mutated; the store only hands out shared views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRun {
    pub timestamp: Timestamp,

    /// Certificates examined
    pub certs: u64,

    /// Certificates that verified
    pub ok: u64,

    /// Certificates that failed verification
    pub fails: u64,

    /// Run duration in milliseconds
    pub elapsed: u64,
}

impl VerificationRun {
    pub fn new(timestamp: Timestamp, certs: u64, ok: u64, fails: u64, elapsed: u64) -> Self {
        Self {
            timestamp,
            certs,
            ok,
            fails,
            elapsed,
        }
    }

    /// `ok + fails == certs`
    pub fn check(&self) -> Result<(), RecordProblem> {
        match self.ok.checked_add(self.fails) {
            Some(sum) if sum == self.certs => Ok(()),
            _ => Err(RecordProblem::CountMismatch {
                certs: self.certs,
                ok: self.ok,
                fails: self.fails,
            }),
        }
    }

    /// Like [`check`](Self::check), naming the run by its position.
    pub fn check_at(&self, index: usize) -> Result<(), MalformedRecordError> {
        self.check()
            .map_err(|problem| MalformedRecordError::new(self.describe(index), problem))
    }

    /// A run passes when no certificate failed.
    pub fn passed(&self) -> bool {
        self.fails == 0
    }

    pub fn describe(&self, index: usize) -> String {
        format!("#{} ({})", index, self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> Timestamp {
        Timestamp::from_epoch_seconds(1_735_689_600).unwrap()
    }

    #[test]
    fn test_consistent_run_passes_check() {
        let run = VerificationRun::new(ts(), 10, 9, 1, 12);
        assert!(run.check().is_ok());
        assert!(!run.passed());
    }

    #[test]
    fn test_count_mismatch_is_reported() {
        let run = VerificationRun::new(ts(), 5, 3, 1, 12);
        let err = run.check_at(4).unwrap_err();
        assert_eq!(err.run, "#4 (2025-01-01T00:00:00Z)");
        assert_eq!(
            err.problem,
            RecordProblem::CountMismatch { certs: 5, ok: 3, fails: 1 }
        );
    }

    #[test]
    fn test_overflowing_counts_do_not_panic() {
        let run = VerificationRun::new(ts(), u64::MAX, u64::MAX, 1, 0);
        assert!(run.check().is_err());
    }
}
