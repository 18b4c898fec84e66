use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use super::run::VerificationRun;

/// Flag raised for a run whose elapsed time reached `alert_factor` times the
/// baseline in effect before it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub timestamp: Timestamp,
    pub elapsed: u64,

    /// `elapsed / baseline`
    pub factor: f64,
}

impl AnomalyRecord {
    pub fn for_run(run: &VerificationRun, factor: f64) -> Self {
        Self {
            timestamp: run.timestamp,
            elapsed: run.elapsed,
            factor,
        }
    }
}
