use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use super::anomaly::AnomalyRecord;

/// Dashboard document, rebuilt from the full history on every request.
///
/// `timestamps`, `elapsed`, `ok_per_run` and `fails_per_run` are parallel:
/// entry N of each belongs to run N, and each has `total` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub generated_at: Timestamp,
    pub total: u64,
    pub ok: u64,
    pub fails: u64,
    pub timestamps: Vec<Timestamp>,
    pub elapsed: Vec<u64>,
    pub ok_per_run: Vec<u64>,
    pub fails_per_run: Vec<u64>,
    pub anomalies: Vec<AnomalyRecord>,
    pub alert_factor: f64,
    pub window: usize,
}

impl DashboardSnapshot {
    /// Equal in every field except `generated_at`
    pub fn same_content(&self, other: &Self) -> bool {
        Self {
            generated_at: other.generated_at,
            ..self.clone()
        } == *other
    }
}
