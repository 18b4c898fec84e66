//! Pipeline - single-writer ingest over one tracker/store pair
//!
//! Flow per run:
//! 1. check counters (malformed runs stop here)
//! 2. read the baseline, classify
//! 3. publish run row (+ anomaly line) to the sink, if any, all or nothing
//! 4. commit: observe into the window, append to the store
//!
//! The write lock is held for steps 1-4, so the baseline a run is judged
//! against is always the one left by the run before it. Readers clone the
//! copy-on-write history under a read lock and aggregate outside it.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;

use crate::aggregate;
use crate::baseline::BaselineTracker;
use crate::clock::Clock;
use crate::config::PipelineConfig;
use crate::detector;
use crate::error::{MalformedRecordError, PipelineError, Result};
use crate::model::{AnomalyRecord, DashboardSnapshot, VerificationRun};
use crate::schema::{ArtifactKind, SchemaValidator};
use crate::sink::ArtifactSink;
use crate::store::{History, RecordStore};

struct PipelineState {
    tracker: BaselineTracker,
    store: RecordStore,
}

/// What happened to one ingested run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestOutcome {
    /// Position of the run in the store
    pub index: usize,

    /// Baseline the run was compared against
    pub baseline: Option<f64>,

    pub anomaly: Option<AnomalyRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReplaySummary {
    pub accepted: usize,
    pub rejected: usize,
    pub anomalies: usize,
}

pub struct Pipeline {
    config: PipelineConfig,
    clock: Arc<dyn Clock>,
    validator: Arc<SchemaValidator>,
    sink: Option<ArtifactSink>,
    state: RwLock<PipelineState>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            clock: config.clock(),
            validator: Arc::new(SchemaValidator::bundled()?),
            sink: None,
            state: RwLock::new(PipelineState {
                tracker: BaselineTracker::new(config.window),
                store: RecordStore::new(),
            }),
            config,
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_validator(mut self, validator: Arc<SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Publish every accepted run (and its anomaly) through `sink`
    pub fn with_sink(mut self, sink: ArtifactSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    pub fn sink(&self) -> Option<&ArtifactSink> {
        self.sink.as_ref()
    }

    /// Check, classify, publish and record one run.
    pub fn ingest(&self, run: VerificationRun) -> Result<IngestOutcome> {
        let mut state = self.state.write();
        self.apply(&mut state, run, self.sink.as_ref())
    }

    /// Rebuild state from already-persisted runs. Nothing is re-published;
    /// malformed runs are skipped and counted.
    pub fn replay<I>(&self, runs: I) -> Result<ReplaySummary>
    where
        I: IntoIterator<Item = VerificationRun>,
    {
        self.replay_rows(runs.into_iter().map(Ok))
    }

    /// Like [`replay`](Self::replay), for rows whose decoding already failed
    /// on their counters (see `ArtifactSink::load_runs`). Those count as
    /// rejected alongside runs that fail the check here.
    pub fn replay_rows<I>(&self, rows: I) -> Result<ReplaySummary>
    where
        I: IntoIterator<Item = std::result::Result<VerificationRun, MalformedRecordError>>,
    {
        let mut state = self.state.write();
        let mut summary = ReplaySummary::default();

        for row in rows {
            let outcome = row
                .map_err(PipelineError::from)
                .and_then(|run| self.apply(&mut state, run, None));
            match outcome {
                Ok(outcome) => {
                    summary.accepted += 1;
                    summary.anomalies += usize::from(outcome.anomaly.is_some());
                }
                Err(PipelineError::Malformed(e)) => {
                    log::warn!("Skipping run during replay: {}", e);
                    summary.rejected += 1;
                }
                Err(e) => return Err(e),
            }
        }

        log::info!(
            "Replayed {} run(s): {} rejected, {} anomalies",
            summary.accepted,
            summary.rejected,
            summary.anomalies
        );
        Ok(summary)
    }

    fn apply(
        &self,
        state: &mut PipelineState,
        run: VerificationRun,
        sink: Option<&ArtifactSink>,
    ) -> Result<IngestOutcome> {
        let index = state.store.len();
        if let Err(e) = run.check_at(index) {
            log::warn!("Rejected {}", e);
            return Err(e.into());
        }

        let baseline = state.tracker.baseline();
        let anomaly = detector::classify(&run, baseline, self.config.alert_factor);

        if let Some(sink) = sink {
            sink.append_ingested(&run, anomaly.as_ref())?;
        }

        let observed = state.tracker.observe(run.elapsed);
        debug_assert_eq!(observed, baseline);
        let index = state.store.append_run(run)?;
        if let Some(anomaly) = &anomaly {
            state.store.append_anomaly(anomaly.clone());
        }

        Ok(IngestOutcome {
            index,
            baseline,
            anomaly,
        })
    }

    /// Consistent view of the history at this instant
    pub fn history(&self) -> History {
        self.state.read().store.history()
    }

    pub fn len(&self) -> usize {
        self.state.read().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn anomalies(&self) -> Vec<AnomalyRecord> {
        self.history().anomalies().to_vec()
    }

    /// Rebuild the dashboard snapshot from the full history.
    pub fn snapshot(&self) -> Result<DashboardSnapshot> {
        let history = self.history();
        let snapshot = aggregate::build_at(
            history.runs(),
            history.anomalies(),
            &self.config,
            self.clock.now(),
        )?;
        Ok(snapshot)
    }

    /// Snapshot that passed schema validation, also written to the sink
    /// when one is attached.
    pub fn publish_snapshot(&self) -> Result<DashboardSnapshot> {
        let snapshot = self.snapshot()?;
        let value = serde_json::to_value(&snapshot)?;
        if let Err(e) = self.validator.validate_value(&value, ArtifactKind::Snapshot) {
            log::error!("Snapshot blocked: {}", e);
            return Err(e.into());
        }
        if let Some(sink) = &self.sink {
            sink.write_snapshot(&snapshot)?;
        }
        Ok(snapshot)
    }
}
