//! Certwatch Core - Verification Run Telemetry Engine
//!
//! Turns a stream of certificate-verification runs into anomaly flags and a
//! schema-checked dashboard snapshot.
//!
//! # Architecture
//!
//! ```text
//! VerificationRun ─▶ BaselineTracker ─▶ detector::classify ─▶ RecordStore
//!                     (baseline before        │                    │
//!                      this run)              ▼                    ▼
//!                                       ArtifactSink ◀── aggregate::build
//!                                  (SchemaValidator gate)   DashboardSnapshot
//! ```
//!
//! - `baseline`: rolling mean over the last `window` elapsed values
//! - `detector`: `elapsed / baseline >= alert_factor`
//! - `store`: append-only, copy-on-write history
//! - `aggregate`: snapshot builder
//! - `schema`: schema documents and the validator
//! - `codec`, `sink`: artifact rendering and validated file output
//! - `pipeline`: the single writer tying it together

pub mod constants;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod baseline;
pub mod detector;
pub mod store;
pub mod aggregate;
pub mod schema;
pub mod codec;
pub mod sink;
pub mod pipeline;
pub mod samples;

pub use clock::{Clock, FixedClock, SystemClock, Timestamp};
pub use config::PipelineConfig;
pub use error::{
    ConfigurationError, MalformedRecordError, PipelineError, RecordProblem, Result,
    ValidationError, Violation,
};
pub use model::{AnomalyRecord, DashboardSnapshot, VerificationRun};
pub use pipeline::{IngestOutcome, Pipeline, ReplaySummary};
pub use schema::{ArtifactKind, SchemaValidator};
pub use sink::ArtifactSink;
