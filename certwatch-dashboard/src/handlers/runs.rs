//! Run ingestion handler

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use certwatch_core::{codec, AnomalyRecord, ArtifactKind};

use crate::{AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct RunAccepted {
    pub accepted: bool,
    pub index: usize,
    pub baseline: Option<f64>,
    pub anomaly: Option<AnomalyRecord>,
}

/// Accept one run document: schema check, ingest, append to the logs
pub async fn ingest(
    State(state): State<AppState>,
    body: String,
) -> AppResult<(StatusCode, Json<RunAccepted>)> {
    state.pipeline.validator().validate(&body, ArtifactKind::RunDocument)?;
    let run = codec::parse_run_document(&body)?;

    let pipeline = state.pipeline.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let outcome = pipeline.ingest(run)?;
        if let Err(e) = pipeline.publish_snapshot() {
            tracing::warn!("Snapshot not refreshed after run #{}: {}", outcome.index, e);
        }
        Ok::<_, certwatch_core::PipelineError>(outcome)
    })
    .await??;

    tracing::info!(
        "Accepted run #{} (baseline {:?}, anomaly: {})",
        outcome.index,
        outcome.baseline,
        outcome.anomaly.is_some()
    );

    Ok((
        StatusCode::CREATED,
        Json(RunAccepted {
            accepted: true,
            index: outcome.index,
            baseline: outcome.baseline,
            anomaly: outcome.anomaly,
        }),
    ))
}
