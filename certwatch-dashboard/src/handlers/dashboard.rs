//! Read-only dashboard handlers

use axum::{extract::State, Json};

use certwatch_core::{AnomalyRecord, DashboardSnapshot, PipelineError};

use crate::{AppError, AppResult, AppState};

/// Current snapshot, schema-checked before it leaves the server
pub async fn data(State(state): State<AppState>) -> AppResult<Json<DashboardSnapshot>> {
    let pipeline = state.pipeline.clone();
    let snapshot = tokio::task::spawn_blocking(move || pipeline.publish_snapshot())
        .await?
        .map_err(|e| match e {
            // A snapshot we built ourselves failing its schema is our fault
            PipelineError::Validation(e) => AppError::InternalError(e.to_string()),
            other => other.into(),
        })?;

    Ok(Json(snapshot))
}

/// Anomalies in arrival order
pub async fn anomalies(State(state): State<AppState>) -> Json<Vec<AnomalyRecord>> {
    Json(state.pipeline.anomalies())
}
