//! Certwatch Dashboard Server
//!
//! Owns the single-writer pipeline, accepts verification runs over HTTP and
//! serves the dashboard snapshot read-only.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  CERTWATCH DASHBOARD                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌──────────────────────────────────────┐  │
//! │  │  API      │──▶│  Pipeline (certwatch-core)           │  │
//! │  │  (Axum)   │   │  baseline → detector → store         │  │
//! │  └───────────┘   └──────────────────┬───────────────────┘  │
//! │                                     ▼                      │
//! │                 verify_stats.csv / anomalies.jsonl /       │
//! │                 dashboard.json (schema-gated)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod handlers;


use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use certwatch_core::{ArtifactSink, Pipeline, SchemaValidator};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let json_logs = std::env::var("ENVIRONMENT").map_or(false, |env| env == "production");

    // Initialize logging; core `log` records are picked up by the subscriber
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "certwatch_dashboard=debug,certwatch_core=info,tower_http=debug".into()))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    // Load configuration
    let config = config::Config::from_env().context("invalid configuration")?;

    tracing::info!("Certwatch Dashboard starting...");
    tracing::info!(
        "Data dir: {:?}, window: {}, alert factor: {}, production: {}",
        config.data_dir,
        config.pipeline.window,
        config.pipeline.alert_factor,
        config.is_production()
    );

    let pipeline = build_pipeline(&config)?;

    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Load schemas, replay the persisted run log, then attach the sinks so
/// only new runs are appended.
fn build_pipeline(config: &config::Config) -> anyhow::Result<Pipeline> {
    let validator = Arc::new(match &config.schema_dir {
        Some(dir) => SchemaValidator::from_dir(dir),
        None => SchemaValidator::bundled(),
    }.context("failed to load schemas")?);

    let sink = ArtifactSink::new(&config.data_dir, validator.clone())
        .context("failed to open data dir")?;
    let persisted = sink.load_runs().context("failed to read run log")?;

    let pipeline = Pipeline::new(config.pipeline)?.with_validator(validator);
    let summary = pipeline.replay_rows(persisted)?;
    tracing::info!(
        "Restored {} run(s), {} anomalies ({} rejected)",
        summary.accepted,
        summary.anomalies,
        summary.rejected
    );

    Ok(pipeline.with_sink(sink))
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/data.json", get(handlers::dashboard::data))
        .route("/api/v1/anomalies", get(handlers::dashboard::anomalies))
        .route("/api/v1/runs", post(handlers::runs::ingest))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
