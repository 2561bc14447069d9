//! REST API server for calldesk.
//!
//! Provides HTTP endpoints for:
//! - Audio and text call processing
//! - Call record listing, detail, transcript edits and CSV export
//! - Dashboard statistics
//! - Stored recordings

pub mod error;
pub mod routes;

use crate::processing::CallProcessor;
use anyhow::Result;
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<CallProcessor>,
}

impl AppState {
    pub fn new(processor: CallProcessor) -> Self {
        Self {
            processor: Arc::new(processor),
        }
    }

    pub fn db_path(&self) -> &Path {
        self.processor.db_path()
    }

    pub fn recording_dir(&self) -> &Path {
        self.processor.recording_dir()
    }
}

/// Every route, with request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(status))
        .route("/version", get(version))
        .merge(routes::process::router(state.clone()))
        .merge(routes::calls::router(state.clone()))
        .merge(routes::dashboard::router(state.clone()))
        .merge(routes::recording::router(state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

pub struct ApiServer {
    address: String,
    state: AppState,
}

impl ApiServer {
    pub fn new(address: impl Into<String>, state: AppState) -> Self {
        Self {
            address: address.into(),
            state,
        }
    }

    pub async fn start(self) -> Result<()> {
        let app = router(self.state);

        let listener = tokio::net::TcpListener::bind(&self.address).await?;

        info!("API server listening on http://{}", self.address);
        info!("Endpoints:");
        info!("  GET  /                       - Service info");
        info!("  POST /process                - Process an uploaded call recording");
        info!("  POST /process_text           - Chat with the agent");
        info!("  GET  /api/calls              - List calls");
        info!("  GET  /api/calls/export_csv   - Export calls as CSV");
        info!("  GET  /api/call/:id           - Get a single call");
        info!("  POST /save_transcript        - Replace a call transcript");
        info!("  GET  /api/call_summary       - Dashboard counters");
        info!("  GET  /api/call_status_pie    - Status breakdown");
        info!("  GET  /api/call_outcomes_bar  - Outcome breakdown");
        info!("  GET  /recording/:filename    - Stored recording");

        axum::serve(listener, app).await?;

        Ok(())
    }
}

async fn status() -> Json<Value> {
    Json(json!({
        "service": "calldesk",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

async fn version() -> Json<Value> {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "name": "calldesk"
    }))
}
