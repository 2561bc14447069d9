//! Dashboard statistics endpoints.
//!
//! - `GET /api/call_summary`
//! - `GET /api/call_status_pie`
//! - `GET /api/call_outcomes_bar`

use axum::{extract::State, response::Json, routing::get, Router};

use crate::api::error::ApiResult;
use crate::api::AppState;
use crate::db;
use crate::records::{self, ChartPoint, SummaryStats};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/call_summary", get(call_summary))
        .route("/api/call_status_pie", get(call_status_pie))
        .route("/api/call_outcomes_bar", get(call_outcomes_bar))
        .with_state(state)
}

async fn call_summary(State(state): State<AppState>) -> ApiResult<Json<SummaryStats>> {
    let stats = db::with_connection(state.db_path(), records::summary).await?;
    Ok(Json(stats))
}

async fn call_status_pie(State(state): State<AppState>) -> ApiResult<Json<Vec<ChartPoint>>> {
    let points = db::with_connection(state.db_path(), records::status_breakdown).await?;
    Ok(Json(points))
}

/// Outcome counts over ended calls, labels in first-seen order.
async fn call_outcomes_bar(State(state): State<AppState>) -> ApiResult<Json<Vec<ChartPoint>>> {
    let points = db::with_connection(state.db_path(), records::outcome_breakdown).await?;
    Ok(Json(points))
}
