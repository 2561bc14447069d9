//! Call record endpoints.
//!
//! Provides HTTP endpoints for:
//! - Listing calls with filters (GET /api/calls)
//! - Exporting every call as CSV (GET /api/calls/export_csv)
//! - Getting a single call (GET /api/call/:id)
//! - Replacing a call's transcript (POST /save_transcript)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::db::{self, CallFilter, CallRepository};
use crate::records::{self, CallDetail, CallSummary};

/// Query parameters for the call list. All are optional and combine with AND.
#[derive(Debug, Default, Deserialize)]
pub struct CallsQueryParams {
    /// Lower bound on start time, compared as text
    pub from: Option<String>,
    /// Upper bound on start time, compared as text
    pub to: Option<String>,
    /// `active`, `connected`, `ended` or `All`
    pub status: Option<String>,
    /// Minimum duration in seconds; ignored when not an integer
    pub duration: Option<String>,
    pub search: Option<String>,
}

impl CallsQueryParams {
    pub fn to_filter(&self) -> CallFilter {
        let mut filter = CallFilter::new().with_date_range(
            self.from.clone().filter(|s| !s.is_empty()),
            self.to.clone().filter(|s| !s.is_empty()),
        );

        if let Some(status) = &self.status {
            filter = filter.with_status(status.clone());
        }
        if let Some(seconds) = self
            .duration
            .as_deref()
            .and_then(|d| d.trim().parse::<i64>().ok())
        {
            filter = filter.with_min_duration(seconds);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search(search.clone());
        }

        filter
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveTranscriptRequest {
    pub call_id: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveTranscriptResponse {
    pub status: &'static str,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/calls", get(list_calls))
        .route("/api/calls/export_csv", get(export_csv))
        .route("/api/call/:id", get(get_call))
        .route("/save_transcript", post(save_transcript))
        .with_state(state)
}

async fn list_calls(
    State(state): State<AppState>,
    Query(params): Query<CallsQueryParams>,
) -> ApiResult<Json<Vec<CallSummary>>> {
    let filter = params.to_filter();
    let calls =
        db::with_connection(state.db_path(), move |conn| records::list(conn, &filter)).await?;
    Ok(Json(calls))
}

async fn export_csv(State(state): State<AppState>) -> ApiResult<Response> {
    let csv = db::with_connection(state.db_path(), records::export_csv).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment;filename=call_records.csv",
            ),
        ],
        csv,
    )
        .into_response())
}

async fn get_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CallDetail>> {
    let detail = db::with_connection(state.db_path(), move |conn| records::detail(conn, &id))
        .await?
        .ok_or_else(|| ApiError::not_found("Call not found"))?;

    Ok(Json(detail))
}

async fn save_transcript(
    State(state): State<AppState>,
    body: Result<Json<SaveTranscriptRequest>, JsonRejection>,
) -> ApiResult<Json<SaveTranscriptResponse>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let call_id = request
        .call_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::not_found("Call not found"))?;
    let transcript = request.transcript.unwrap_or_default();

    let updated = {
        let call_id = call_id.clone();
        db::with_connection(state.db_path(), move |conn| {
            CallRepository::update_transcript(conn, &call_id, &transcript)
        })
        .await?
    };

    if !updated {
        return Err(ApiError::not_found("Call not found"));
    }

    info!("Transcript updated for call {}", call_id);
    Ok(Json(SaveTranscriptResponse { status: "success" }))
}
