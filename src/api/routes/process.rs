//! Call processing endpoints.
//!
//! - `POST /process`: multipart upload (`audio_data`) through the full pipeline
//! - `POST /process_text`: one agent turn in a chat session

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    response::Json,
    routing::post,
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;

/// Multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio_data";

/// Uploads larger than the transcription service accepts are rejected early.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub transcript: String,
    pub response: String,
    pub call_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessTextRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessTextResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/process",
            post(process_audio).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/process_text", post(process_text))
        .with_state(state)
}

async fn process_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<ProcessResponse>> {
    let mut multipart = multipart.map_err(|_| ApiError::bad_request("No audio uploaded"))?;

    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() == Some(AUDIO_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            audio = Some(bytes);
            break;
        }
    }

    let audio = audio.ok_or_else(|| ApiError::bad_request("No audio uploaded"))?;
    debug!("Received {} bytes of audio", audio.len());

    let processed = state.processor.process_audio(&audio).await?;
    info!("Processed upload as call {}", processed.call_id);

    Ok(Json(ProcessResponse {
        transcript: processed.transcript,
        response: processed.response,
        call_id: processed.call_id,
    }))
}

async fn process_text(
    State(state): State<AppState>,
    body: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> ApiResult<Json<ProcessTextResponse>> {
    let Json(request) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let text = request.text.unwrap_or_default();

    let reply = state
        .processor
        .process_text(&text, request.session_id.as_deref())
        .await;

    Ok(Json(ProcessTextResponse {
        response: reply.response,
        session_id: reply.session_id,
    }))
}
