//! Serves stored call recordings (GET /recording/:filename).

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path as FsPath;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::api::AppState;
use crate::transcription::audio_mime_type;

const SERVED_EXTENSIONS: [&str; 3] = ["webm", "mp3", "wav"];

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/recording/:filename", get(serve_recording))
        .with_state(state)
}

/// A bare file name with one of the served audio extensions.
pub fn is_servable_name(filename: &str) -> bool {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.starts_with('.')
    {
        return false;
    }

    let path = FsPath::new(filename);
    if path.file_name().and_then(|n| n.to_str()) != Some(filename) {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SERVED_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

async fn serve_recording(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    if !is_servable_name(&filename) {
        debug!("Refusing to serve recording {:?}", filename);
        return Err(ApiError::not_found("Recording not found"));
    }

    let path = state.recording_dir().join(&filename);
    if !path.is_file() {
        return Err(ApiError::not_found("Recording not found"));
    }

    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read recording: {}", e)))?;

    Ok(([(header::CONTENT_TYPE, audio_mime_type(&path))], bytes).into_response())
}
