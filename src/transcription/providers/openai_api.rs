use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::time::Duration;
use tokio::fs;
use tracing::{debug, error, info};

use super::TranscriptionProvider;

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    r#type: Option<String>,
    code: Option<String>,
}

/// OpenAI speech-to-text over the `audio/transcriptions` endpoint.
pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAIProvider {
    pub fn new(
        api_key: String,
        endpoint: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        info!(
            "Initialized OpenAI transcription provider with endpoint: {} (model {})",
            endpoint, model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
        })
    }
}

impl OpenAIProvider {
    /// Text parts sent next to the audio file. `language` is left out when
    /// unset so the service detects it.
    fn text_fields(&self, language: Option<&str>) -> Vec<(&'static str, String)> {
        let mut fields = vec![("model", self.model.clone())];
        if let Some(language) = language {
            fields.push(("language", language.to_string()));
        }
        fields
    }
}

/// MIME type the upload is labelled with, by extension.
pub fn audio_mime_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        _ => "audio/webm",
    }
}

impl TranscriptionProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "OpenAI API"
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn transcribe<'a>(
        &'a self,
        audio_path: &'a Path,
        language: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            info!("Transcribing audio file via OpenAI API: {:?}", audio_path);

            let bytes = fs::read(audio_path)
                .await
                .with_context(|| format!("Failed to read audio file {:?}", audio_path))?;

            let file_name = audio_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "audio.webm".to_string());

            debug!("Uploading {} bytes as {}", bytes.len(), file_name);

            let part = Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(audio_mime_type(audio_path))
                .context("Invalid audio MIME type")?;

            let form = self
                .text_fields(language)
                .into_iter()
                .fold(Form::new().part("file", part), |form, (name, value)| {
                    form.text(name, value)
                });

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .multipart(form)
                .send()
                .await
                .context("Failed to send request to OpenAI API")?;

            let status = response.status();
            let response_text = response
                .text()
                .await
                .context("Failed to read response body")?;

            if !status.is_success() {
                error!(
                    "OpenAI transcription request failed with status {}: {}",
                    status, response_text
                );

                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&response_text) {
                    return Err(anyhow::anyhow!(
                        "OpenAI API error: {} (type: {:?}, code: {:?})",
                        error_response.error.message,
                        error_response.error.r#type,
                        error_response.error.code
                    ));
                }

                return Err(anyhow::anyhow!(
                    "OpenAI transcription request failed with status {}: {}",
                    status,
                    response_text
                ));
            }

            let transcription: TranscriptionResponse = serde_json::from_str(&response_text)
                .context("Failed to parse transcription response")?;

            let text = transcription.text.trim().to_string();
            info!("Transcription complete: {} chars", text.len());
            debug!("Raw transcription: {}", text);

            Ok(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_mime_type() {
        assert_eq!(audio_mime_type(Path::new("call.mp3")), "audio/mpeg");
        assert_eq!(audio_mime_type(Path::new("call.wav")), "audio/wav");
        assert_eq!(audio_mime_type(Path::new("call.webm")), "audio/webm");
        assert_eq!(audio_mime_type(Path::new("call")), "audio/webm");
    }

    #[test]
    fn test_error_response_parsing() {
        let body = r#"{"error":{"message":"Invalid file format.","type":"invalid_request_error","code":null}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Invalid file format.");
        assert_eq!(parsed.error.r#type.as_deref(), Some("invalid_request_error"));
        assert!(parsed.error.code.is_none());
    }

    #[test]
    fn test_availability_requires_key() {
        let provider = OpenAIProvider::new(
            String::new(),
            None,
            "whisper-1".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(!provider.is_available());
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_default_request_omits_language() {
        let provider = OpenAIProvider::new(
            "sk-test".to_string(),
            None,
            "whisper-1".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();

        let config = crate::config::TranscriptionConfig::default();
        let fields = provider.text_fields(config.language.as_deref());
        assert_eq!(fields, vec![("model", "whisper-1".to_string())]);

        let fields = provider.text_fields(Some("hi"));
        assert!(fields.contains(&("language", "hi".to_string())));
    }
}
