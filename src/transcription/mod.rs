use anyhow::{bail, Context, Result};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::TranscriptionConfig;

pub mod providers;

pub use providers::openai_api::audio_mime_type;
pub use providers::{OpenAIProvider, TranscriptionProvider};

pub struct Transcriber {
    provider: Box<dyn TranscriptionProvider>,
    language: Option<String>,
}

/// Empty and `auto` both mean "let the provider detect the language".
fn requested_language(language: Option<String>) -> Option<String> {
    language
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("auto"))
}

impl Transcriber {
    pub fn new(provider: Box<dyn TranscriptionProvider>, language: Option<String>) -> Self {
        Self {
            provider,
            language: requested_language(language),
        }
    }

    pub fn with_provider(provider_name: &str, config: ProviderConfig) -> Result<Self> {
        let language = requested_language(config.language.clone());

        let provider: Box<dyn TranscriptionProvider> = match provider_name {
            "openai-api" => {
                let api_key = config
                    .api_key
                    .context("api_key is required for OpenAI API provider")?;

                let model = config.model.unwrap_or_else(|| "whisper-1".to_string());
                Box::new(OpenAIProvider::new(
                    api_key,
                    config.api_endpoint,
                    model,
                    config.timeout,
                )?)
            }
            _ => bail!(
                "Unknown transcription provider '{}'. Supported providers: openai-api",
                provider_name
            ),
        };

        if !provider.is_available() {
            bail!("{} transcription provider is not available", provider.name());
        }

        info!(
            "Using {} for transcription (language: {})",
            provider.name(),
            language.as_deref().unwrap_or("auto")
        );

        Ok(Self { provider, language })
    }

    pub fn from_config(config: &TranscriptionConfig, timeout: Duration) -> Result<Self> {
        let provider = config.provider.as_deref().unwrap_or("openai-api");
        Self::with_provider(provider, ProviderConfig::from_config(config, timeout))
    }

    /// Transcribes `audio_path`. An empty transcript counts as a failure.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        info!(
            "Transcribing audio file: {:?} with {}",
            audio_path,
            self.provider.name()
        );
        let text = self
            .provider
            .transcribe(audio_path, self.language.as_deref())
            .await?;

        if text.trim().is_empty() {
            bail!("{} returned an empty transcript", self.provider.name());
        }

        Ok(text)
    }
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub model: Option<String>,
    pub language: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: None,
            language: None,
            api_endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    pub fn from_config(config: &TranscriptionConfig, timeout: Duration) -> Self {
        Self {
            model: config.model.clone(),
            language: config.language.clone(),
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout,
        }
    }
}
