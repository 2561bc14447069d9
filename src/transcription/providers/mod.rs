use anyhow::Result;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub mod openai_api;

pub use openai_api::OpenAIProvider;

/// Speech-to-text backend for uploaded call audio.
pub trait TranscriptionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the provider has what it needs (credentials) to accept requests
    fn is_available(&self) -> bool;

    /// Transcribes the file at `audio_path`. `None` lets the service detect
    /// the spoken language.
    fn transcribe<'a>(
        &'a self,
        audio_path: &'a Path,
        language: Option<&'a str>,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
}
