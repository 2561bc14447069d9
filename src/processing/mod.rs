//! Call processing pipeline.
//!
//! create → store audio → transcribe → extract/classify → connect → agent
//! turn → end
//!
//! Every collaborator is injected; the processor holds no conversation state
//! of its own beyond the per-session store used by text chat.

use anyhow::Context;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::agent::{ChatProvider, Conversation, ConversationStore};
use crate::analysis::{classify_text, CustomerInfoExtractor, SentimentScorer};
use crate::db::{self, CallRecord, CallRepository};
use crate::lifecycle;
use crate::transcription::Transcriber;

/// Reply to an empty text turn.
pub const EMPTY_TEXT_REPLY: &str = "No input text received.";

#[derive(Debug, Error)]
pub enum ProcessError {
    /// Transcription failed or came back empty. The call has been ended.
    #[error("Failed to transcribe audio")]
    Transcription { call_id: String, reason: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Outcome of a processed audio upload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedCall {
    pub call_id: String,
    pub transcript: String,
    pub response: String,
}

/// Reply to a text turn. `session_id` is absent when the input was empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TextReply {
    pub response: String,
    pub session_id: Option<String>,
}

pub struct CallProcessor {
    db_path: PathBuf,
    recording_dir: PathBuf,
    transcriber: Transcriber,
    chat: Arc<dyn ChatProvider>,
    scorer: Arc<dyn SentimentScorer>,
    extractor: CustomerInfoExtractor,
    sessions: ConversationStore,
}

impl CallProcessor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_path: PathBuf,
        recording_dir: PathBuf,
        transcriber: Transcriber,
        chat: Arc<dyn ChatProvider>,
        scorer: Arc<dyn SentimentScorer>,
        extractor: CustomerInfoExtractor,
        sessions: ConversationStore,
    ) -> Self {
        Self {
            db_path,
            recording_dir,
            transcriber,
            chat,
            scorer,
            extractor,
            sessions,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn recording_dir(&self) -> &Path {
        &self.recording_dir
    }

    pub fn sessions(&self) -> &ConversationStore {
        &self.sessions
    }

    /// Runs one uploaded recording through the full pipeline.
    pub async fn process_audio(&self, audio: &[u8]) -> Result<ProcessedCall, ProcessError> {
        debug!("Processing {} bytes of uploaded audio", audio.len());

        let mut call = db::with_connection(&self.db_path, lifecycle::create).await?;
        let call_id = call.id.clone();

        let audio_path = self.store_audio(&call, audio).await?;
        call.audio_filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.save(&call).await?;

        let transcript = match self.transcriber.transcribe(&audio_path).await {
            Ok(text) => text,
            Err(e) => {
                error!("Transcription failed for call {}: {:#}", call_id, e);
                self.end(&call_id).await?;
                return Err(ProcessError::Transcription {
                    call_id,
                    reason: format!("{:#}", e),
                });
            }
        };

        self.analyze(&mut call, &transcript);
        self.save(&call).await?;

        {
            let id = call_id.clone();
            db::with_connection(&self.db_path, move |conn| lifecycle::mark_connected(conn, &id))
                .await?;
        }

        let mut conversation = self.sessions.fresh();
        let response = conversation.respond(self.chat.as_ref(), &transcript).await;

        self.end(&call_id).await?;
        info!(
            "Call {} processed: {} ({:.2})",
            call_id,
            call.outcome.as_str(),
            call.sentiment
        );

        Ok(ProcessedCall {
            call_id,
            transcript,
            response,
        })
    }

    /// One agent turn in the conversation keyed by `session_id`. Only an
    /// empty string is rejected; whitespace is passed to the agent as typed.
    pub async fn process_text(&self, text: &str, session_id: Option<&str>) -> TextReply {
        if text.is_empty() {
            return TextReply {
                response: EMPTY_TEXT_REPLY.to_string(),
                session_id: None,
            };
        }

        let (session_id, conversation) = self.sessions.session(session_id).await;
        let response = conversation
            .lock()
            .await
            .respond(self.chat.as_ref(), text)
            .await;

        TextReply {
            response,
            session_id: Some(session_id),
        }
    }

    /// Fills transcript, customer details, entities and classification.
    fn analyze(&self, call: &mut CallRecord, transcript: &str) {
        let info = self.extractor.extract(transcript);
        let classification = classify_text(self.scorer.as_ref(), transcript);

        call.transcript = transcript.to_string();
        call.entities = info.to_entities();
        call.customer = info.name;
        call.phone = info.phone;
        call.outcome = classification.outcome;
        call.sentiment = classification.sentiment;
    }

    async fn store_audio(&self, call: &CallRecord, audio: &[u8]) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.recording_dir)
            .await
            .with_context(|| format!("Failed to create recording dir {:?}", self.recording_dir))?;

        let path = self.recording_dir.join(audio_filename(&call.id));
        tokio::fs::write(&path, audio)
            .await
            .with_context(|| format!("Failed to write audio file {:?}", path))?;

        info!("Stored audio for call {} at {:?}", call.id, path);
        Ok(path)
    }

    async fn save(&self, call: &CallRecord) -> anyhow::Result<()> {
        let call = call.clone();
        db::with_connection(&self.db_path, move |conn| {
            CallRepository::update(conn, &call).map(|_| ())
        })
        .await
    }

    async fn end(&self, call_id: &str) -> anyhow::Result<()> {
        let id = call_id.to_string();
        db::with_connection(&self.db_path, move |conn| {
            lifecycle::end(conn, &id, None).map(|_| ())
        })
        .await
    }
}

/// `<YYYYmmddHHMMSS>-<first 8 chars of id>.webm`
pub fn audio_filename(call_id: &str) -> String {
    let prefix: String = call_id.chars().take(8).collect();
    format!("{}-{}.webm", Local::now().format("%Y%m%d%H%M%S"), prefix)
}
