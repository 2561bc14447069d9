use crate::agent::{ChatProvider, ConversationStore, OpenAIChatProvider};
use crate::analysis::{CustomerInfoExtractor, VaderScorer};
use crate::api::{ApiServer, AppState};
use crate::config::Config;
use crate::db;
use crate::processing::CallProcessor;
use crate::transcription::Transcriber;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub async fn run_service() -> Result<()> {
    info!("Starting calldesk service");

    let config = Config::load()?;
    let processor = build_processor(&config)?;

    // Create the schema up front so a bad database path fails at startup
    db::init_db(processor.db_path())?;
    info!("Call records stored in {:?}", processor.db_path());
    info!("Recordings stored in {:?}", processor.recording_dir());

    let server = ApiServer::new(config.bind_address(), AppState::new(processor));

    info!("calldesk is ready!");
    info!(
        "Try: curl -F audio_data=@call.webm http://{}/process",
        config.bind_address()
    );

    server.start().await
}

pub fn build_processor(config: &Config) -> Result<CallProcessor> {
    let timeout = config.request_timeout();

    let transcriber = Transcriber::from_config(&config.transcription, timeout)
        .context("Transcription is not configured (set OPENAI_API_KEY or transcription.api_key)")?;

    let chat: Arc<dyn ChatProvider> = Arc::new(
        OpenAIChatProvider::new(
            config.agent.api_key.clone(),
            config.agent.api_endpoint.clone(),
            config.agent.model.clone(),
            timeout,
        )
        .context("Agent is not configured (set OPENAI_API_KEY or agent.api_key)")?,
    );

    Ok(CallProcessor::new(
        config.database_path()?,
        config.recording_dir()?,
        transcriber,
        chat,
        Arc::new(VaderScorer::new()),
        CustomerInfoExtractor::new()?,
        ConversationStore::new(config.agent.system_prompt.clone(), config.agent.max_sessions),
    ))
}
