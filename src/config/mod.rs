use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Environment variable consulted when no API key is configured.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub transcription: TranscriptionConfig,
    pub agent: AgentConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the default `<data_dir>/calldesk/calls.db`
    pub database_path: Option<String>,
    /// Overrides the default `<data_dir>/calldesk/recording`
    pub recording_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub provider: Option<String>,
    pub model: Option<String>,
    /// ISO-639-1 code sent to the speech API; unset means auto-detect
    pub language: Option<String>,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub model: String,
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    pub system_prompt: String,
    /// Chat sessions kept for `/process_text` before the least recent is dropped
    pub max_sessions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Timeout applied to every outbound request to the speech and chat APIs
    pub request_timeout_seconds: u64,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a professional AI telecalling agent representing \
Bajaj Finance Limited. Greet the customer politely, introduce the loan and credit offers briefly, \
answer questions clearly and honestly, and keep every reply short enough to be spoken aloud. \
If the customer is not interested, thank them for their time and end the conversation courteously.";

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            provider: Some("openai-api".to_string()),
            model: Some("whisper-1".to_string()),
            language: None,
            api_endpoint: None,
            api_key: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_endpoint: None,
            api_key: None,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_sessions: 1000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 120,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save()?;
            return Ok(config.with_env_fallbacks());
        }

        let content =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config = Self::parse(&content)?;

        info!("Loaded config from {:?}", config_path);
        Ok(config.with_env_fallbacks())
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Fills missing API keys from `OPENAI_API_KEY`. The environment value is
    /// never written back to disk.
    pub fn with_env_fallbacks(self) -> Self {
        let env_key = std::env::var(OPENAI_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        self.with_fallback_api_key(env_key)
    }

    pub fn with_fallback_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key {
            if self.transcription.api_key.is_none() {
                self.transcription.api_key = Some(key.clone());
            }
            if self.agent.api_key.is_none() {
                self.agent.api_key = Some(key);
            }
        }
        self
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => global::db_file(),
        }
    }

    pub fn recording_dir(&self) -> Result<PathBuf> {
        match &self.storage.recording_dir {
            Some(path) => Ok(PathBuf::from(path)),
            None => global::recordings_dir(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_seconds.max(1))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
