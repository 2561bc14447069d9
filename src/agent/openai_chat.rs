use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{AgentError, ChatMessage, ChatProvider};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Chat completions over the OpenAI HTTP API.
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl OpenAIChatProvider {
    pub fn new(
        api_key: Option<String>,
        endpoint: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AgentError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AgentError::NotConfigured("api_key is required".to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let model = model.into();

        info!(
            "Initialized OpenAI chat provider with endpoint: {} (model {})",
            endpoint, model
        );

        Ok(Self {
            client,
            api_key,
            endpoint,
            model,
        })
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatProvider for OpenAIChatProvider {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, AgentError> {
        let request = ChatRequest {
            model: &self.model,
            messages,
        };

        debug!("Sending {} messages to {}", messages.len(), self.chat_url());

        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(
                "OpenAI chat request failed with status {}: {}",
                status, body
            );
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AgentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AgentError::InvalidResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AgentError::InvalidResponse("response has no content".to_string()))
    }

    fn name(&self) -> &'static str {
        "OpenAI Chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(endpoint: Option<&str>) -> OpenAIChatProvider {
        OpenAIChatProvider::new(
            Some("sk-test".to_string()),
            endpoint.map(str::to_string),
            "gpt-4o-mini",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_chat_url() {
        assert_eq!(
            provider(None).chat_url(),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            provider(Some("http://localhost:8080/v1/")).chat_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let result = OpenAIChatProvider::new(None, None, "gpt-4o-mini", Duration::from_secs(5));
        assert!(matches!(result, Err(AgentError::NotConfigured(_))));
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![ChatMessage::system("prompt"), ChatMessage::user("Hello")];
        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "Hello");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Namaste!"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Namaste!"));
    }
}
