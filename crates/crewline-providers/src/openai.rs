//! OpenAI-compatible chat-completions generator.

use async_trait::async_trait;
use crewline_core::{CapabilityError, GenerationRequest, Generator};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::http;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
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

/// Generator backed by `POST {base_url}/chat/completions`.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            client: http::build_client(config.http_timeout())?,
            endpoint: format!("{}/chat/completions", config.openai_base_url),
            api_key: config.openai_api_key.clone(),
            timeout_secs: config.http_timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<String, CapabilityError> {
        debug!(
            model = %request.model,
            system_chars = request.system.len(),
            user_chars = request.user.len(),
            "Requesting chat completion"
        );

        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error(&e, self.timeout_secs))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| http::transport_error(&e, self.timeout_secs))?;
        if !status.is_success() {
            return Err(http::status_error(status.as_u16(), &text));
        }
        parse_completion(&text)
    }
}

/// Extract the first choice's message content from a response body.
pub fn parse_completion(body: &str) -> std::result::Result<String, CapabilityError> {
    let response: ChatResponse = serde_json::from_str(body).map_err(|e| {
        CapabilityError::MalformedResponse(format!("invalid completion body: {e}"))
    })?;

    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| {
            CapabilityError::MalformedResponse("completion has no choices".to_string())
        })?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(CapabilityError::EmptyOutput);
    }
    Ok(content)
}
