//! DeepSeek text-generation provider
//!
//! Direct HTTP implementation for the DeepSeek chat completions API
//! (OpenAI-compatible request/response shape).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::text_gen::{TextGenProvider, TextGenRequest, TextGenResponse};

const DEEPSEEK_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";

/// Provider for direct DeepSeek API calls
pub struct DeepSeekProvider {
    model: String,
    api_key: String,
    client: Client,
}

impl DeepSeekProvider {
    /// Create a new DeepSeek provider
    pub fn new(model: &str, api_key: String) -> Self {
        Self {
            model: model.to_string(),
            api_key,
            client: Client::new(),
        }
    }
}

// DeepSeek API request/response types

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Parse a Retry-After header value (seconds form only).
fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl TextGenProvider for DeepSeekProvider {
    async fn complete(&self, request: TextGenRequest) -> Result<TextGenResponse> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system_prompt {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.prompt.clone(),
        });

        let api_request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        log::debug!(
            "requesting completion from {} ({} prompt chars)",
            self.model,
            request.prompt.len()
        );

        let response = self
            .client
            .post(DEEPSEEK_API_URL)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::ApiError {
                        message: format!("Request failed: {}", e),
                        status_code: None,
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(&response);
            let error_text = response.text().await.unwrap_or_default();
            let message =
                if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_text) {
                    error_response.error.message
                } else {
                    error_text
                };
            log::warn!("DeepSeek request failed with HTTP {status}: {message}");
            return Err(ProviderError::from_status(
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        let api_response: ChatResponse =
            response.json().await.map_err(|e| ProviderError::ApiError {
                message: format!("Failed to parse response: {}", e),
                status_code: None,
            })?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();

        Ok(TextGenResponse {
            content,
            model: self.model.clone(),
        })
    }

    fn name(&self) -> &'static str {
        "DeepSeek API"
    }
}
