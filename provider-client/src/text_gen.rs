use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a text-generation provider
#[derive(Debug, Clone)]
pub struct TextGenRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Response from a text-generation provider
#[derive(Debug, Clone)]
pub struct TextGenResponse {
    pub content: String,
    pub model: String,
}

/// Trait for text-generation providers
#[async_trait]
pub trait TextGenProvider: Send + Sync {
    /// Execute a completion request
    async fn complete(&self, request: TextGenRequest) -> Result<TextGenResponse>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
