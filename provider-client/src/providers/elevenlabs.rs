//! ElevenLabs speech-synthesis provider
//!
//! Direct HTTP implementation for the ElevenLabs text-to-speech API.
//! Returns MP3 bytes; the caller persists them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{ProviderError, Result};
use crate::speech::{SpeechProvider, VoiceConfig};

const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

const DEFAULT_STABILITY: f32 = 0.5;
const DEFAULT_SIMILARITY_BOOST: f32 = 0.75;
const DEFAULT_STYLE: f32 = 0.8;

/// Provider for direct ElevenLabs API calls
pub struct ElevenLabsProvider {
    api_key: String,
    client: Client,
}

impl ElevenLabsProvider {
    /// Create a new ElevenLabs provider
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest {
    text: String,
    model_id: String,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>> {
        let api_request = SynthesisRequest {
            text: text.to_string(),
            model_id: voice.model_id.clone(),
            voice_settings: VoiceSettings {
                stability: DEFAULT_STABILITY,
                similarity_boost: DEFAULT_SIMILARITY_BOOST,
                style: DEFAULT_STYLE,
                use_speaker_boost: true,
                speed: voice.speaking_rate,
            },
        };

        log::debug!(
            "synthesizing {} chars with voice {}",
            text.len(),
            voice.voice_id
        );

        let url = format!("{}/{}", ELEVENLABS_API_URL, voice.voice_id);
        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
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
                    error_response.detail.message
                } else {
                    error_text
                };
            log::warn!("ElevenLabs request failed with HTTP {status}: {message}");
            return Err(ProviderError::from_status(
                status.as_u16(),
                message,
                retry_after,
            ));
        }

        let bytes = response.bytes().await.map_err(|e| ProviderError::ApiError {
            message: format!("Failed to read audio body: {}", e),
            status_code: None,
        })?;

        Ok(bytes.to_vec())
    }

    fn name(&self) -> &'static str {
        "ElevenLabs API"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = SynthesisRequest {
            text: "Hello world".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
            voice_settings: VoiceSettings {
                stability: DEFAULT_STABILITY,
                similarity_boost: DEFAULT_SIMILARITY_BOOST,
                style: DEFAULT_STYLE,
                use_speaker_boost: true,
                speed: Some(1.1),
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"model_id\":\"eleven_multilingual_v2\""));
        assert!(json.contains("\"use_speaker_boost\":true"));
        assert!(json.contains("\"speed\":1.1"));
    }

    #[test]
    fn test_speed_omitted_without_rate_hint() {
        let request = SynthesisRequest {
            text: "Hi".to_string(),
            model_id: "m".to_string(),
            voice_settings: VoiceSettings {
                stability: DEFAULT_STABILITY,
                similarity_boost: DEFAULT_SIMILARITY_BOOST,
                style: DEFAULT_STYLE,
                use_speaker_boost: true,
                speed: None,
            },
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(!json.contains("speed"));
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.detail.message, "Invalid API key");
    }
}
