use async_trait::async_trait;

use crate::error::Result;

/// Voice configuration for speech synthesis.
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Voice identity to use
    pub voice_id: String,
    /// Synthesis model / quality tier
    pub model_id: String,
    /// Optional pacing adjustment (0.5-2.0, 1.0 is neutral)
    pub speaking_rate: Option<f32>,
}

impl VoiceConfig {
    pub fn new(voice_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            model_id: model_id.into(),
            speaking_rate: None,
        }
    }

    /// Set the speaking rate hint.
    pub fn with_speaking_rate(mut self, rate: f32) -> Self {
        self.speaking_rate = Some(rate.clamp(0.5, 2.0));
        self
    }
}

/// Trait for speech-synthesis providers.
///
/// Implementations return encoded audio bytes; persisting them is the
/// caller's job so that artifact publication stays atomic.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize narration audio for the given text.
    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_config_builder() {
        let voice = VoiceConfig::new("rachel", "eleven_multilingual_v2").with_speaking_rate(1.1);
        assert_eq!(voice.voice_id, "rachel");
        assert_eq!(voice.model_id, "eleven_multilingual_v2");
        assert_eq!(voice.speaking_rate, Some(1.1));
    }

    #[test]
    fn test_speaking_rate_clamping() {
        let voice = VoiceConfig::new("v", "m").with_speaking_rate(9.0);
        assert_eq!(voice.speaking_rate, Some(2.0));
        let voice = VoiceConfig::new("v", "m").with_speaking_rate(0.0);
        assert_eq!(voice.speaking_rate, Some(0.5));
    }
}
