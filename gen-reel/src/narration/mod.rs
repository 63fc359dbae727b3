//! Narration synthesis: script text to a published audio artifact.

use provider_client::{SpeechProvider, VoiceConfig};
use std::path::Path;
use std::sync::Arc;

use crate::error::UnitFailure;
use crate::job::types::{Artifact, ArtifactKind};
use crate::job::persistence::publish_atomic;
use crate::retry::{with_retry, RetryPolicy};

/// Synthesizes narration audio for units via a speech provider.
///
/// The voice is a per-call input: each job carries its own
/// `VoiceConfig` in its options.
pub struct NarrationSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    retry: RetryPolicy,
}

impl NarrationSynthesizer {
    pub fn new(provider: Arc<dyn SpeechProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Synthesize `text` with `voice` and publish the audio to `dest`.
    /// The artifact appears at `dest` only after the full synthesis
    /// succeeded.
    pub async fn synthesize(
        &self,
        text: &str,
        voice: &VoiceConfig,
        dest: &Path,
    ) -> Result<Artifact, UnitFailure> {
        let bytes = with_retry(&self.retry, || self.provider.synthesize(text, voice))
            .await
            .map_err(|err| {
                log::error!(
                    "narration synthesis failed via {}: {err}",
                    self.provider.name()
                );
                UnitFailure::from_provider(&err)
            })?;

        publish_atomic(&bytes, dest).map_err(|err| UnitFailure::storage(&err))?;
        Ok(Artifact::new(dest, ArtifactKind::Audio))
    }
}
