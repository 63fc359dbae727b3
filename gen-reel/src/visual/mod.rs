//! Visual track generation for units.

pub mod placeholder;

pub use placeholder::PlaceholderVisual;

use provider_client::VisualProvider;
use std::path::Path;
use std::sync::Arc;

use crate::error::UnitFailure;
use crate::job::persistence::publish_atomic;
use crate::job::types::{Artifact, ArtifactKind};
use crate::retry::{with_retry, RetryPolicy};

/// Produces a video asset for each unit via a visual provider.
pub struct VisualStage {
    provider: Arc<dyn VisualProvider>,
    retry: RetryPolicy,
}

impl VisualStage {
    pub fn new(provider: Arc<dyn VisualProvider>) -> Self {
        Self {
            provider,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Render a visual for the script and publish it to `dest`.
    pub async fn render(
        &self,
        script_text: &str,
        duration_hint_sec: Option<u32>,
        dest: &Path,
    ) -> Result<Artifact, UnitFailure> {
        let bytes = with_retry(&self.retry, || {
            self.provider.render(script_text, duration_hint_sec)
        })
        .await
        .map_err(|err| {
            log::error!("visual render failed via {}: {err}", self.provider.name());
            UnitFailure::from_provider(&err)
        })?;

        publish_atomic(&bytes, dest).map_err(|err| UnitFailure::storage(&err))?;
        Ok(Artifact::new(dest, ArtifactKind::Visual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureCause;
    use provider_client::{MockVisual, ProviderError};
    use std::time::Duration;
    use tempfile::TempDir;

    fn instant_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn test_publishes_visual_artifact() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("unit_0000.mp4");
        let stage = VisualStage::new(Arc::new(MockVisual::always_succeeds(b"mp4 bytes")));

        let artifact = stage.render("A script.", Some(45), &dest).await.unwrap();
        assert_eq!(artifact.kind, ArtifactKind::Visual);
        assert_eq!(std::fs::read(&dest).unwrap(), b"mp4 bytes");
    }

    #[tokio::test]
    async fn test_failure_maps_to_unit_failure() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("unit_0000.mp4");
        let provider = Arc::new(MockVisual::always_fails(ProviderError::ServerOverloaded {
            message: "busy".into(),
        }));
        let stage = VisualStage::new(provider.clone()).with_retry(instant_retry());

        let failure = stage.render("A script.", None, &dest).await.unwrap_err();
        assert!(matches!(failure.cause, FailureCause::TransientProvider(_)));
        assert_eq!(provider.call_count(), 3);
        assert!(!dest.exists());
    }
}
