use async_trait::async_trait;

use crate::error::Result;

/// Trait for visual-generation providers.
///
/// No hosted provider is wired up yet; the pipeline runs against a
/// placeholder implementation in the meantime. Implementations return
/// encoded video/image bytes and must use the same error taxonomy as
/// speech synthesis so the caller's retry policy carries over.
#[async_trait]
pub trait VisualProvider: Send + Sync {
    /// Render a visual asset matching the given script text.
    ///
    /// `duration_hint_sec` is the narration's estimated length, used to
    /// size generated footage.
    async fn render(&self, script_text: &str, duration_hint_sec: Option<u32>) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
