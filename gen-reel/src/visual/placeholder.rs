//! Placeholder visual provider: a solid-color vertical slate rendered
//! locally with ffmpeg, sized to the narration duration.

use async_trait::async_trait;
use provider_client::{ProviderError, VisualProvider};
use tokio::process::Command;

const DEFAULT_DURATION_SEC: u32 = 60;
const SLATE_COLOR: &str = "0x1a1a2e";

/// Local stand-in for a real footage provider.
pub struct PlaceholderVisual;

#[async_trait]
impl VisualProvider for PlaceholderVisual {
    async fn render(
        &self,
        _script_text: &str,
        duration_hint_sec: Option<u32>,
    ) -> provider_client::Result<Vec<u8>> {
        let duration = duration_hint_sec.unwrap_or(DEFAULT_DURATION_SEC).max(1);

        let temp = tempfile::Builder::new().suffix(".mp4").tempfile()?;
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-f")
            .arg("lavfi")
            .arg("-i")
            .arg(format!(
                "color=c={SLATE_COLOR}:s=1080x1920:d={duration}:r=30"
            ))
            .arg("-c:v")
            .arg("libx264")
            .arg("-pix_fmt")
            .arg("yuv420p")
            .arg(temp.path())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::ApiError {
                message: format!("ffmpeg slate render failed: {}", stderr.trim()),
                status_code: None,
            });
        }

        Ok(std::fs::read(temp.path())?)
    }

    fn name(&self) -> &'static str {
        "placeholder-visual"
    }
}
