//! Final video assembly: mux each unit's audio and visual tracks, then
//! concatenate the segments in unit order.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// One unit's tracks, in playback order by `index`.
#[derive(Debug, Clone)]
pub struct TimelineEntry {
    pub index: usize,
    pub audio: PathBuf,
    pub visual: PathBuf,
}

/// Produces the final video from an ordered timeline.
#[async_trait]
pub trait VideoAssembler: Send + Sync {
    async fn assemble(&self, timeline: &[TimelineEntry], output: &Path) -> Result<()>;
}

/// ffmpeg-backed assembler. Each entry is muxed into a segment (video
/// re-encoded to H.264, audio to AAC, cut to the shorter track), then
/// the segments are concatenated without re-encoding.
pub struct FfmpegAssembler;

impl FfmpegAssembler {
    async fn mux_segment(entry: &TimelineEntry, segment: &Path) -> Result<()> {
        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(&entry.visual)
            .arg("-i")
            .arg(&entry.audio)
            .arg("-c:v")
            .arg("libx264")
            .arg("-c:a")
            .arg("aac")
            .arg("-map")
            .arg("0:v:0")
            .arg("-map")
            .arg("1:a:0")
            .arg("-shortest")
            .arg(segment)
            .output()
            .await
            .context("failed to spawn ffmpeg for segment mux")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "ffmpeg mux failed for unit {}: {}",
                entry.index,
                stderr.trim()
            );
        }
        Ok(())
    }

    async fn concat_segments(segments: &[PathBuf], list_path: &Path, output: &Path) -> Result<()> {
        let mut list = String::new();
        for segment in segments {
            // Single quotes in paths are escaped per the concat demuxer's
            // quoting rules.
            let escaped = segment.display().to_string().replace('\'', "'\\''");
            list.push_str(&format!("file '{escaped}'\n"));
        }
        std::fs::write(list_path, list).context("failed to write concat list")?;

        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(list_path)
            .arg("-c")
            .arg("copy")
            .arg(output)
            .output()
            .await
            .context("failed to spawn ffmpeg for concat")?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!("ffmpeg concat failed: {}", stderr.trim());
        }
        Ok(())
    }
}

#[async_trait]
impl VideoAssembler for FfmpegAssembler {
    async fn assemble(&self, timeline: &[TimelineEntry], output: &Path) -> Result<()> {
        if timeline.is_empty() {
            bail!("cannot assemble an empty timeline");
        }

        // A single unit muxes straight to the output.
        if timeline.len() == 1 {
            return Self::mux_segment(&timeline[0], output).await;
        }

        let work_dir = tempfile::TempDir::new().context("failed to create assembly work dir")?;
        let mut segments = Vec::with_capacity(timeline.len());
        for entry in timeline {
            let segment = work_dir.path().join(format!("segment_{:04}.mp4", entry.index));
            Self::mux_segment(entry, &segment).await?;
            segments.push(segment);
        }

        let list_path = work_dir.path().join("concat.txt");
        Self::concat_segments(&segments, &list_path, output).await
    }
}

/// Records timelines instead of invoking ffmpeg; writes an empty output
/// file so callers can observe the artifact path.
#[cfg(test)]
pub struct RecordingAssembler {
    pub calls: std::sync::Mutex<Vec<Vec<TimelineEntry>>>,
}

#[cfg(test)]
impl RecordingAssembler {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Unit indices of the timeline passed to the only assemble call.
    pub fn sole_timeline_indices(&self) -> Vec<usize> {
        let calls = self.calls.lock().unwrap();
        assert_eq!(calls.len(), 1, "expected exactly one assemble call");
        calls[0].iter().map(|e| e.index).collect()
    }
}

#[cfg(test)]
#[async_trait]
impl VideoAssembler for RecordingAssembler {
    async fn assemble(&self, timeline: &[TimelineEntry], output: &Path) -> Result<()> {
        self.calls.lock().unwrap().push(timeline.to_vec());
        std::fs::write(output, b"")?;
        Ok(())
    }
}

/// Always-failing assembler for failure-path tests.
#[cfg(test)]
pub struct FailingAssembler;

#[cfg(test)]
#[async_trait]
impl VideoAssembler for FailingAssembler {
    async fn assemble(&self, _timeline: &[TimelineEntry], _output: &Path) -> Result<()> {
        bail!("assembler exploded")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_list_escapes_quotes() {
        let segment = PathBuf::from("/tmp/it's here/segment_0000.mp4");
        let escaped = segment.display().to_string().replace('\'', "'\\''");
        assert_eq!(escaped, "/tmp/it'\\''s here/segment_0000.mp4");
    }

    #[tokio::test]
    async fn test_empty_timeline_rejected() {
        let result = FfmpegAssembler
            .assemble(&[], Path::new("/tmp/out.mp4"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recording_assembler_captures_order() {
        let assembler = RecordingAssembler::new();
        let dir = tempfile::TempDir::new().unwrap();
        let timeline = vec![
            TimelineEntry {
                index: 0,
                audio: dir.path().join("a0.mp3"),
                visual: dir.path().join("v0.mp4"),
            },
            TimelineEntry {
                index: 1,
                audio: dir.path().join("a1.mp3"),
                visual: dir.path().join("v1.mp4"),
            },
        ];
        let output = dir.path().join("final.mp4");
        assembler.assemble(&timeline, &output).await.unwrap();
        assert_eq!(assembler.sole_timeline_indices(), vec![0, 1]);
        assert!(output.exists());
    }
}
