//! Job-scoped storage layout and state persistence.
//!
//! Each job owns a directory under the store root:
//!
//! ```text
//! <root>/<job_id>/
//!   job.json
//!   scripts/unit_0000.txt
//!   audio/unit_0000.mp3
//!   video/unit_0000.mp4
//!   video/final.mp4
//! ```

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::job::types::Job;

/// Filesystem layout for job state and artifacts.
#[derive(Debug, Clone)]
pub struct JobStore {
    root: PathBuf,
}

impl JobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default store location under the platform data directory.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("gen-reel")
            .join("jobs")
    }

    pub fn job_dir(&self, job_id: &str) -> PathBuf {
        self.root.join(job_id)
    }

    /// Create the per-job directory tree.
    pub fn ensure_layout(&self, job_id: &str) -> Result<()> {
        let dir = self.job_dir(job_id);
        fs::create_dir_all(dir.join("scripts"))?;
        fs::create_dir_all(dir.join("audio"))?;
        fs::create_dir_all(dir.join("video"))?;
        Ok(())
    }

    pub fn script_path(&self, job_id: &str, index: usize) -> PathBuf {
        self.job_dir(job_id)
            .join("scripts")
            .join(format!("unit_{index:04}.txt"))
    }

    pub fn audio_path(&self, job_id: &str, index: usize) -> PathBuf {
        self.job_dir(job_id)
            .join("audio")
            .join(format!("unit_{index:04}.mp3"))
    }

    pub fn visual_path(&self, job_id: &str, index: usize) -> PathBuf {
        self.job_dir(job_id)
            .join("video")
            .join(format!("unit_{index:04}.mp4"))
    }

    pub fn video_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join("video").join("final.mp4")
    }

    fn state_path(&self, job_id: &str) -> PathBuf {
        self.job_dir(job_id).join("job.json")
    }

    /// Persist job state as pretty-printed JSON, refreshing `updated_at`.
    pub fn save(&self, job: &mut Job) -> Result<()> {
        job.touch();
        let path = self.state_path(&job.job_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, job)?;
        writer.flush()?;
        Ok(())
    }

    pub fn load(&self, job_id: &str) -> Result<Job> {
        let file = File::open(self.state_path(job_id))?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Write bytes to `dest` atomically: a temp file in the same directory
/// is written in full, then renamed over the destination. A partially
/// written artifact is never visible at `dest`.
pub fn publish_atomic(bytes: &[u8], dest: &Path) -> std::io::Result<()> {
    let parent = dest.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}
