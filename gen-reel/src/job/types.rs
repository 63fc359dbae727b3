//! Job and unit data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::FailureCause;

/// Content kind of a persisted artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Script,
    Audio,
    Visual,
    Video,
}

/// Reference to a persisted file.
///
/// Artifacts are immutable once written: a retry publishes a new file
/// and replaces the reference, it never rewrites bytes in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub path: PathBuf,
    pub kind: ArtifactKind,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, kind: ArtifactKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Per-unit pipeline state. Transitions run strictly forward; `Failed`
/// is an absorbing state reachable from any non-terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "cause", rename_all = "snake_case")]
pub enum UnitState {
    Chunked,
    Scripted,
    Narrated,
    Visualized,
    Ready,
    Failed(FailureCause),
}

impl UnitState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UnitState::Ready | UnitState::Failed(_))
    }

    fn rank(&self) -> u8 {
        match self {
            UnitState::Chunked => 0,
            UnitState::Scripted => 1,
            UnitState::Narrated => 2,
            UnitState::Visualized => 3,
            UnitState::Ready => 4,
            UnitState::Failed(_) => 5,
        }
    }
}

/// One script segment of a job and its derived artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Playback position within the job. Immutable once assigned.
    pub index: usize,
    /// Raw chunk text produced by the chunker
    pub chunk_text: String,
    /// Generated script text (set when the unit reaches Scripted)
    pub script_text: Option<String>,
    /// False when the script stage fell back to the raw chunk text
    pub script_generated: bool,
    pub script: Option<Artifact>,
    pub audio: Option<Artifact>,
    pub visual: Option<Artifact>,
    pub state: UnitState,
}

impl Unit {
    pub fn new(index: usize, chunk_text: String) -> Self {
        Self {
            index,
            chunk_text,
            script_text: None,
            script_generated: false,
            script: None,
            audio: None,
            visual: None,
            state: UnitState::Chunked,
        }
    }

    /// Move to the next state. Transitions only run forward; a regression
    /// indicates an orchestrator bug and is ignored (terminal states in
    /// particular are never overwritten).
    fn advance(&mut self, next: UnitState) {
        if next.rank() > self.state.rank() && !self.state.is_terminal() {
            self.state = next;
        }
    }

    pub fn mark_scripted(&mut self, text: String, generated: bool, artifact: Artifact) {
        self.script_text = Some(text);
        self.script_generated = generated;
        self.script = Some(artifact);
        self.advance(UnitState::Scripted);
    }

    pub fn mark_narrated(&mut self, artifact: Artifact) {
        self.audio = Some(artifact);
        self.advance(UnitState::Narrated);
    }

    pub fn mark_visualized(&mut self, artifact: Artifact) {
        self.visual = Some(artifact);
        self.advance(UnitState::Visualized);
    }

    pub fn mark_ready(&mut self) {
        self.advance(UnitState::Ready);
    }

    pub fn mark_failed(&mut self, cause: FailureCause) {
        if !self.state.is_terminal() {
            self.state = UnitState::Failed(cause);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.state == UnitState::Ready
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, UnitState::Failed(_))
    }
}

/// Job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    PartiallyFailed,
    Failed,
}

/// One end-to-end conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub job_id: String,
    pub status: JobStatus,
    pub units: Vec<Unit>,
    /// Job-level failure cause, when the whole job failed
    pub failure: Option<FailureCause>,
    /// Final video artifact, when assembly succeeded
    pub video: Option<Artifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            units: Vec::new(),
            failure: None,
            video: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Seed one unit per chunk, indexed 0..N-1 in chunk order.
    pub fn seed_units(&mut self, chunks: Vec<String>) {
        self.units = chunks
            .into_iter()
            .enumerate()
            .map(|(index, text)| Unit::new(index, text))
            .collect();
    }

    pub fn unit(&mut self, index: usize) -> Option<&mut Unit> {
        self.units.get_mut(index)
    }

    pub fn ready_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_ready()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.units.iter().filter(|u| u.is_failed()).count()
    }

    pub fn all_terminal(&self) -> bool {
        self.units.iter().all(|u| u.state.is_terminal())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Result handed back to the caller of `process_job`.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub job_id: String,
    pub status: JobStatus,
    pub video: Option<Artifact>,
    pub failure: Option<FailureCause>,
    pub units: Vec<UnitReport>,
}

/// Per-unit diagnostic entry in a `JobResult`.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub index: usize,
    pub state: UnitState,
    pub script_generated: bool,
}

impl JobResult {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            video: job.video.clone(),
            failure: job.failure.clone(),
            units: job
                .units
                .iter()
                .map(|u| UnitReport {
                    index: u.index,
                    state: u.state.clone(),
                    script_generated: u.script_generated,
                })
                .collect(),
        }
    }

    /// Units that fell back to raw chunk text during script generation.
    pub fn ungenerated_units(&self) -> Vec<usize> {
        self.units
            .iter()
            .filter(|u| !matches!(u.state, UnitState::Failed(_)) && !u.script_generated)
            .map(|u| u.index)
            .collect()
    }
}
