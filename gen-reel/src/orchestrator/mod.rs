//! End-to-end job orchestration.
//!
//! One task per unit, capped by a semaphore around provider calls.
//! Unit tasks report progress over a channel; the single event loop
//! below is the only writer of job state, so no unit update is ever
//! lost to a concurrent write.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use provider_client::VoiceConfig;

use crate::assembly::{TimelineEntry, VideoAssembler};
use crate::error::{FailureCause, PipelineError, Result, UnitFailure};
use crate::job::registry::CancelHandle;
use crate::job::types::{Job, JobResult, JobStatus, Unit, UnitState};
use crate::job::{next_job_id, JobRegistry, JobStore};
use crate::narration::NarrationSynthesizer;
use crate::script::ScriptGenerator;
use crate::text::{chunk, clean_text, ChunkConstraints};
use crate::visual::VisualStage;

/// Per-job processing options.
#[derive(Debug, Clone)]
pub struct JobOptions {
    pub min_words_per_chunk: usize,
    pub max_words_per_chunk: usize,
    pub max_chunks: usize,
    pub voice: VoiceConfig,
    /// Assemble the units that succeeded when some failed
    pub allow_partial_output: bool,
    /// Cap on concurrent provider calls across the job's units
    pub max_concurrent_calls: usize,
}

impl Default for JobOptions {
    fn default() -> Self {
        let constraints = ChunkConstraints::default();
        Self {
            min_words_per_chunk: constraints.min_words,
            max_words_per_chunk: constraints.max_words,
            max_chunks: constraints.max_chunks,
            voice: VoiceConfig::new("21m00Tcm4TlvDq8ikWAM", "eleven_multilingual_v2"),
            allow_partial_output: false,
            max_concurrent_calls: 4,
        }
    }
}

impl JobOptions {
    fn constraints(&self) -> ChunkConstraints {
        ChunkConstraints {
            min_words: self.min_words_per_chunk,
            max_words: self.max_words_per_chunk,
            max_chunks: self.max_chunks,
        }
    }
}

/// State transition reported by a unit task.
#[derive(Debug)]
enum UnitEvent {
    Scripted {
        index: usize,
        text: String,
        generated: bool,
        artifact: crate::job::types::Artifact,
    },
    Narrated {
        index: usize,
        artifact: crate::job::types::Artifact,
    },
    Visualized {
        index: usize,
        artifact: crate::job::types::Artifact,
    },
    Ready {
        index: usize,
    },
    Failed {
        index: usize,
        cause: FailureCause,
        job_fatal: bool,
    },
}

/// Progress snapshot handed to the caller after each unit event.
#[derive(Debug, Clone)]
pub struct JobProgress {
    pub job_id: String,
    pub total_units: usize,
    pub terminal_units: usize,
    pub ready_units: usize,
    pub failed_units: usize,
}

/// The per-unit stages, shared across unit tasks.
struct UnitStages {
    script: ScriptGenerator,
    narration: NarrationSynthesizer,
    visual: VisualStage,
    store: JobStore,
}

/// The orchestrator: owns the stages, assembler, store, and registry.
pub struct Pipeline {
    stages: Arc<UnitStages>,
    assembler: Arc<dyn VideoAssembler>,
    store: JobStore,
    registry: Arc<JobRegistry>,
}

impl Pipeline {
    pub fn new(
        script: ScriptGenerator,
        narration: NarrationSynthesizer,
        visual: VisualStage,
        assembler: Arc<dyn VideoAssembler>,
        store: JobStore,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            stages: Arc::new(UnitStages {
                script,
                narration,
                visual,
                store: store.clone(),
            }),
            assembler,
            store,
            registry,
        }
    }

    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run a job to completion. Returns `Err` only for malformed input
    /// or a persistence/invariant failure; provider trouble lands in
    /// the returned `JobResult` instead.
    pub async fn process_job(&self, text: &str, options: &JobOptions) -> Result<JobResult> {
        self.process_job_with_progress(text, options, |_| {}).await
    }

    pub async fn process_job_with_progress<P>(
        &self,
        text: &str,
        options: &JobOptions,
        mut on_progress: P,
    ) -> Result<JobResult>
    where
        P: FnMut(JobProgress),
    {
        // Input validation happens before the job exists: a rejected
        // request leaves no units and no registry entry behind.
        let cleaned = clean_text(text);
        let chunks = chunk(&cleaned, &options.constraints())?;

        let job_id = next_job_id();
        let cancel = self.registry.register(&job_id);

        let mut job = Job::new(&job_id);
        job.seed_units(chunks);
        self.store.ensure_layout(&job_id)?;
        job.status = JobStatus::Running;
        self.store.save(&mut job)?;
        log::info!("job {job_id} started with {} units", job.units.len());

        let semaphore = Arc::new(Semaphore::new(options.max_concurrent_calls.max(1)));
        let (tx, mut rx) = mpsc::unbounded_channel::<UnitEvent>();

        for unit in &job.units {
            tokio::spawn(run_unit(
                Arc::clone(&self.stages),
                unit.index,
                unit.chunk_text.clone(),
                job_id.clone(),
                options.voice.clone(),
                Arc::clone(&semaphore),
                cancel.clone(),
                tx.clone(),
            ));
        }
        drop(tx);

        // Sole writer of job state.
        while let Some(event) = rx.recv().await {
            apply_event(&mut job, event);
            self.store.save(&mut job)?;
            on_progress(JobProgress {
                job_id: job_id.clone(),
                total_units: job.units.len(),
                terminal_units: job.units.iter().filter(|u| u.state.is_terminal()).count(),
                ready_units: job.ready_count(),
                failed_units: job.failed_count(),
            });
        }

        self.finish_job(&mut job, options, &cancel).await?;
        self.store.save(&mut job)?;

        let result = JobResult::from_job(&job);
        self.registry.deposit(result.clone());
        log::info!("job {job_id} finished: {:?}", job.status);
        Ok(result)
    }

    /// Resolve the job outcome once every unit is terminal, running
    /// assembly when the policy allows it.
    async fn finish_job(
        &self,
        job: &mut Job,
        options: &JobOptions,
        cancel: &CancelHandle,
    ) -> Result<()> {
        debug_assert!(job.all_terminal());

        if let Some(cause) = &job.failure {
            // A job-fatal unit failure (bad credentials) was recorded
            // by the event loop; no assembly.
            log::error!("job {} failed: {:?}", job.job_id, cause);
            job.status = JobStatus::Failed;
            return Ok(());
        }

        if cancel.is_cancelled() {
            job.status = JobStatus::Failed;
            job.failure = Some(FailureCause::Cancelled);
            return Ok(());
        }

        let failed = job.failed_count();
        let ready = job.ready_count();

        if failed > 0 && !options.allow_partial_output {
            job.status = JobStatus::Failed;
            job.failure = first_failure(job);
            return Ok(());
        }
        if ready == 0 {
            job.status = JobStatus::Failed;
            job.failure = first_failure(job);
            return Ok(());
        }

        let timeline = build_timeline(&job.units)?;
        let output = self.store.video_path(&job.job_id);
        match self.assembler.assemble(&timeline, &output).await {
            Ok(()) => {
                job.video = Some(crate::job::types::Artifact::new(
                    output,
                    crate::job::types::ArtifactKind::Video,
                ));
                job.status = if failed > 0 {
                    JobStatus::PartiallyFailed
                } else {
                    JobStatus::Completed
                };
            }
            Err(err) => {
                log::error!("assembly failed for job {}: {err:#}", job.job_id);
                job.status = JobStatus::Failed;
                job.failure = Some(FailureCause::Assembly(format!("{err:#}")));
            }
        }
        Ok(())
    }
}

/// First recorded unit failure cause, for the job-level report.
fn first_failure(job: &Job) -> Option<FailureCause> {
    job.units.iter().find_map(|u| match &u.state {
        UnitState::Failed(cause) => Some(cause.clone()),
        _ => None,
    })
}

/// Timeline of Ready units in index order. A Ready unit missing either
/// track is a state-machine bug and propagates as a hard error.
fn build_timeline(units: &[Unit]) -> Result<Vec<TimelineEntry>> {
    let mut timeline = Vec::new();
    for unit in units.iter().filter(|u| u.is_ready()) {
        let audio = unit
            .audio
            .as_ref()
            .ok_or(PipelineError::IncompleteTimeline {
                index: unit.index,
                missing: "audio",
            })?;
        let visual = unit
            .visual
            .as_ref()
            .ok_or(PipelineError::IncompleteTimeline {
                index: unit.index,
                missing: "visual",
            })?;
        timeline.push(TimelineEntry {
            index: unit.index,
            audio: audio.path.clone(),
            visual: visual.path.clone(),
        });
    }
    timeline.sort_by_key(|e| e.index);
    Ok(timeline)
}

fn apply_event(job: &mut Job, event: UnitEvent) {
    match event {
        UnitEvent::Scripted {
            index,
            text,
            generated,
            artifact,
        } => {
            if let Some(unit) = job.unit(index) {
                unit.mark_scripted(text, generated, artifact);
            }
        }
        UnitEvent::Narrated { index, artifact } => {
            if let Some(unit) = job.unit(index) {
                unit.mark_narrated(artifact);
            }
        }
        UnitEvent::Visualized { index, artifact } => {
            if let Some(unit) = job.unit(index) {
                unit.mark_visualized(artifact);
            }
        }
        UnitEvent::Ready { index } => {
            if let Some(unit) = job.unit(index) {
                unit.mark_ready();
            }
        }
        UnitEvent::Failed {
            index,
            cause,
            job_fatal,
        } => {
            if job_fatal && job.failure.is_none() {
                job.failure = Some(cause.clone());
            }
            if let Some(unit) = job.unit(index) {
                unit.mark_failed(cause);
            }
        }
    }
}

/// Drive one unit through script, narration, and visual generation.
///
/// Cancellation is checked after each semaphore acquisition, right
/// before the provider call: a call already in flight finishes, a
/// queued one never starts. The semaphore is held only for the
/// duration of each external call.
#[allow(clippy::too_many_arguments)]
async fn run_unit(
    stages: Arc<UnitStages>,
    index: usize,
    chunk_text: String,
    job_id: String,
    voice: VoiceConfig,
    semaphore: Arc<Semaphore>,
    cancel: CancelHandle,
    tx: mpsc::UnboundedSender<UnitEvent>,
) {
    let fail = |cause: FailureCause, job_fatal: bool| UnitEvent::Failed {
        index,
        cause,
        job_fatal,
    };

    // Script stage: never fails the unit, worst case is raw chunk text.
    let script = {
        let Ok(_permit) = semaphore.acquire().await else {
            return;
        };
        if cancel.is_cancelled() {
            let _ = tx.send(fail(FailureCause::Cancelled, false));
            return;
        }
        stages.script.generate(&chunk_text).await
    };
    let script_path = stages.store.script_path(&job_id, index);
    if let Err(err) = crate::job::publish_atomic(script.text.as_bytes(), &script_path) {
        let failure = UnitFailure::storage(&err);
        let _ = tx.send(fail(failure.cause, failure.job_fatal));
        return;
    }
    let _ = tx.send(UnitEvent::Scripted {
        index,
        text: script.text.clone(),
        generated: script.generated,
        artifact: crate::job::types::Artifact::new(
            script_path,
            crate::job::types::ArtifactKind::Script,
        ),
    });

    // Narration stage.
    let audio_path = stages.store.audio_path(&job_id, index);
    let narrated = {
        let Ok(_permit) = semaphore.acquire().await else {
            return;
        };
        if cancel.is_cancelled() {
            let _ = tx.send(fail(FailureCause::Cancelled, false));
            return;
        }
        stages
            .narration
            .synthesize(&script.text, &voice, &audio_path)
            .await
    };
    match narrated {
        Ok(artifact) => {
            let _ = tx.send(UnitEvent::Narrated { index, artifact });
        }
        Err(failure) => {
            let _ = tx.send(fail(failure.cause, failure.job_fatal));
            return;
        }
    }

    // Visual stage.
    let visual_path = stages.store.visual_path(&job_id, index);
    let rendered = {
        let Ok(_permit) = semaphore.acquire().await else {
            return;
        };
        if cancel.is_cancelled() {
            let _ = tx.send(fail(FailureCause::Cancelled, false));
            return;
        }
        stages
            .visual
            .render(&script.text, script.duration_hint_sec, &visual_path)
            .await
    };
    match rendered {
        Ok(artifact) => {
            let _ = tx.send(UnitEvent::Visualized { index, artifact });
        }
        Err(failure) => {
            let _ = tx.send(fail(failure.cause, failure.job_fatal));
            return;
        }
    }

    let _ = tx.send(UnitEvent::Ready { index });
}
