//! In-process job registry and cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::job::types::JobResult;

/// Cooperative cancellation flag for one job.
///
/// Cancellation is checked between pipeline stages; an in-flight
/// provider call is allowed to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

struct JobEntry {
    cancel: CancelHandle,
    result: Option<JobResult>,
}

/// Tracks jobs for the lifetime of the process.
///
/// A job is registered when it enters the pipeline and removed when its
/// result is taken; results are held for exactly one retrieval.
#[derive(Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, JobEntry>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job and hand back its cancellation handle.
    pub fn register(&self, job_id: &str) -> CancelHandle {
        let cancel = CancelHandle::new();
        let mut jobs = self.jobs.lock().unwrap();
        jobs.insert(
            job_id.to_string(),
            JobEntry {
                cancel: cancel.clone(),
                result: None,
            },
        );
        cancel
    }

    /// Request cancellation. Returns false for unknown job ids.
    pub fn cancel(&self, job_id: &str) -> bool {
        let jobs = self.jobs.lock().unwrap();
        match jobs.get(job_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Store a finished job's result for later retrieval.
    pub fn deposit(&self, result: JobResult) {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(entry) = jobs.get_mut(&result.job_id) {
            entry.result = Some(result);
        }
    }

    /// Take a finished job's result, removing the job from the registry.
    /// Returns None while the job is still running or if it was already
    /// taken.
    pub fn take_result(&self, job_id: &str) -> Option<JobResult> {
        let mut jobs = self.jobs.lock().unwrap();
        let has_result = jobs.get(job_id).is_some_and(|e| e.result.is_some());
        if !has_result {
            return None;
        }
        jobs.remove(job_id).and_then(|e| e.result)
    }

    /// Ids of jobs currently registered (running or awaiting retrieval).
    pub fn active_jobs(&self) -> Vec<String> {
        let jobs = self.jobs.lock().unwrap();
        jobs.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::types::JobStatus;

    fn result(job_id: &str) -> JobResult {
        JobResult {
            job_id: job_id.to_string(),
            status: JobStatus::Completed,
            video: None,
            failure: None,
            units: Vec::new(),
        }
    }

    #[test]
    fn test_register_and_cancel() {
        let registry = JobRegistry::new();
        let handle = registry.register("job_a");
        assert!(!handle.is_cancelled());

        assert!(registry.cancel("job_a"));
        assert!(handle.is_cancelled());

        assert!(!registry.cancel("job_unknown"));
    }

    #[test]
    fn test_result_taken_exactly_once() {
        let registry = JobRegistry::new();
        registry.register("job_a");
        assert!(registry.take_result("job_a").is_none());

        registry.deposit(result("job_a"));
        let taken = registry.take_result("job_a");
        assert!(taken.is_some());
        assert_eq!(taken.unwrap().job_id, "job_a");

        assert!(registry.take_result("job_a").is_none());
        assert!(registry.active_jobs().is_empty());
    }

    #[test]
    fn test_active_jobs_lists_registered() {
        let registry = JobRegistry::new();
        registry.register("job_a");
        registry.register("job_b");
        let mut active = registry.active_jobs();
        active.sort();
        assert_eq!(active, vec!["job_a", "job_b"]);
    }
}
