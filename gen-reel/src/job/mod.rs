//! Job model, persistence, and in-process registry.

pub mod persistence;
pub mod registry;
pub mod types;

pub use persistence::{publish_atomic, JobStore};
pub use registry::JobRegistry;
pub use types::JobResult;

use std::sync::atomic::{AtomicU64, Ordering};

static JOB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a job identifier unique within and across process runs.
///
/// Timestamp gives cross-run uniqueness, the counter disambiguates jobs
/// created within the same second.
pub fn next_job_id() -> String {
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let seq = JOB_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("job_{stamp}_{seq:03}")
}
