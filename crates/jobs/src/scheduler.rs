//! Scheduler client trait and the recording test double

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use scrawl_core::{JobId, Result, Timestamp};
use serde_json::Value;

use crate::names::JobName;

/// A job to enqueue: name, JSON payload, and optional due time
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    /// Which handler should run
    pub name: JobName,
    /// JSON payload handed to the handler
    pub data: Value,
    /// Wall-clock due time; absent means "as soon as possible"
    pub run_at: Option<Timestamp>,
}

impl JobRequest {
    /// A job due as soon as possible
    pub fn immediate(name: JobName, data: Value) -> Self {
        Self {
            name,
            data,
            run_at: None,
        }
    }

    /// A job due at a wall-clock instant
    pub fn at(name: JobName, data: Value, run_at: Timestamp) -> Self {
        Self {
            name,
            data,
            run_at: Some(run_at),
        }
    }
}

/// Accepts jobs for later execution
///
/// Implementations return a non-empty opaque id for every accepted job.
/// There is no at-most-once guarantee; handlers are idempotent.
pub trait Scheduler: Send + Sync {
    /// Enqueue a job. Returns its opaque id.
    fn run_job(&self, request: JobRequest) -> Result<JobId>;
}

/// Test double that records every accepted job without running anything
#[derive(Default)]
pub struct RecordingScheduler {
    accepted: Mutex<Vec<JobRequest>>,
    counter: AtomicU64,
}

impl RecordingScheduler {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every accepted job, in acceptance order
    pub fn jobs(&self) -> Vec<JobRequest> {
        self.accepted.lock().clone()
    }

    /// Accepted jobs with the given name
    pub fn jobs_named(&self, name: JobName) -> Vec<JobRequest> {
        self.accepted
            .lock()
            .iter()
            .filter(|j| j.name == name)
            .cloned()
            .collect()
    }

    /// Drain the recorded jobs
    pub fn take(&self) -> Vec<JobRequest> {
        std::mem::take(&mut *self.accepted.lock())
    }
}

impl Scheduler for RecordingScheduler {
    fn run_job(&self, request: JobRequest) -> Result<JobId> {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        self.accepted.lock().push(request);
        Ok(JobId::new(format!("recorded-{}", n)))
    }
}
