//! In-process job queue
//!
//! A binary heap ordered by due time (ties broken by insertion sequence)
//! with a handler registry keyed by job name. `tick()` drains everything
//! due at the moment it is called; jobs a handler enqueues during a tick
//! wait for the next one, so a self-scheduling job chain cannot spin a
//! single tick forever.
//!
//! Handler failures are logged and counted, never propagated; a job queue
//! survives its jobs.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use scrawl_core::{Clock, JobId, Result, Timestamp};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::deadline::{Deadline, JOB_TIME_BUDGET};
use crate::names::JobName;
use crate::scheduler::{JobRequest, Scheduler};

/// Everything a handler gets for one job execution
pub struct JobContext {
    /// The job's name
    pub name: JobName,
    /// The job's JSON payload
    pub data: Value,
    /// Wall-clock time the tick started
    pub now: Timestamp,
    /// Scheduler for follow-up jobs (usually the queue itself)
    pub scheduler: Arc<dyn Scheduler>,
    /// Budgeted deadline; check between KV round-trips
    pub deadline: Deadline,
}

type Handler = dyn Fn(&JobContext) -> Result<()> + Send + Sync;

struct ScheduledJob {
    run_at: Timestamp,
    sequence: u64,
    name: JobName,
    data: Value,
}

impl Eq for ScheduledJob {}

impl PartialEq for ScheduledJob {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at && self.sequence == other.sequence
    }
}

// Earliest due time first, then insertion order; reversed because
// BinaryHeap is a max-heap.
impl Ord for ScheduledJob {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .run_at
            .cmp(&self.run_at)
            .then(other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledJob {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Queue metrics snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Jobs waiting for their due time
    pub pending: usize,
    /// Handler runs that returned Ok
    pub completed: u64,
    /// Handler runs that returned Err, plus jobs with no handler
    pub failed: u64,
}

/// Due-time-ordered in-process job queue
pub struct JobQueue {
    // weak self-reference so handlers can re-enqueue through the trait
    self_ref: Weak<JobQueue>,
    clock: Arc<dyn Clock>,
    heap: Mutex<BinaryHeap<ScheduledJob>>,
    handlers: RwLock<FxHashMap<JobName, Arc<Handler>>>,
    sequence: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

impl JobQueue {
    /// Create a queue reading time from the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            self_ref: weak.clone(),
            clock,
            heap: Mutex::new(BinaryHeap::new()),
            handlers: RwLock::new(FxHashMap::default()),
            sequence: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        })
    }

    /// Register the handler for a job name, replacing any previous one
    pub fn register<F>(&self, name: JobName, handler: F)
    where
        F: Fn(&JobContext) -> Result<()> + Send + Sync + 'static,
    {
        self.handlers.write().insert(name, Arc::new(handler));
    }

    /// Run every job due now. Returns how many handlers were invoked.
    ///
    /// Jobs enqueued by handlers during this tick run on a later tick even
    /// when already due.
    pub fn tick(&self) -> usize {
        let now = self.clock.now();
        let mut due = Vec::new();
        {
            let mut heap = self.heap.lock();
            while let Some(top) = heap.peek() {
                if top.run_at > now {
                    break;
                }
                due.push(heap.pop().expect("peeked job must pop"));
            }
        }

        let queue = self
            .self_ref
            .upgrade()
            .expect("job queue ticked while being dropped");
        for job in &due {
            let handler = self.handlers.read().get(&job.name).cloned();
            match handler {
                Some(handler) => {
                    let ctx = JobContext {
                        name: job.name,
                        data: job.data.clone(),
                        now,
                        scheduler: queue.clone() as Arc<dyn Scheduler>,
                        deadline: Deadline::after(now, JOB_TIME_BUDGET),
                    };
                    match handler(&ctx) {
                        Ok(()) => {
                            self.completed.fetch_add(1, AtomicOrdering::SeqCst);
                            debug!(job = %job.name, "job completed");
                        }
                        Err(e) => {
                            self.failed.fetch_add(1, AtomicOrdering::SeqCst);
                            error!(job = %job.name, error = %e, "job failed");
                        }
                    }
                }
                None => {
                    self.failed.fetch_add(1, AtomicOrdering::SeqCst);
                    warn!(job = %job.name, "no handler registered, dropping job");
                }
            }
        }
        due.len()
    }

    /// Queue metrics snapshot
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            pending: self.heap.lock().len(),
            completed: self.completed.load(AtomicOrdering::SeqCst),
            failed: self.failed.load(AtomicOrdering::SeqCst),
        }
    }

    /// Spawn a thread that ticks the queue at the given poll interval
    pub fn spawn_worker(&self, poll: Duration) -> WorkerHandle {
        let queue = self
            .self_ref
            .upgrade()
            .expect("worker spawned while queue is being dropped");
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let handle = std::thread::Builder::new()
            .name("scrawl-jobs".to_string())
            .spawn(move || {
                while !stop.load(AtomicOrdering::SeqCst) {
                    queue.tick();
                    std::thread::sleep(poll);
                }
            })
            .expect("failed to spawn job worker thread");
        WorkerHandle {
            shutdown,
            handle: Some(handle),
        }
    }
}

impl Scheduler for JobQueue {
    fn run_job(&self, request: JobRequest) -> Result<JobId> {
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
        let run_at = request.run_at.unwrap_or_else(|| self.clock.now());
        self.heap.lock().push(ScheduledJob {
            run_at,
            sequence,
            name: request.name,
            data: request.data,
        });
        Ok(JobId::new(format!("job-{}", sequence)))
    }
}

/// Stops and joins the polling worker on drop
pub struct WorkerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Signal the worker to stop and wait for it
    pub fn stop(mut self) {
        self.shutdown.store(true, AtomicOrdering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, AtomicOrdering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::ManualClock;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn queue() -> (Arc<ManualClock>, Arc<JobQueue>) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(0)));
        let queue = JobQueue::new(clock.clone());
        (clock, queue)
    }

    #[test]
    fn test_jobs_run_at_due_time_in_order() {
        let (clock, queue) = queue();
        let order = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&order);
        queue.register(JobName::TournamentPayout, move |ctx| {
            seen.lock().push(ctx.data["dayIndex"].as_u64().unwrap());
            Ok(())
        });

        for (day, at) in [(2u64, 120u64), (1, 60)] {
            queue
                .run_job(JobRequest::at(
                    JobName::TournamentPayout,
                    json!({"dayIndex": day}),
                    Timestamp::from_secs(at),
                ))
                .unwrap();
        }

        assert_eq!(queue.tick(), 0, "nothing due yet");
        clock.set(Timestamp::from_secs(60));
        assert_eq!(queue.tick(), 1);
        clock.set(Timestamp::from_secs(120));
        assert_eq!(queue.tick(), 1);
        assert_eq!(*order.lock(), vec![1, 2]);
    }

    #[test]
    fn test_same_due_time_runs_in_insertion_order() {
        let (clock, queue) = queue();
        let order = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&order);
        queue.register(JobName::UserLevelUp, move |ctx| {
            seen.lock().push(ctx.data["n"].as_u64().unwrap());
            Ok(())
        });
        for n in 0..4u64 {
            queue
                .run_job(JobRequest::immediate(JobName::UserLevelUp, json!({ "n": n })))
                .unwrap();
        }
        clock.advance(Duration::from_secs(1));
        queue.tick();
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_handler_enqueued_jobs_wait_for_next_tick() {
        let (_, queue) = queue();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        queue.register(JobName::SlateAggregator, move |ctx| {
            counter.fetch_add(1, AtomicOrdering::SeqCst);
            // recursive chaining: enqueue the continuation immediately
            ctx.scheduler.run_job(JobRequest::immediate(
                JobName::SlateAggregator,
                json!({"isInitialJob": false}),
            ))?;
            Ok(())
        });
        queue
            .run_job(JobRequest::immediate(JobName::SlateAggregator, json!({})))
            .unwrap();
        assert_eq!(queue.tick(), 1, "one run per tick despite self-scheduling");
        assert_eq!(queue.tick(), 1);
        assert_eq!(runs.load(AtomicOrdering::SeqCst), 2);
    }

    #[test]
    fn test_failures_are_counted_not_propagated() {
        let (_, queue) = queue();
        queue.register(JobName::SetUserFlair, |_| {
            Err(scrawl_core::Error::Transient("flair service down".into()))
        });
        queue
            .run_job(JobRequest::immediate(JobName::SetUserFlair, json!({})))
            .unwrap();
        // no handler at all
        queue
            .run_job(JobRequest::immediate(JobName::UpdatePinnedComment, json!({})))
            .unwrap();
        queue.tick();
        let stats = queue.stats();
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending, 0);
    }
}
