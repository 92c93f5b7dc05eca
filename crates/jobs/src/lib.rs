//! Scheduler client and in-process job queue
//!
//! Long-running work is offloaded through the [`Scheduler`] trait as opaque
//! jobs with a name, a JSON payload, and a wall-clock due time. Delivery is
//! at-least-once: handlers must be idempotent via locks and ledgers, never
//! by assuming single delivery.
//!
//! [`JobQueue`] is the in-process implementation: a due-time-ordered heap
//! drained by `tick()`, either called directly (tests, embedding runtimes)
//! or from a polling worker thread. Handlers get a [`Deadline`] well inside
//! the ~60 s slot a job is allowed; work that remains at the deadline is
//! re-enqueued as a follow-up job, not finished in place.

mod deadline;
mod names;
mod payload;
mod queue;
mod scheduler;

pub use deadline::{Deadline, JOB_TIME_BUDGET};
pub use names::JobName;
pub use payload::{
    AggregatorPayload, FlairPayload, LevelUpPayload, PayoutPayload, PinnedCommentPayload,
    SchedulerTickPayload,
};
pub use queue::{JobContext, JobQueue, QueueStats, WorkerHandle};
pub use scheduler::{JobRequest, RecordingScheduler, Scheduler};
