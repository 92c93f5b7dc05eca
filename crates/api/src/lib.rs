//! Public API surface of the Scrawl engine
//!
//! [`Engine`] wires the store, clock, scheduler, and platform collaborators
//! into per-community services and registers the background job handlers.
//! Handlers return [`ApiResponse`], a structured `{status, code, message}`
//! result rather than a thrown error, so the hosting runtime can relay it
//! straight to callers.

mod command;
mod engine;
mod response;

pub use command::ChatCommand;
pub use engine::{Community, Engine};
pub use response::{ApiResponse, Status};

// The crates a host application needs to stand the engine up
pub use scrawl_core::{
    Clock, CommentId, Error, JobId, ManualClock, PostId, Result, SystemClock, Timestamp, UserId,
};
pub use scrawl_engine::{EngineConfig, SlateConfig};
pub use scrawl_jobs::{JobName, JobQueue, JobRequest, RecordingScheduler, Scheduler};
pub use scrawl_store::{Kv, MemoryStore, StoreHandle};
