//! # Scrawl
//!
//! Server-side game engine for a community drawing-and-guessing platform:
//! a word-selection bandit, Elo-rated drawing tournaments, player
//! progression, and the lock/cache/job substrate they share through one
//! key-value store.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use scrawl::{Engine, EngineConfig, JobQueue, MemoryStore, SystemClock, UserId};
//! use scrawl_engine::platform::mock::{MockContent, MockIdentity, MockMedia, MockRealtime};
//!
//! let clock = Arc::new(SystemClock);
//! let store = MemoryStore::shared(clock.clone());
//! let queue = JobQueue::new(clock.clone());
//! let engine = Engine::new(
//!     store,
//!     clock,
//!     queue.clone(),
//!     Arc::new(MockIdentity::new()),
//!     Arc::new(MockContent::new()),
//!     Arc::new(MockMedia::new()),
//!     Arc::new(MockRealtime::new()),
//!     EngineConfig::default(),
//! );
//! engine.register_jobs(&queue);
//!
//! let pics = engine.install_community("pics").unwrap();
//! pics.tournaments.set_scheduler_enabled(true).unwrap();
//! pics.tournaments.add_prompt("Meat Loaf").unwrap();
//! let response = engine.handle_command("pics", &UserId::new("t2_mod"), "!words");
//! println!("{:?}", response);
//! ```
//!
//! # Architecture
//!
//! | Crate | Responsibility |
//! |-------|----------------|
//! | `scrawl-core` | ids, timestamps, errors, word normalization, key layout |
//! | `scrawl-store` | KV abstraction: strings, hashes, sorted sets, TTL |
//! | `scrawl-concurrency` | lease locks, sliding-window limits, cached reads |
//! | `scrawl-jobs` | scheduler client, job names/payloads, in-process queue |
//! | `scrawl-dictionary` | per-community word sets with ban lists |
//! | `scrawl-engine` | bandit, tournaments, progression, consumables |
//! | `scrawl-api` | chat commands, structured responses, the [`Engine`] facade |
//!
//! The [`Engine`] struct is the main entry point; everything else is
//! reachable through it. All state lives in the KV store; services are
//! stateless facades and any number of engine instances can share a store.

pub use scrawl_api::*;
