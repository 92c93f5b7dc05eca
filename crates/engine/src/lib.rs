//! Scrawl engine: bandit, tournaments, progression, consumables, drawings
//!
//! The domain half of the system. Every service here is a stateless facade
//! over the shared KV store; cloning a service clones a handle, all state
//! lives in storage. Concurrency is handled with lease locks and monotone
//! writes rather than transactions.
//!
//! External collaborators (identity, content, media, realtime) are traits
//! in [`platform`]; tests wire the mocks from [`platform::mock`].

pub mod bandit;
pub mod config;
pub mod drawings;
pub mod effects;
pub mod platform;
pub mod progression;
pub mod tournament;

pub use bandit::{Bandit, Slate, SlateConfig};
pub use config::EngineConfig;
pub use drawings::{Drawings, GuessOutcome};
pub use effects::{ActiveEffect, Effects};
pub use platform::{CachedIdentity, Content, Identity, Media, MediaAsset, Realtime, UserInfo};
pub use progression::{level_for_score, LeaderboardRow, LevelDef, Progression, LEVELS};
pub use tournament::{PayoutStatus, TickOutcome, TournamentService, VoteOutcome};
