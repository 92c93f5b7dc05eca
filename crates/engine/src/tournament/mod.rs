//! Tournament engine
//!
//! A tournament is a post whose comments are drawing entries rated by Elo.
//! The hopper scheduler instantiates tournaments from a FIFO prompt queue;
//! voting moves ratings under a short Elo lease; snapshot payouts award the
//! top slice once per day, enforced by a ledger flag checked inside the
//! payout lock.

pub mod elo;
mod entries;
mod hopper;
mod payout;
mod voting;

pub use entries::EntryMetadata;
pub use hopper::TickOutcome;
pub use payout::PayoutStatus;
pub use voting::VoteOutcome;

use std::sync::Arc;

use scrawl_core::Clock;
use scrawl_jobs::Scheduler;
use scrawl_store::StoreHandle;

use crate::config::EngineConfig;
use crate::platform::{Content, Media};
use crate::progression::Progression;

/// Per-community tournament service
#[derive(Clone)]
pub struct TournamentService {
    pub(crate) kv: StoreHandle,
    pub(crate) community: String,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) content: Arc<dyn Content>,
    pub(crate) media: Arc<dyn Media>,
    pub(crate) progression: Progression,
    pub(crate) config: Arc<EngineConfig>,
}

impl TournamentService {
    /// Wire a tournament service for one community
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kv: StoreHandle,
        community: impl Into<String>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        content: Arc<dyn Content>,
        media: Arc<dyn Media>,
        progression: Progression,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            kv,
            community: community.into(),
            clock,
            scheduler,
            content,
            media,
            progression,
            config,
        }
    }

    /// The community this service belongs to
    pub fn community(&self) -> &str {
        &self.community
    }
}
