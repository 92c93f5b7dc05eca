//! Word-selection bandit
//!
//! Every draw session gets a slate of candidate words balancing exploit
//! (drawer score) against explore (uncertainty). Funnel events (served,
//! picked, posted) feed a periodic score recompute that runs under a
//! community lock.

mod config;
mod funnel;
mod scoring;
mod slate;

pub use config::SlateConfig;
pub use funnel::FunnelEvent;
pub use scoring::ScoreUpdate;
pub use slate::{slate_id, Slate, SLATE_TTL};

use std::sync::Arc;

use scrawl_core::Clock;
use scrawl_store::StoreHandle;

/// Per-community bandit service
#[derive(Clone)]
pub struct Bandit {
    pub(crate) kv: StoreHandle,
    pub(crate) community: String,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Bandit {
    /// Create over a community-scoped store handle
    pub fn new(kv: StoreHandle, community: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            kv,
            community: community.into(),
            clock,
        }
    }

    /// The community this bandit serves
    pub fn community(&self) -> &str {
        &self.community
    }
}
