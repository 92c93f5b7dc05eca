//! Funnel event counters
//!
//! Served → picked → posted, counted per hour window and all-time. Counter
//! hashes carry a 30-day TTL refreshed on every write; all adds are
//! monotone, so replayed events only inflate counts and never corrupt
//! state.

use std::time::Duration;

use rustc_hash::FxHashMap;
use tracing::warn;

use scrawl_core::{keys, Result};
use scrawl_store::Kv;

use crate::bandit::Bandit;

/// TTL refreshed on every counter write
const COUNTER_TTL: Duration = Duration::from_secs(30 * 24 * 3600);

/// A funnel stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunnelEvent {
    /// The word appeared on a slate
    Served,
    /// The drawer chose the word
    Picked,
    /// The drawing was published
    Posted,
}

impl FunnelEvent {
    /// Counter field suffix
    pub fn field(&self) -> &'static str {
        match self {
            FunnelEvent::Served => "served",
            FunnelEvent::Picked => "picked",
            FunnelEvent::Posted => "posted",
        }
    }
}

/// Hourly counts for one word
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HourlyCounts {
    pub served: i64,
    pub picked: i64,
    pub posted: i64,
}

impl Bandit {
    pub(crate) fn bump(&self, word: &str, event: FunnelEvent) -> Result<()> {
        let field = format!("{}:{}", word, event.field());
        for key in [
            keys::words_hourly(&self.community),
            keys::words_total(&self.community),
        ] {
            self.kv.h_incr_by(&key, &field, 1)?;
            self.kv.expire(&key, COUNTER_TTL)?;
        }
        Ok(())
    }

    /// Record a slate impression: every slate word was served.
    ///
    /// Returns false (with a warning) when the slate is gone; expired
    /// slates are skipped silently rather than failing the caller.
    pub fn record_impression(&self, slate_id: &str) -> Result<bool> {
        let raw = self.kv.h_get(&keys::slate(slate_id), "words")?;
        let raw = match raw {
            Some(raw) => raw,
            None => {
                warn!(community = %self.community, slate_id, "impression for unknown slate, skipping");
                return Ok(false);
            }
        };
        let words: Vec<String> = serde_json::from_str(&raw)?;
        for word in &words {
            self.bump(word, FunnelEvent::Served)?;
        }
        Ok(true)
    }

    /// Record that a drawer picked a word
    pub fn record_pick(&self, word: &str) -> Result<()> {
        self.bump(word, FunnelEvent::Picked)
    }

    /// Record that a drawing of the word was published
    pub fn record_publish(&self, word: &str) -> Result<()> {
        self.bump(word, FunnelEvent::Posted)
    }

    /// Parse the hourly counter hash into per-word counts
    pub(crate) fn hourly_counts(&self) -> Result<FxHashMap<String, HourlyCounts>> {
        let mut counts: FxHashMap<String, HourlyCounts> = FxHashMap::default();
        for (field, raw) in self.kv.h_get_all(&keys::words_hourly(&self.community))? {
            // field is "<word>:<event>"; the event suffix follows the last ':'
            let Some((word, event)) = field.rsplit_once(':') else {
                continue;
            };
            let value: i64 = raw.parse().unwrap_or(0);
            let entry = counts.entry(word.to_string()).or_default();
            match event {
                "served" => entry.served = value,
                "picked" => entry.picked = value,
                "posted" => entry.posted = value,
                _ => {}
            }
        }
        Ok(counts)
    }

    /// Drop the hourly bucket after a recompute
    pub(crate) fn reset_hourly(&self) -> Result<()> {
        self.kv.del(&keys::words_hourly(&self.community))?;
        Ok(())
    }
}
