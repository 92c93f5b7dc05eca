//! Consumables and active effects
//!
//! A user's inventory is a hash of item → count; active effects live in a
//! zset scored by expiry with one metadata hash per activation. Reads prune
//! lazily; nothing sweeps expired activations.
//!
//! Effect kinds: `score_multiplier` (non-stacking, effective value is the
//! max) and `extra_drawing_time` (additive seconds).

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use scrawl_core::{keys, Clock, Error, Result, Timestamp, UserId};
use scrawl_store::{Kv, Order, StoreHandle};

use crate::platform::Realtime;

/// Item id for the score multiplier consumable
pub const ITEM_SCORE_MULTIPLIER: &str = "score_multiplier";
/// Item id for the extra drawing time consumable
pub const ITEM_EXTRA_DRAWING_TIME: &str = "extra_drawing_time";

/// Extra TTL on activation hashes beyond the effect duration, so a
/// metadata read never races its own zset entry
const ACTIVATION_TTL_BUFFER: Duration = Duration::from_secs(3600);

/// One live activation
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    /// Server-generated activation token
    pub activation_id: String,
    /// The consumed item
    pub item: String,
    /// When the effect lapses
    pub expires_at: Timestamp,
    /// Raw activation fields (multiplier, extraSeconds, ...)
    pub fields: Vec<(String, String)>,
}

impl ActiveEffect {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Multiplier carried by a `score_multiplier` effect
    pub fn multiplier(&self) -> Option<f64> {
        self.field("multiplier").and_then(|v| v.parse().ok())
    }

    /// Seconds carried by an `extra_drawing_time` effect
    pub fn extra_seconds(&self) -> Option<u64> {
        self.field("extraSeconds").and_then(|v| v.parse().ok())
    }
}

/// Inventory and active-effect service
#[derive(Clone)]
pub struct Effects {
    kv: StoreHandle,
    clock: Arc<dyn Clock>,
    realtime: Arc<dyn Realtime>,
}

impl Effects {
    /// Create over the global namespace (inventories are per user, not per
    /// community)
    pub fn new(kv: StoreHandle, clock: Arc<dyn Clock>, realtime: Arc<dyn Realtime>) -> Self {
        Self {
            kv: kv.global(),
            clock,
            realtime,
        }
    }

    /// Add items to a user's inventory. Returns the new count.
    pub fn grant_item(&self, user: &UserId, item: &str, count: i64) -> Result<i64> {
        if count <= 0 {
            return Err(Error::InvalidInput("grant count must be positive".into()));
        }
        Ok(self
            .kv
            .h_incr_by(&keys::user_inventory(user), item, count)?)
    }

    /// A user's inventory as (item, count) pairs, zero counts omitted
    pub fn inventory(&self, user: &UserId) -> Result<Vec<(String, i64)>> {
        let mut items = Vec::new();
        for (item, raw) in self.kv.h_get_all(&keys::user_inventory(user))? {
            let count: i64 = raw
                .parse()
                .map_err(|_| Error::Fatal(format!("bad inventory count for {}", item)))?;
            if count > 0 {
                items.push((item, count));
            }
        }
        Ok(items)
    }

    /// Consume one item and start its effect
    ///
    /// Decrements inventory, writes the activation hash with TTL, inserts
    /// into the active zset, and publishes `effects_updated` best-effort.
    /// Returns the activation id.
    pub fn activate(
        &self,
        user: &UserId,
        item: &str,
        duration: Duration,
        extra_fields: &[(String, String)],
    ) -> Result<String> {
        let remaining = self.kv.h_incr_by(&keys::user_inventory(user), item, -1)?;
        if remaining < 0 {
            self.kv.h_incr_by(&keys::user_inventory(user), item, 1)?;
            return Err(Error::InvalidInput(format!("no {} in inventory", item)));
        }

        let now = self.clock.now();
        let expires_at = now.saturating_add(duration);
        let activation_id = Uuid::new_v4().to_string();

        let mut fields = vec![
            ("user".to_string(), user.as_str().to_string()),
            ("item".to_string(), item.to_string()),
            ("expiresAt".to_string(), expires_at.as_millis().to_string()),
        ];
        fields.extend_from_slice(extra_fields);

        let boost_key = keys::boost(&activation_id);
        self.kv.h_set_all(&boost_key, &fields)?;
        self.kv
            .expire(&boost_key, duration + ACTIVATION_TTL_BUFFER)?;
        self.kv.z_add(
            &keys::user_active_boosts(user),
            &activation_id,
            expires_at.as_millis() as f64,
        )?;

        let payload = json!({ "type": "effects_updated" });
        if let Err(e) = self.realtime.send(&keys::user_channel(user), &payload) {
            warn!(user = %user, error = %e, "effects_updated publish failed");
        }
        debug!(user = %user, item, activation_id = %activation_id, "effect activated");
        Ok(activation_id)
    }

    /// Live effects for a user, pruning expired entries as they are seen
    pub fn get_active_effects(&self, user: &UserId) -> Result<Vec<ActiveEffect>> {
        let now = self.clock.now();
        let boosts_key = keys::user_active_boosts(user);
        let entries = self
            .kv
            .z_range_by_rank(&boosts_key, 0, usize::MAX - 1, Order::Ascending)?;

        let mut live = Vec::new();
        for entry in entries {
            if entry.score <= now.as_millis() as f64 {
                self.kv.z_rem(&boosts_key, &entry.member)?;
                self.kv.del(&keys::boost(&entry.member))?;
                continue;
            }
            let fields = self.kv.h_get_all(&keys::boost(&entry.member))?;
            if fields.is_empty() {
                // metadata lapsed ahead of the zset entry
                self.kv.z_rem(&boosts_key, &entry.member)?;
                continue;
            }
            let item = fields
                .iter()
                .find(|(k, _)| k == "item")
                .map(|(_, v)| v.clone())
                .unwrap_or_default();
            let expires_at = fields
                .iter()
                .find(|(k, _)| k == "expiresAt")
                .and_then(|(_, v)| v.parse().ok())
                .map(Timestamp::from_millis)
                .unwrap_or_else(|| Timestamp::from_millis(entry.score as u64));
            live.push(ActiveEffect {
                activation_id: entry.member,
                item,
                expires_at,
                fields,
            });
        }
        Ok(live)
    }

    /// Effective score multiplier: max across live multiplier effects,
    /// default 1
    pub fn score_multiplier(&self, user: &UserId) -> Result<f64> {
        let mut best = 1.0f64;
        for effect in self.get_active_effects(user)? {
            if effect.item == ITEM_SCORE_MULTIPLIER {
                if let Some(m) = effect.multiplier() {
                    best = best.max(m);
                }
            }
        }
        Ok(best)
    }

    /// Total extra drawing seconds: additive across live effects
    pub fn extra_drawing_time(&self, user: &UserId) -> Result<u64> {
        let mut total = 0u64;
        for effect in self.get_active_effects(user)? {
            if effect.item == ITEM_EXTRA_DRAWING_TIME {
                total += effect.extra_seconds().unwrap_or(0);
            }
        }
        Ok(total)
    }
}
