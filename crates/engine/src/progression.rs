//! User progression
//!
//! One global `scores` sorted set, a fixed level table, and a leaderboard
//! projection. Awards that cross a level threshold enqueue the level-up and
//! flair jobs best-effort; a flaky scheduler never blocks an award.

use std::sync::Arc;

use tracing::{info, warn};

use scrawl_core::{keys, Result, UserId};
use scrawl_jobs::{FlairPayload, JobName, JobRequest, LevelUpPayload, Scheduler};
use scrawl_store::{Kv, Order, StoreHandle};

use crate::effects::Effects;
use crate::platform::CachedIdentity;

/// One rank in the level table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDef {
    /// 1-based rank
    pub rank: u32,
    /// Display name
    pub name: &'static str,
    /// Minimum score for the rank
    pub min_score: i64,
}

/// Fixed level table, ascending by score
pub static LEVELS: &[LevelDef] = &[
    LevelDef { rank: 1, name: "Doodler", min_score: 0 },
    LevelDef { rank: 2, name: "Sketcher", min_score: 100 },
    LevelDef { rank: 3, name: "Inker", min_score: 250 },
    LevelDef { rank: 4, name: "Illustrator", min_score: 500 },
    LevelDef { rank: 5, name: "Painter", min_score: 1_000 },
    LevelDef { rank: 6, name: "Muralist", min_score: 2_500 },
    LevelDef { rank: 7, name: "Master", min_score: 5_000 },
    LevelDef { rank: 8, name: "Legend", min_score: 10_000 },
];

/// The level a score sits in. Pure; negative scores clamp to rank 1.
pub fn level_for_score(score: i64) -> &'static LevelDef {
    LEVELS
        .iter()
        .rev()
        .find(|l| score >= l.min_score)
        .unwrap_or(&LEVELS[0])
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardRow {
    /// The user
    pub user_id: UserId,
    /// Their score
    pub score: i64,
    /// Resolved username, or the raw id when identity is unavailable
    pub username: String,
}

/// Score counter and level service
#[derive(Clone)]
pub struct Progression {
    kv: StoreHandle,
    scheduler: Arc<dyn Scheduler>,
    effects: Effects,
    identity: CachedIdentity,
}

impl Progression {
    /// Create over the global namespace
    pub fn new(
        kv: StoreHandle,
        scheduler: Arc<dyn Scheduler>,
        effects: Effects,
        identity: CachedIdentity,
    ) -> Self {
        Self {
            kv: kv.global(),
            scheduler,
            effects,
            identity,
        }
    }

    /// A user's score, zero when unranked
    pub fn get_score(&self, user: &UserId) -> Result<i64> {
        Ok(self
            .kv
            .z_score(&keys::scores(), user.as_str())?
            .map(|s| s as i64)
            .unwrap_or(0))
    }

    /// Overwrite a user's score (admin surface)
    pub fn set_score(&self, user: &UserId, score: i64) -> Result<()> {
        self.kv.z_add(&keys::scores(), user.as_str(), score as f64)?;
        Ok(())
    }

    /// Award score with the user's active multiplier applied.
    /// Returns the new score.
    pub fn increment_score(&self, user: &UserId, amount: i64) -> Result<i64> {
        let delta = if amount > 0 {
            let multiplier = self.effects.score_multiplier(user)?;
            (amount as f64 * multiplier).round() as i64
        } else {
            amount
        };
        self.apply_delta(user, delta)
    }

    /// Award score without consulting multipliers (snapshot payouts are
    /// flat by contract)
    pub fn increment_score_raw(&self, user: &UserId, amount: i64) -> Result<i64> {
        self.apply_delta(user, amount)
    }

    fn apply_delta(&self, user: &UserId, delta: i64) -> Result<i64> {
        let new_score = self.kv.z_incr_by(&keys::scores(), user.as_str(), delta as f64)? as i64;
        let old_score = new_score - delta;
        let old_level = level_for_score(old_score);
        let new_level = level_for_score(new_score);
        if new_level.rank > old_level.rank {
            info!(user = %user, level = new_level.name, score = new_score, "level up");
            self.enqueue_level_jobs(user, new_level);
        }
        Ok(new_score)
    }

    fn enqueue_level_jobs(&self, user: &UserId, level: &LevelDef) {
        let level_up = LevelUpPayload {
            user_id: user.clone(),
            level_rank: level.rank,
            level_name: level.name.to_string(),
        };
        let flair = FlairPayload {
            user_id: user.clone(),
            flair_text: format!("Level {} · {}", level.rank, level.name),
        };
        for (name, data) in [
            (JobName::UserLevelUp, serde_json::to_value(&level_up)),
            (JobName::SetUserFlair, serde_json::to_value(&flair)),
        ] {
            match data {
                Ok(data) => {
                    if let Err(e) = self.scheduler.run_job(JobRequest::immediate(name, data)) {
                        warn!(user = %user, job = %name, error = %e, "level job enqueue failed");
                    }
                }
                Err(e) => warn!(job = %name, error = %e, "level job payload unserializable"),
            }
        }
    }

    /// Current level for a user
    pub fn get_user_level(&self, user: &UserId) -> Result<&'static LevelDef> {
        Ok(level_for_score(self.get_score(user)?))
    }

    /// Top users by score, descending, with usernames projected through the
    /// cached identity collaborator
    pub fn get_leaderboard(&self, limit: usize, offset: usize) -> Result<Vec<LeaderboardRow>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = offset + limit - 1;
        let entries = self
            .kv
            .z_range_by_rank(&keys::scores(), offset, stop, Order::Descending)?;
        let mut rows = Vec::with_capacity(entries.len());
        for entry in entries {
            let user_id = UserId::new(entry.member);
            let username = match self.identity.username(&user_id) {
                Ok(name) => name,
                Err(e) => {
                    warn!(user = %user_id, error = %e, "username lookup failed");
                    user_id.as_str().to_string()
                }
            };
            rows.push(LeaderboardRow {
                user_id,
                score: entry.score as i64,
                username,
            });
        }
        Ok(rows)
    }
}
