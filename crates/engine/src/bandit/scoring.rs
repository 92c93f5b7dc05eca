//! Score update loop
//!
//! Runs under the community's score lock. Words served this hour get a new
//! drawer score from population z-scores of their pick and post rates;
//! their uncertainty shrinks with impression volume. Unserved words keep
//! their score but their uncertainty grows by the decay rate, so ignored
//! words drift back toward exploration.
//!
//! The hourly bucket resets at the end of a successful pass. The lock is a
//! lease: a crashed pass leaves a partially-updated hour behind, and the
//! next pass simply recomputes over whatever counters remain.

use std::time::Duration;

use tracing::{debug, info};

use scrawl_concurrency::LeaseLock;
use scrawl_core::{keys, Error, Result};
use scrawl_store::{Kv, Order};

use crate::bandit::slate::DEFAULT_UNCERTAINTY;
use crate::bandit::Bandit;

/// Lease TTL for one recompute pass
const SCORE_LOCK_TTL: Duration = Duration::from_secs(60);
/// Uncertainty floor; sqrt of this stays a meaningful UCB bonus ordering
const MIN_UNCERTAINTY: f64 = 0.01;
/// Uncertainty ceiling for unserved words
const MAX_UNCERTAINTY: f64 = 4.0;
/// How strongly impression volume shrinks uncertainty
const UNCERTAINTY_SHRINK: f64 = 0.25;
/// Population std below this counts as "all rates equal"
const STD_EPSILON: f64 = 1e-9;

/// Outcome of one recompute pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// Words rescored from funnel data
    pub rescored: usize,
    /// Unserved words whose uncertainty grew
    pub drifted: usize,
}

fn mean_and_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, variance.sqrt())
}

fn z_score(value: f64, mean: f64, std: f64, clamp: f64) -> f64 {
    if std < STD_EPSILON {
        return 0.0;
    }
    ((value - mean) / std).clamp(-clamp, clamp)
}

impl Bandit {
    /// Recompute drawer scores from this hour's funnel counters
    ///
    /// Fails with `Conflict` when another pass holds the community lock.
    pub fn update_scores(&self) -> Result<ScoreUpdate> {
        let lock = LeaseLock::new(
            self.kv.clone(),
            keys::slate_scores_lock(&self.community),
        );
        if !lock.try_acquire(SCORE_LOCK_TTL)? {
            return Err(Error::Conflict(format!(
                "score update already running for {}",
                self.community
            )));
        }
        let result = self.update_scores_locked();
        lock.release()?;
        result
    }

    fn update_scores_locked(&self) -> Result<ScoreUpdate> {
        let config = self.config()?;
        let now = self.clock.now();

        let words = self.kv.z_range_by_rank(
            &keys::words_all(&self.community),
            0,
            usize::MAX - 1,
            Order::Ascending,
        )?;
        let counts = self.hourly_counts()?;
        let last_served = self
            .kv
            .h_get_all(&keys::words_last_served(&self.community))?;
        let uncertainty_key = keys::words_uncertainty(&self.community);
        let uncertainties = self
            .kv
            .z_range_by_rank(&uncertainty_key, 0, usize::MAX - 1, Order::Ascending)?;
        let uncertainty_of = |word: &str| {
            uncertainties
                .iter()
                .find(|e| e.member == word)
                .map(|e| e.score)
                .unwrap_or(DEFAULT_UNCERTAINTY)
        };

        struct Observed {
            word: String,
            served: i64,
            pick_rate: f64,
            post_rate: f64,
        }

        let mut observed = Vec::new();
        let mut unserved = Vec::new();
        for entry in &words {
            match counts.get(&entry.member) {
                Some(c) if c.served > 0 => observed.push(Observed {
                    word: entry.member.clone(),
                    served: c.served,
                    pick_rate: c.picked as f64 / c.served as f64,
                    post_rate: c.posted as f64 / c.served as f64,
                }),
                _ => unserved.push(entry.member.clone()),
            }
        }

        let pick_rates: Vec<f64> = observed.iter().map(|o| o.pick_rate).collect();
        let post_rates: Vec<f64> = observed.iter().map(|o| o.post_rate).collect();
        let (pick_mean, pick_std) = mean_and_std(&pick_rates);
        let (post_mean, post_std) = mean_and_std(&post_rates);

        for obs in &observed {
            let z_pick = z_score(obs.pick_rate, pick_mean, pick_std, config.z_score_clamp);
            let z_post = z_score(obs.post_rate, post_mean, post_std, config.z_score_clamp);
            let score =
                config.weight_pick_rate * z_pick + config.weight_post_rate * z_post;

            // decay against last-served before writing, same rule slates use
            let served_at = last_served
                .iter()
                .find(|(word, _)| word == &obs.word)
                .and_then(|(_, raw)| raw.parse().ok())
                .map(scrawl_core::Timestamp::from_millis);
            let score = match served_at {
                Some(at) => score * (-config.score_decay_rate * now.hours_since(at)).exp(),
                None => score,
            };
            self.kv
                .z_add(&keys::words_all(&self.community), &obs.word, score)?;

            // more impressions, less uncertainty
            let shrunk = uncertainty_of(&obs.word)
                / (1.0 + obs.served as f64 * UNCERTAINTY_SHRINK);
            self.kv
                .z_add(&uncertainty_key, &obs.word, shrunk.max(MIN_UNCERTAINTY))?;
            debug!(word = %obs.word, score, z_pick, z_post, "word rescored");
        }

        for word in &unserved {
            let grown = (uncertainty_of(word) * (1.0 + config.score_decay_rate))
                .min(MAX_UNCERTAINTY);
            self.kv.z_add(&uncertainty_key, word, grown)?;
        }

        self.reset_hourly()?;
        info!(
            community = %self.community,
            rescored = observed.len(),
            drifted = unserved.len(),
            "score update complete"
        );
        Ok(ScoreUpdate {
            rescored: observed.len(),
            drifted: unserved.len(),
        })
    }
}
