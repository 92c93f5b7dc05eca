//! Slate generation
//!
//! Top-K by UCB score with a single ε-greedy substitution. The slate id is
//! a deterministic hash over the sorted chosen words; two slates with the
//! same members share an id regardless of slot order, which is what makes
//! impression recording idempotent across re-renders.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use rand::seq::SliceRandom;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

use scrawl_core::{keys, Error, Result, Timestamp};
use scrawl_store::{Kv, Order};

use crate::bandit::Bandit;

/// How long a persisted slate lives
pub const SLATE_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Uncertainty assumed for words the estimator has never scored
pub(crate) const DEFAULT_UNCERTAINTY: f64 = 1.0;

/// A generated slate
#[derive(Debug, Clone, PartialEq)]
pub struct Slate {
    /// Deterministic short id
    pub id: String,
    /// Candidate words, best UCB first
    pub words: Vec<String>,
    /// When the slate was generated
    pub created_at: Timestamp,
}

/// Deterministic slate id: SHA-256 over the sorted, length-prefixed members
///
/// Equal member sets produce equal ids regardless of order.
pub fn slate_id(words: &[String]) -> String {
    let mut sorted = words.to_vec();
    sorted.sort();
    let mut hasher = Sha256::new();
    for word in &sorted {
        hasher.update((word.len() as u32).to_le_bytes());
        hasher.update(word.as_bytes());
    }
    let digest = hasher.finalize();
    URL_SAFE_NO_PAD.encode(&digest[..9])
}

struct Candidate {
    word: String,
    ucb: f64,
}

impl Bandit {
    /// Generate a slate of `count` words and persist it
    ///
    /// Fails with `InsufficientWords` when the active set is too small.
    /// Updates every chosen word's last-served timestamp.
    pub fn generate_slate<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Result<Slate> {
        let config = self.config()?;
        let now = self.clock.now();

        let mut active = self.kv.z_range_by_rank(
            &keys::words_all(&self.community),
            0,
            usize::MAX - 1,
            Order::Ascending,
        )?;
        if active.len() < count {
            return Err(Error::InsufficientWords {
                needed: count,
                available: active.len(),
            });
        }
        // alphabetical walk keeps candidate construction deterministic
        active.sort_by(|a, b| a.member.cmp(&b.member));

        let last_served: Vec<(String, String)> = self
            .kv
            .h_get_all(&keys::words_last_served(&self.community))?;
        let uncertainty = self.kv.z_range_by_rank(
            &keys::words_uncertainty(&self.community),
            0,
            usize::MAX - 1,
            Order::Ascending,
        )?;

        let mut candidates: Vec<Candidate> = active
            .iter()
            .map(|entry| {
                let served_at = last_served
                    .iter()
                    .find(|(word, _)| word == &entry.member)
                    .and_then(|(_, raw)| raw.parse().ok())
                    .map(Timestamp::from_millis);
                let score = match served_at {
                    Some(at) => {
                        entry.score * (-config.score_decay_rate * now.hours_since(at)).exp()
                    }
                    None => entry.score,
                };
                let u = uncertainty
                    .iter()
                    .find(|e| e.member == entry.member)
                    .map(|e| e.score)
                    .unwrap_or(DEFAULT_UNCERTAINTY);
                Candidate {
                    word: entry.member.clone(),
                    ucb: score + config.ucb_constant * u.max(0.0).sqrt(),
                }
            })
            .collect();

        // best UCB first; member order breaks ties so equal scores stay stable
        candidates.sort_by(|a, b| {
            b.ucb
                .total_cmp(&a.ucb)
                .then_with(|| a.word.cmp(&b.word))
        });

        let mut chosen: Vec<String> = candidates[..count].iter().map(|c| c.word.clone()).collect();
        let pool: Vec<&Candidate> = candidates[count..].iter().collect();
        if !pool.is_empty() && rng.gen::<f64>() < config.exploration_rate {
            let slot = rng.gen_range(0..count);
            let substitute = pool.choose(rng).expect("pool checked non-empty");
            chosen[slot] = substitute.word.clone();
        }

        let id = slate_id(&chosen);
        let slate_key = keys::slate(&id);
        self.kv.h_set_all(
            &slate_key,
            &[
                ("words".to_string(), serde_json::to_string(&chosen)?),
                ("timestamp".to_string(), now.as_millis().to_string()),
            ],
        )?;
        self.kv.expire(&slate_key, SLATE_TTL)?;

        for word in &chosen {
            self.kv.h_set(
                &keys::words_last_served(&self.community),
                word,
                &now.as_millis().to_string(),
            )?;
        }

        debug!(community = %self.community, slate = %id, words = ?chosen, "slate generated");
        Ok(Slate {
            id,
            words: chosen,
            created_at: now,
        })
    }

    /// Load a persisted slate
    pub fn get_slate(&self, slate_id: &str) -> Result<Option<Slate>> {
        let fields = self.kv.h_get_all(&keys::slate(slate_id))?;
        if fields.is_empty() {
            return Ok(None);
        }
        let words = fields
            .iter()
            .find(|(k, _)| k == "words")
            .map(|(_, raw)| serde_json::from_str(raw))
            .transpose()?
            .unwrap_or_default();
        let created_at = fields
            .iter()
            .find(|(k, _)| k == "timestamp")
            .and_then(|(_, raw)| raw.parse().ok())
            .map(Timestamp::from_millis)
            .unwrap_or(Timestamp::EPOCH);
        Ok(Some(Slate {
            id: slate_id.to_string(),
            words,
            created_at,
        }))
    }
}
