//! Dictionary store
//!
//! Stateless facade over the community's store handle; all state lives in
//! the KV layer. Words are normalized on every path, so callers can pass
//! raw user input directly.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use scrawl_core::{keys, normalize_word, CommentId, Error, Result, Timestamp};
use scrawl_store::{Kv, Order, StoreHandle, ZEntry};

use crate::defaults::DEFAULT_WORDS;

/// Score a word carries until the bandit has funnel data for it
pub const DEFAULT_WORD_SCORE: f64 = 1.0;

/// Result of a score-preserving membership update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Words newly added at the default score
    pub added: usize,
    /// Words removed because they were absent from the new list
    pub removed: usize,
    /// Words kept with their scores untouched
    pub kept: usize,
}

/// Per-community word dictionary
#[derive(Clone)]
pub struct Dictionary {
    kv: StoreHandle,
    community: String,
}

impl Dictionary {
    /// Create a dictionary over a community-scoped store handle
    pub fn new(kv: StoreHandle, community: impl Into<String>) -> Self {
        Self {
            kv,
            community: community.into(),
        }
    }

    /// The community this dictionary belongs to
    pub fn community(&self) -> &str {
        &self.community
    }

    fn all_key(&self) -> String {
        keys::words_all(&self.community)
    }

    fn banned_key(&self) -> String {
        keys::words_banned(&self.community)
    }

    /// Add a word. Returns true iff it was absent from both the active and
    /// banned sets; banned words are rejected outright.
    pub fn add_word(&self, raw: &str) -> Result<bool> {
        let word = normalize_word(raw)?;
        if self.kv.z_score(&self.banned_key(), &word)?.is_some() {
            return Err(Error::InvalidInput(format!("\"{}\" is banned", word)));
        }
        if self.kv.z_score(&self.all_key(), &word)?.is_some() {
            return Ok(false);
        }
        self.kv.z_add(&self.all_key(), &word, DEFAULT_WORD_SCORE)?;
        debug!(community = %self.community, word = %word, "word added");
        Ok(true)
    }

    /// Remove a word from the active set. Idempotent.
    pub fn remove_word(&self, raw: &str) -> Result<bool> {
        let word = normalize_word(raw)?;
        Ok(self.kv.z_rem(&self.all_key(), &word)?)
    }

    /// Ban a word: insert into the banned set and scrub it from the active
    /// set, the uncertainty set, last-served, and any backing.
    pub fn ban_word(&self, raw: &str) -> Result<()> {
        let word = normalize_word(raw)?;
        self.kv.z_add(&self.banned_key(), &word, DEFAULT_WORD_SCORE)?;
        self.kv.z_rem(&self.all_key(), &word)?;
        self.kv
            .z_rem(&keys::words_uncertainty(&self.community), &word)?;
        self.kv
            .h_del(&keys::words_last_served(&self.community), &word)?;
        if let Some(comment) = self
            .kv
            .h_get(&keys::words_backing(&self.community), &word)?
        {
            self.kv
                .h_del(&keys::words_backing(&self.community), &word)?;
            self.kv
                .h_del(&keys::words_backer(&self.community), &comment)?;
        }
        info!(community = %self.community, word = %word, "word banned");
        Ok(())
    }

    /// Whether a word is banned
    pub fn is_word_banned(&self, raw: &str) -> Result<bool> {
        let word = normalize_word(raw)?;
        Ok(self.kv.z_score(&self.banned_key(), &word)?.is_some())
    }

    /// Whether a word is in the active set
    pub fn is_word_active(&self, raw: &str) -> Result<bool> {
        let word = normalize_word(raw)?;
        Ok(self.kv.z_score(&self.all_key(), &word)?.is_some())
    }

    /// Replace the entire active set. Banned words are filtered; everything
    /// inserted carries the default score.
    pub fn replace_all(&self, words: &[String]) -> Result<usize> {
        self.kv.del(&self.all_key())?;
        let mut inserted = 0;
        for raw in words {
            let word = normalize_word(raw)?;
            if self.kv.z_score(&self.banned_key(), &word)?.is_some() {
                continue;
            }
            if self.kv.z_add(&self.all_key(), &word, DEFAULT_WORD_SCORE)? {
                inserted += 1;
            }
        }
        info!(community = %self.community, count = inserted, "dictionary replaced");
        Ok(inserted)
    }

    /// Set-diff membership update: add new members at the default score,
    /// remove members absent from `words`, keep scores on the overlap.
    pub fn update_preserving_scores(&self, words: &[String]) -> Result<UpdateOutcome> {
        let mut desired = Vec::new();
        for raw in words {
            let word = normalize_word(raw)?;
            if self.kv.z_score(&self.banned_key(), &word)?.is_some() {
                continue;
            }
            if !desired.contains(&word) {
                desired.push(word);
            }
        }

        let current: Vec<String> = self
            .kv
            .z_range_by_rank(&self.all_key(), 0, usize::MAX - 1, Order::Ascending)?
            .into_iter()
            .map(|e| e.member)
            .collect();

        let mut outcome = UpdateOutcome::default();
        for word in &desired {
            if current.contains(word) {
                outcome.kept += 1;
            } else {
                self.kv.z_add(&self.all_key(), word, DEFAULT_WORD_SCORE)?;
                outcome.added += 1;
            }
        }
        for word in &current {
            if !desired.contains(word) {
                self.kv.z_rem(&self.all_key(), word)?;
                outcome.removed += 1;
            }
        }
        Ok(outcome)
    }

    /// Uniform sample of `n` distinct active words; fewer when fewer exist
    pub fn get_random_words<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<String>> {
        let members: Vec<String> = self
            .kv
            .z_range_by_rank(&self.all_key(), 0, usize::MAX - 1, Order::Ascending)?
            .into_iter()
            .map(|e| e.member)
            .collect();
        Ok(members.choose_multiple(rng, n).cloned().collect())
    }

    /// All active words with scores, alphabetical by word
    pub fn get_all_words(&self) -> Result<Vec<ZEntry>> {
        let mut entries =
            self.kv
                .z_range_by_rank(&self.all_key(), 0, usize::MAX - 1, Order::Ascending)?;
        entries.sort_by(|a, b| a.member.cmp(&b.member));
        Ok(entries)
    }

    /// Number of active words
    pub fn word_count(&self) -> Result<usize> {
        Ok(self.kv.z_card(&self.all_key())?)
    }

    /// Idempotent first-install setup: seed an empty dictionary from the
    /// built-in list and register the community in the global index.
    ///
    /// Returns true iff the seed list was installed by this call.
    pub fn initialize(&self, global: &StoreHandle, now: Timestamp) -> Result<bool> {
        let seeded = if self.kv.z_card(&self.all_key())? == 0 {
            let words: Vec<String> = DEFAULT_WORDS.iter().map(|w| w.to_string()).collect();
            self.replace_all(&words)?;
            true
        } else {
            false
        };
        if global
            .z_score(&keys::communities_all(), &self.community)?
            .is_none()
        {
            global.z_add(
                &keys::communities_all(),
                &self.community,
                now.as_millis() as f64,
            )?;
        }
        Ok(seeded)
    }

    // ========== Word backing ==========

    /// Record a comment as the backer of a word. One backer per word; a
    /// re-back replaces the old reverse mapping.
    pub fn back_word(&self, raw: &str, comment: &CommentId) -> Result<()> {
        let word = normalize_word(raw)?;
        if self.kv.z_score(&self.all_key(), &word)?.is_none() {
            return Err(Error::NotFound(format!("\"{}\" is not in the dictionary", word)));
        }
        if let Some(previous) = self
            .kv
            .h_get(&keys::words_backing(&self.community), &word)?
        {
            self.kv
                .h_del(&keys::words_backer(&self.community), &previous)?;
        }
        self.kv
            .h_set(&keys::words_backing(&self.community), &word, comment.as_str())?;
        self.kv
            .h_set(&keys::words_backer(&self.community), comment.as_str(), &word)?;
        Ok(())
    }

    /// The comment backing a word, if any
    pub fn backer_of(&self, raw: &str) -> Result<Option<CommentId>> {
        let word = normalize_word(raw)?;
        Ok(self
            .kv
            .h_get(&keys::words_backing(&self.community), &word)?
            .map(CommentId::new))
    }

    /// Moderator deleted a backing comment: ban the backed word.
    ///
    /// Returns the banned word when the comment backed one.
    pub fn on_backing_comment_deleted(&self, comment: &CommentId) -> Result<Option<String>> {
        let word = self
            .kv
            .h_get(&keys::words_backer(&self.community), comment.as_str())?;
        match word {
            Some(word) => {
                self.ban_word(&word)?;
                Ok(Some(word))
            }
            None => Ok(None),
        }
    }
}
