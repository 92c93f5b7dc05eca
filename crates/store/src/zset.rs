//! Sorted set structure
//!
//! Member → score map plus an ordered index. Scores are `f64` ordered by
//! `total_cmp`; members with equal scores order lexicographically, which
//! keeps every range query deterministic.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Direction of a range query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Lowest score first
    Ascending,
    /// Highest score first
    Descending,
}

/// A `{member, score}` pair returned by range queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZEntry {
    /// Set member
    pub member: String,
    /// Member score
    pub score: f64,
}

/// Total order over f64 scores for the BTreeSet index
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScoreKey(f64);

impl Eq for ScoreKey {}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Sorted set: unique members with float scores
#[derive(Debug, Clone, Default)]
pub struct ZSet {
    scores: FxHashMap<String, f64>,
    index: BTreeSet<(ScoreKey, String)>,
}

impl ZSet {
    /// Create an empty sorted set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Whether the set has no members
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Set a member's score. Returns true iff the member was new.
    pub fn insert(&mut self, member: &str, score: f64) -> bool {
        match self.scores.insert(member.to_string(), score) {
            Some(old) => {
                self.index.remove(&(ScoreKey(old), member.to_string()));
                self.index.insert((ScoreKey(score), member.to_string()));
                false
            }
            None => {
                self.index.insert((ScoreKey(score), member.to_string()));
                true
            }
        }
    }

    /// Remove a member. Returns true iff it was present.
    pub fn remove(&mut self, member: &str) -> bool {
        match self.scores.remove(member) {
            Some(old) => {
                self.index.remove(&(ScoreKey(old), member.to_string()));
                true
            }
            None => false,
        }
    }

    /// Score of a member, if present
    pub fn score(&self, member: &str) -> Option<f64> {
        self.scores.get(member).copied()
    }

    /// Add `delta` to a member's score, inserting at `delta` when absent.
    /// Returns the new score.
    pub fn incr(&mut self, member: &str, delta: f64) -> f64 {
        let next = self.score(member).unwrap_or(0.0) + delta;
        self.insert(member, next);
        next
    }

    /// Count members with score in `[min, max]`
    pub fn count_in(&self, min: f64, max: f64) -> usize {
        self.index
            .iter()
            .filter(|(ScoreKey(s), _)| *s >= min && *s <= max)
            .count()
    }

    /// Members at ranks `[start, stop]` (inclusive) in the given order
    ///
    /// Ranks are zero-based. Out-of-range bounds clamp; an empty slice is
    /// returned when `start` is past the end or past `stop`.
    pub fn range_by_rank(&self, start: usize, stop: usize, order: Order) -> Vec<ZEntry> {
        if start > stop || start >= self.len() {
            return Vec::new();
        }
        let take = stop - start + 1;
        match order {
            Order::Ascending => self
                .index
                .iter()
                .skip(start)
                .take(take)
                .map(|(ScoreKey(score), member)| ZEntry {
                    member: member.clone(),
                    score: *score,
                })
                .collect(),
            Order::Descending => self
                .index
                .iter()
                .rev()
                .skip(start)
                .take(take)
                .map(|(ScoreKey(score), member)| ZEntry {
                    member: member.clone(),
                    score: *score,
                })
                .collect(),
        }
    }

    /// Members with score in `[min, max]` in the given order
    pub fn range_by_score(&self, min: f64, max: f64, order: Order) -> Vec<ZEntry> {
        let mut entries: Vec<ZEntry> = self
            .index
            .iter()
            .filter(|(ScoreKey(s), _)| *s >= min && *s <= max)
            .map(|(ScoreKey(score), member)| ZEntry {
                member: member.clone(),
                score: *score,
            })
            .collect();
        if order == Order::Descending {
            entries.reverse();
        }
        entries
    }

    /// Remove members at ascending ranks `[start, stop]`. Returns how many
    /// were removed.
    pub fn remove_range_by_rank(&mut self, start: usize, stop: usize) -> usize {
        let doomed: Vec<String> = self
            .range_by_rank(start, stop, Order::Ascending)
            .into_iter()
            .map(|e| e.member)
            .collect();
        for member in &doomed {
            self.remove(member);
        }
        doomed.len()
    }
}
