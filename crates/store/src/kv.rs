//! The KV capability surface
//!
//! Everything the engine needs from the host platform's store, and nothing
//! more. All operations are single round-trips; the engine composes them
//! with locks and ledgers rather than transactions.

use std::time::Duration;

use scrawl_core::Result;

use crate::zset::{Order, ZEntry};

/// Typed operations over strings, hashes, sorted sets, and counters
///
/// Implementations must be `Send + Sync`; the engine shares one store across
/// request handlers and background jobs.
pub trait Kv: Send + Sync {
    // ========== Strings ==========

    /// Get a string value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a string value, clearing any TTL
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Set a string value with a TTL
    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Set-if-absent with expiry. Returns true iff the key was set, i.e. it
    /// was absent (or expired) at the moment of the call. The lock primitive.
    fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Delete a key of any kind. Returns true iff a live key was removed.
    fn del(&self, key: &str) -> Result<bool>;

    /// Whether a live key of any kind exists
    fn exists(&self, key: &str) -> Result<bool>;

    /// Set a TTL on an existing key. Returns false when the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> Result<bool>;

    /// Atomically add to an integer counter, creating it at zero.
    /// Returns the post-increment value.
    fn incr_by(&self, key: &str, delta: i64) -> Result<i64>;

    // ========== Hashes ==========

    /// Get a hash field
    fn h_get(&self, key: &str, field: &str) -> Result<Option<String>>;

    /// Set a hash field
    fn h_set(&self, key: &str, field: &str, value: &str) -> Result<()>;

    /// Set several hash fields at once
    fn h_set_all(&self, key: &str, fields: &[(String, String)]) -> Result<()>;

    /// All fields of a hash, sorted by field name. Empty when absent.
    fn h_get_all(&self, key: &str) -> Result<Vec<(String, String)>>;

    /// Atomically add to an integer hash field, creating it at zero.
    /// Returns the post-increment value.
    fn h_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64>;

    /// Delete a hash field. Returns true iff it existed.
    fn h_del(&self, key: &str, field: &str) -> Result<bool>;

    // ========== Sorted sets ==========

    /// Set a member's score. Returns true iff the member was new.
    fn z_add(&self, key: &str, member: &str, score: f64) -> Result<bool>;

    /// Remove a member. Returns true iff it was present.
    fn z_rem(&self, key: &str, member: &str) -> Result<bool>;

    /// A member's score, if present
    fn z_score(&self, key: &str, member: &str) -> Result<Option<f64>>;

    /// Add to a member's score, inserting when absent. Returns the new score.
    fn z_incr_by(&self, key: &str, member: &str, delta: f64) -> Result<f64>;

    /// Number of members
    fn z_card(&self, key: &str) -> Result<usize>;

    /// Number of members with score in `[min, max]`
    fn z_count(&self, key: &str, min: f64, max: f64) -> Result<usize>;

    /// Members at ranks `[start, stop]` (inclusive, zero-based) in order
    fn z_range_by_rank(
        &self,
        key: &str,
        start: usize,
        stop: usize,
        order: Order,
    ) -> Result<Vec<ZEntry>>;

    /// Members with score in `[min, max]` in order
    fn z_range_by_score(&self, key: &str, min: f64, max: f64, order: Order)
        -> Result<Vec<ZEntry>>;

    /// Remove members at ascending ranks `[start, stop]`. Returns the count
    /// removed.
    fn z_rem_range_by_rank(&self, key: &str, start: usize, stop: usize) -> Result<usize>;
}
