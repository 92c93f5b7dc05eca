//! Stable key layout for the shared KV store
//!
//! Every key the engine reads or writes is built here. Keys are plain
//! strings joined by `:` and are part of the persisted data contract -
//! never rename them. Tests pin the literal forms.
//!
//! Community-scoped keys either carry the community name explicitly
//! (`words:all:<sub>`) or rely on globally-unique post/comment ids
//! (`tournament:entries:<postId>`).

use crate::types::{CommentId, PostId, UserId};

// ============================================================================
// Drawings
// ============================================================================

/// Drawing post data hash
pub fn drawing(post: &PostId) -> String {
    format!("drawing:{}", post)
}

/// Guessed words per drawing (zset word → count)
pub fn drawing_guesses(post: &PostId) -> String {
    format!("drawing:guesses:{}", post)
}

/// Guess attempts per drawing (zset user → attempts)
pub fn drawing_attempts(post: &PostId) -> String {
    format!("drawing:attempts:{}", post)
}

/// Users who solved a drawing (zset user → solve time)
pub fn drawing_solves(post: &PostId) -> String {
    format!("drawing:solves:{}", post)
}

/// Users who skipped a drawing (zset user → skip time)
pub fn drawing_skips(post: &PostId) -> String {
    format!("drawing:skips:{}", post)
}

/// Global index of all drawings (zset post → createdAt)
pub fn drawings_all() -> String {
    "drawings:all".to_string()
}

// ============================================================================
// Users
// ============================================================================

/// Cached username for a user id
pub fn user_name(user: &UserId) -> String {
    format!("user:name:{}", user)
}

/// Cached moderator status for a user id
pub fn user_mod(user: &UserId) -> String {
    format!("user:mod:{}", user)
}

/// Cached admin status for a user id
pub fn user_admin(user: &UserId) -> String {
    format!("user:admin:{}", user)
}

/// Drawings created by a user (zset post → createdAt)
pub fn user_drawings(user: &UserId) -> String {
    format!("user:drawings:{}", user)
}

/// Consumable inventory (hash item → count)
pub fn user_inventory(user: &UserId) -> String {
    format!("user:inventory:{}", user)
}

/// Active effects (zset activation id → expiry)
pub fn user_active_boosts(user: &UserId) -> String {
    format!("user:active_boosts:{}", user)
}

/// Activation metadata hash
pub fn boost(activation_id: &str) -> String {
    format!("boost:{}", activation_id)
}

/// Realtime channel for a user's effect updates
pub fn user_channel(user: &UserId) -> String {
    format!("user:{}", user)
}

/// Global score ladder (zset user → score)
pub fn scores() -> String {
    "scores".to_string()
}

// ============================================================================
// Dictionary
// ============================================================================

/// Active words for a community (zset word → drawer score)
pub fn words_all(community: &str) -> String {
    format!("words:all:{}", community)
}

/// Banned words for a community (zset)
pub fn words_banned(community: &str) -> String {
    format!("words:banned:{}", community)
}

/// Word uncertainty estimates (zset word → uncertainty)
pub fn words_uncertainty(community: &str) -> String {
    format!("words:uncertainty:{}", community)
}

/// Last-served timestamps (hash word → millis)
pub fn words_last_served(community: &str) -> String {
    format!("words:lastServed:{}", community)
}

/// All-time funnel counters (hash "<word>:<event>" → count)
pub fn words_total(community: &str) -> String {
    format!("words:total:{}", community)
}

/// Current-hour funnel counters (hash "<word>:<event>" → count)
pub fn words_hourly(community: &str) -> String {
    format!("words:hourly:{}", community)
}

/// Word backing comments (hash word → comment id)
pub fn words_backing(community: &str) -> String {
    format!("words:backing:{}", community)
}

/// Reverse backing index (hash comment id → word)
pub fn words_backer(community: &str) -> String {
    format!("words:backer:{}", community)
}

/// Global index of installed communities (zset name → installedAt)
pub fn communities_all() -> String {
    "communities:all".to_string()
}

// ============================================================================
// Slates
// ============================================================================

/// Slate data hash (words + timestamp)
pub fn slate(slate_id: &str) -> String {
    format!("slate:{}", slate_id)
}

/// Slate bandit configuration hash
pub fn slate_config() -> String {
    "slate:config".to_string()
}

/// Lock guarding a community's score-update loop
pub fn slate_scores_lock(community: &str) -> String {
    format!("slate:scores:lock:{}", community)
}

// ============================================================================
// Tournaments
// ============================================================================

/// Tournament post data hash
pub fn tournament(post: &PostId) -> String {
    format!("tournament:{}", post)
}

/// Tournament entries (zset comment id → Elo rating)
pub fn tournament_entries(post: &PostId) -> String {
    format!("tournament:entries:{}", post)
}

/// Entry metadata hash
pub fn tournament_entry(comment: &CommentId) -> String {
    format!("tournament:entry:{}", comment)
}

/// Tournament participants (zset user → participation count)
pub fn tournament_players(post: &PostId) -> String {
    format!("tournament:players:{}", post)
}

/// Pending tournament prompts, FIFO by insertion time (zset)
pub fn tournament_hopper(community: &str) -> String {
    format!("tournament:hopper:{}", community)
}

/// Payout ledger hash (day_k → done marker)
pub fn tournament_payout_ledger(post: &PostId) -> String {
    format!("tournament:payout:ledger:{}", post)
}

/// Per-day payout lock
pub fn tournament_payout_lock(post: &PostId, day: u32) -> String {
    format!("tournament:payout:lock:{}:{}", post, day)
}

/// Per-tournament Elo update lock
pub fn tournament_elo_lock(post: &PostId) -> String {
    format!("tournament:payout:elo_lock:{}", post)
}

/// Lock guarding a community's hopper scheduler tick
pub fn tournament_scheduler_lock(community: &str) -> String {
    format!("tournament:scheduler:lock:{}", community)
}

/// Flag enabling the hopper scheduler for a community
pub fn tournament_scheduler_enabled(community: &str) -> String {
    format!("tournament:scheduler:enabled:{}", community)
}

/// Global index of tournament posts (zset post → createdAt)
pub fn tournaments_all() -> String {
    "tournaments:all".to_string()
}

// ============================================================================
// Rate limits
// ============================================================================

/// Guess submission window counter
pub fn rate_guess(user: &UserId) -> String {
    format!("rate:guess:{}", user)
}

/// Vote window counter
pub fn rate_vote(user: &UserId) -> String {
    format!("rate:vote:{}", user)
}

/// Entry submission window counter
pub fn rate_submit(user: &UserId) -> String {
    format!("rate:submit:{}", user)
}
