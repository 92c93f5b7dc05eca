//! Entry submission and removal
//!
//! The entries sorted set (comment id → rating) is the single source of
//! truth for existence; the metadata hash hangs off it and is deleted on
//! removal. Recording is idempotent by comment id; replayed submission
//! events are no-ops.

use serde_json::Value;
use tracing::{debug, info};

use scrawl_concurrency::is_rate_limited;
use scrawl_core::{keys, CommentId, Error, PostId, Result, UserId};
use scrawl_store::Kv;

use crate::platform::MediaAsset;
use crate::tournament::TournamentService;

/// Stored entry metadata
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMetadata {
    /// The tournament post
    pub post_id: PostId,
    /// The entry's author
    pub user_id: UserId,
    /// Drawing payload as submitted
    pub drawing: Value,
    /// Public media URL
    pub media_url: String,
    /// Platform media handle
    pub media_id: String,
    /// Votes won
    pub votes: i64,
    /// Times shown in a pairing
    pub views: i64,
}

impl TournamentService {
    /// Submit a drawing entry: upload media, post the comment, record the
    /// entry at the initial rating.
    ///
    /// Returns the new entry's comment id.
    pub fn submit_entry(
        &self,
        post: &PostId,
        user: &UserId,
        drawing: &Value,
        image_url: &str,
    ) -> Result<CommentId> {
        if is_rate_limited(
            &self.kv,
            &keys::rate_submit(user),
            self.config.submit_limit,
            self.config.submit_window(),
        )? {
            return Err(Error::RateLimited(
                "you are submitting too fast, give it a moment".into(),
            ));
        }

        let asset = self.media.upload(image_url, "image")?;
        let comment = self
            .content
            .submit_comment(post, "I drew this round's prompt!")?;
        self.record_entry(post, &comment.id, user, drawing, &asset)?;
        Ok(comment.id)
    }

    /// Record an entry under an existing comment id. Idempotent: a comment
    /// id already in the entries set is left untouched.
    pub fn record_entry(
        &self,
        post: &PostId,
        comment: &CommentId,
        user: &UserId,
        drawing: &Value,
        asset: &MediaAsset,
    ) -> Result<()> {
        let entries_key = keys::tournament_entries(post);
        if self.kv.z_score(&entries_key, comment.as_str())?.is_some() {
            debug!(post = %post, comment = %comment, "entry already recorded");
            return Ok(());
        }

        self.kv.h_set_all(
            &keys::tournament_entry(comment),
            &[
                ("postId".to_string(), post.as_str().to_string()),
                ("userId".to_string(), user.as_str().to_string()),
                ("drawing".to_string(), serde_json::to_string(drawing)?),
                ("mediaUrl".to_string(), asset.media_url.clone()),
                ("mediaId".to_string(), asset.media_id.clone()),
                ("votes".to_string(), "0".to_string()),
                ("views".to_string(), "0".to_string()),
            ],
        )?;
        self.kv
            .z_add(&entries_key, comment.as_str(), self.config.initial_elo)?;
        self.kv
            .z_incr_by(&keys::tournament_players(post), user.as_str(), 1.0)?;
        info!(post = %post, comment = %comment, user = %user, "entry recorded");
        Ok(())
    }

    /// Remove an entry (comment deleted or edited). Idempotent; the
    /// metadata hash goes with the sorted-set member.
    pub fn remove_entry(&self, post: &PostId, comment: &CommentId) -> Result<bool> {
        let removed = self
            .kv
            .z_rem(&keys::tournament_entries(post), comment.as_str())?;
        self.kv.del(&keys::tournament_entry(comment))?;
        if removed {
            info!(post = %post, comment = %comment, "entry removed");
        }
        Ok(removed)
    }

    /// Entry metadata, `None` when the hash is gone
    pub fn entry_metadata(&self, comment: &CommentId) -> Result<Option<EntryMetadata>> {
        let fields = self.kv.h_get_all(&keys::tournament_entry(comment))?;
        if fields.is_empty() {
            return Ok(None);
        }
        let get = |name: &str| {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };
        let drawing = serde_json::from_str(&get("drawing")).unwrap_or(Value::Null);
        Ok(Some(EntryMetadata {
            post_id: PostId::new(get("postId")),
            user_id: UserId::new(get("userId")),
            drawing,
            media_url: get("mediaUrl"),
            media_id: get("mediaId"),
            votes: get("votes").parse().unwrap_or(0),
            views: get("views").parse().unwrap_or(0),
        }))
    }

    /// Number of live entries
    pub fn entry_count(&self, post: &PostId) -> Result<usize> {
        Ok(self.kv.z_card(&keys::tournament_entries(post))?)
    }
}
