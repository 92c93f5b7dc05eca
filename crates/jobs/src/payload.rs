//! Job payload contracts
//!
//! All payloads are JSON-shaped. Unknown fields are ignored on read; the
//! engine and the host platform evolve independently, so a payload carrying
//! extra fields must never fail to parse.

use scrawl_core::{PostId, UserId};
use serde::{Deserialize, Serialize};

fn default_batch_size() -> usize {
    10
}

/// `TOURNAMENT_PAYOUT` payload: one snapshot day for one tournament
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutPayload {
    /// The tournament post
    pub post_id: PostId,
    /// Snapshot day, 1-based
    pub day_index: u32,
    /// Community the tournament lives in
    #[serde(default)]
    pub community: Option<String>,
}

/// `SLATE_AGGREGATOR` payload: batch walk over communities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorPayload {
    /// Communities to process before re-enqueueing
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// True only for the cadence-scheduled kickoff job
    #[serde(default)]
    pub is_initial_job: bool,
    /// Resume after this community (follow-up jobs only)
    #[serde(default)]
    pub cursor: Option<String>,
}

impl Default for AggregatorPayload {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            is_initial_job: true,
            cursor: None,
        }
    }
}

/// `USER_LEVEL_UP` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpPayload {
    /// Who leveled up
    pub user_id: UserId,
    /// New level rank
    pub level_rank: u32,
    /// New level name
    pub level_name: String,
}

/// `SET_USER_FLAIR` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlairPayload {
    /// Whose flair to refresh
    pub user_id: UserId,
    /// Text to apply
    pub flair_text: String,
}

/// `CREATE_PINNED_POST_COMMENT` / `CREATE_TOURNAMENT_POST_COMMENT` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinnedCommentPayload {
    /// The post to pin a comment on
    pub post_id: PostId,
    /// Community the post lives in
    #[serde(default)]
    pub community: Option<String>,
}

/// `TOURNAMENT_SCHEDULER` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerTickPayload {
    /// Tick only this community; absent means every installed community
    #[serde(default)]
    pub community: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_roundtrip_camel_case() {
        let payload = PayoutPayload {
            post_id: PostId::new("t3_x"),
            day_index: 2,
            community: Some("pics".into()),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["postId"], "t3_x");
        assert_eq!(json["dayIndex"], 2);
        let back: PayoutPayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let raw = r#"{"postId": "t3_x", "dayIndex": 1, "futureField": {"a": 1}}"#;
        let payload: PayoutPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.day_index, 1);
        assert_eq!(payload.community, None);
    }

    #[test]
    fn test_aggregator_defaults() {
        let payload: AggregatorPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.batch_size, 10);
        assert!(!payload.is_initial_job);
        assert_eq!(payload.cursor, None);
    }
}
