//! Hopper scheduler
//!
//! Pending prompts sit in a FIFO sorted set scored by insertion time. A
//! periodic tick takes the community scheduler lease, pops the oldest
//! prompt, creates the tournament post, and schedules the pinned comment
//! plus every snapshot payout up front. A skipped tick costs nothing; the
//! prompt waits for the next one.

use std::time::Duration;

use tracing::{debug, info};

use scrawl_concurrency::LeaseLock;
use scrawl_core::{keys, PostId, Result};
use scrawl_jobs::{JobName, JobRequest, PayoutPayload, PinnedCommentPayload};
use scrawl_store::{Kv, Order};

use crate::tournament::TournamentService;

/// Lease TTL for one scheduler tick
const TICK_LOCK_TTL: Duration = Duration::from_secs(30);

/// What a scheduler tick did
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The community has the scheduler disabled
    Disabled,
    /// Another tick holds the scheduler lease
    Busy,
    /// The hopper is empty
    Empty,
    /// A tournament was created from the oldest prompt
    Created {
        /// The new tournament post
        post_id: PostId,
        /// The prompt it runs on
        word: String,
    },
}

impl TournamentService {
    /// Queue a prompt. Prompts normalize on insertion; re-queueing an
    /// existing prompt keeps its original position.
    pub fn add_prompt(&self, raw: &str) -> Result<bool> {
        let word = scrawl_core::normalize_word(raw)?;
        let key = keys::tournament_hopper(&self.community);
        if self.kv.z_score(&key, &word)?.is_some() {
            return Ok(false);
        }
        self.kv
            .z_add(&key, &word, self.clock.now().as_millis() as f64)?;
        debug!(community = %self.community, word = %word, "prompt queued");
        Ok(true)
    }

    /// Prompts waiting in the hopper, oldest first
    pub fn pending_prompts(&self) -> Result<Vec<String>> {
        Ok(self
            .kv
            .z_range_by_rank(
                &keys::tournament_hopper(&self.community),
                0,
                usize::MAX - 1,
                Order::Ascending,
            )?
            .into_iter()
            .map(|e| e.member)
            .collect())
    }

    /// Turn the hopper scheduler on or off for this community
    pub fn set_scheduler_enabled(&self, enabled: bool) -> Result<()> {
        self.kv.set(
            &keys::tournament_scheduler_enabled(&self.community),
            if enabled { "1" } else { "0" },
        )
    }

    /// Whether the hopper scheduler is on. Absent means off.
    pub fn scheduler_enabled(&self) -> Result<bool> {
        Ok(self
            .kv
            .get(&keys::tournament_scheduler_enabled(&self.community))?
            .as_deref()
            == Some("1"))
    }

    /// One scheduler tick: create a tournament from the oldest prompt
    pub fn scheduler_tick(&self) -> Result<TickOutcome> {
        if !self.scheduler_enabled()? {
            return Ok(TickOutcome::Disabled);
        }
        let lock = LeaseLock::new(
            self.kv.clone(),
            keys::tournament_scheduler_lock(&self.community),
        );
        if !lock.try_acquire(TICK_LOCK_TTL)? {
            return Ok(TickOutcome::Busy);
        }
        let result = self.tick_locked();
        lock.release()?;
        result
    }

    fn tick_locked(&self) -> Result<TickOutcome> {
        let hopper_key = keys::tournament_hopper(&self.community);
        let oldest = self
            .kv
            .z_range_by_rank(&hopper_key, 0, 0, Order::Ascending)?;
        let word = match oldest.into_iter().next() {
            Some(entry) => entry.member,
            None => return Ok(TickOutcome::Empty),
        };

        let now = self.clock.now();
        let post_id = self.content.submit_post(
            &self.community,
            &format!("Tournament: draw \"{}\"!", word),
        )?;
        self.kv.h_set_all(
            &keys::tournament(&post_id),
            &[
                ("type".to_string(), "tournament".to_string()),
                ("word".to_string(), word.clone()),
                ("createdAt".to_string(), now.as_millis().to_string()),
                ("votes".to_string(), "0".to_string()),
            ],
        )?;
        self.kv.global().z_add(
            &keys::tournaments_all(),
            post_id.as_str(),
            now.as_millis() as f64,
        )?;
        self.kv.z_rem(&hopper_key, &word)?;

        let pinned = PinnedCommentPayload {
            post_id: post_id.clone(),
            community: Some(self.community.clone()),
        };
        self.scheduler.run_job(JobRequest::immediate(
            JobName::CreateTournamentPostComment,
            serde_json::to_value(&pinned)?,
        ))?;

        for day in 1..=self.config.snapshot_count {
            let payload = PayoutPayload {
                post_id: post_id.clone(),
                day_index: day,
                community: Some(self.community.clone()),
            };
            self.scheduler.run_job(JobRequest::at(
                JobName::TournamentPayout,
                serde_json::to_value(&payload)?,
                now.saturating_add(self.config.payout_window() * day),
            ))?;
        }

        info!(
            community = %self.community,
            post = %post_id,
            word = %word,
            "tournament created"
        );
        Ok(TickOutcome::Created { post_id, word })
    }
}
