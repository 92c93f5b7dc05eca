//! Snapshot payouts
//!
//! One payout per `{tournament, day}`, enforced twice over: a lease lock
//! keeps concurrent runs out, and a ledger flag checked inside the lock
//! makes re-delivery a no-op. Awards are monotone score adds and are never
//! rolled back. A crash between awards and the ledger write can duplicate
//! at most one run; under the single-scheduler deployments this targets,
//! the combination is effectively once.

use tracing::{info, warn};

use scrawl_concurrency::LeaseLock;
use scrawl_core::{keys, CommentId, PostId, Result, UserId};
use scrawl_store::{Kv, Order};

use crate::tournament::TournamentService;

/// What a payout invocation did
#[derive(Debug, Clone, PartialEq)]
pub enum PayoutStatus {
    /// Awards landed; who got how much, best rank first
    Paid(Vec<(UserId, i64)>),
    /// The ledger already marks this day done
    AlreadyPaid,
    /// Another invocation holds the payout lock
    AlreadyRunning,
    /// No entries to pay; the day is marked done
    NoEntries,
}

impl TournamentService {
    /// Run the day-`k` snapshot payout for a tournament
    pub fn award_payout(&self, post: &PostId, day: u32) -> Result<PayoutStatus> {
        let lock = LeaseLock::new(self.kv.clone(), keys::tournament_payout_lock(post, day));
        if !lock.try_acquire(self.config.payout_window())? {
            return Ok(PayoutStatus::AlreadyRunning);
        }
        let result = self.award_payout_locked(post, day);
        lock.release()?;
        result
    }

    fn award_payout_locked(&self, post: &PostId, day: u32) -> Result<PayoutStatus> {
        let ledger_key = keys::tournament_payout_ledger(post);
        let ledger_field = format!("day_{}", day);
        if self.kv.h_get(&ledger_key, &ledger_field)?.is_some() {
            return Ok(PayoutStatus::AlreadyPaid);
        }

        let entries_key = keys::tournament_entries(post);
        let entry_count = self.kv.z_card(&entries_key)?;
        if entry_count == 0 {
            self.kv.h_set(&ledger_key, &ledger_field, "1")?;
            return Ok(PayoutStatus::NoEntries);
        }

        let cutoff = ((entry_count * self.config.top_percent as usize) / 100).max(1);
        let top = self
            .kv
            .z_range_by_rank(&entries_key, 0, cutoff - 1, Order::Descending)?;

        let mut paid = Vec::with_capacity(top.len());
        for (rank, entry) in top.iter().enumerate() {
            let comment = CommentId::new(entry.member.clone());
            let Some(meta) = self.entry_metadata(&comment)? else {
                warn!(post = %post, comment = %comment, "paying entry without metadata, skipping");
                continue;
            };
            let amount = self.config.top_reward
                + self.config.ladder_bonus.get(rank).copied().unwrap_or(0);
            // flat awards: snapshot rewards ignore multipliers
            self.progression.increment_score_raw(&meta.user_id, amount)?;
            paid.push((meta.user_id, amount));
        }

        self.kv.h_set(&ledger_key, &ledger_field, "1")?;

        let summary = payout_summary(day, &paid);
        if let Err(e) = self.content.submit_comment(post, &summary) {
            warn!(post = %post, day, error = %e, "payout summary comment failed");
        }
        info!(post = %post, day, recipients = paid.len(), "snapshot payout complete");
        Ok(PayoutStatus::Paid(paid))
    }
}

fn payout_summary(day: u32, paid: &[(UserId, i64)]) -> String {
    let mut lines = vec![format!("Day {} results are in!", day)];
    for (rank, (user, amount)) in paid.iter().enumerate() {
        lines.push(format!("{}. {}: {} points", rank + 1, user, amount));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::testutil::fixture;
    use serde_json::json;
    use std::time::Duration;

    fn seed_rated_entries(
        f: &crate::tournament::testutil::Fixture,
        post: &PostId,
        n: usize,
    ) -> Vec<UserId> {
        (0..n)
            .map(|i| {
                let comment = CommentId::new(format!("t1_e{}", i));
                let user = UserId::new(format!("t2_u{}", i));
                f.tournaments
                    .record_entry(
                        post,
                        &comment,
                        &user,
                        &json!({}),
                        &crate::platform::MediaAsset {
                            media_id: format!("m{}", i),
                            media_url: format!("https://img/{}", i),
                        },
                    )
                    .unwrap();
                // rating descends with index so rank order is deterministic
                f.tournaments
                    .kv
                    .z_add(
                        &keys::tournament_entries(post),
                        comment.as_str(),
                        1500.0 - i as f64 * 10.0,
                    )
                    .unwrap();
                user
            })
            .collect()
    }

    #[test]
    fn test_payout_pays_top_percent_with_ladder() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 10);
        // 20% of 10 entries → 2 paid
        let status = f.tournaments.award_payout(&post, 1).unwrap();
        let PayoutStatus::Paid(paid) = status else {
            panic!("expected Paid, got {:?}", status);
        };
        assert_eq!(paid.len(), 2);
        assert_eq!(paid[0], (users[0].clone(), 150));
        assert_eq!(paid[1], (users[1].clone(), 100));
        assert_eq!(f.progression.get_score(&users[0]).unwrap(), 150);
        assert_eq!(f.progression.get_score(&users[1]).unwrap(), 100);
        assert_eq!(f.progression.get_score(&users[2]).unwrap(), 0);
    }

    #[test]
    fn test_payout_is_idempotent_per_day() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 10);
        f.tournaments.award_payout(&post, 1).unwrap();
        let second = f.tournaments.award_payout(&post, 1).unwrap();
        assert_eq!(second, PayoutStatus::AlreadyPaid);
        // scores unchanged by the replay
        assert_eq!(f.progression.get_score(&users[0]).unwrap(), 150);
        assert_eq!(f.progression.get_score(&users[1]).unwrap(), 100);
    }

    #[test]
    fn test_each_day_pays_independently() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 10);
        f.tournaments.award_payout(&post, 1).unwrap();
        f.tournaments.award_payout(&post, 2).unwrap();
        assert_eq!(f.progression.get_score(&users[0]).unwrap(), 300);
    }

    #[test]
    fn test_small_tournament_pays_at_least_one() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 2);
        let status = f.tournaments.award_payout(&post, 1).unwrap();
        let PayoutStatus::Paid(paid) = status else {
            panic!("expected Paid");
        };
        // floor(2 * 20 / 100) = 0, clamped to 1
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].0, users[0]);
    }

    #[test]
    fn test_empty_tournament_marks_done() {
        let f = fixture();
        let post = PostId::new("t3_t");
        assert_eq!(
            f.tournaments.award_payout(&post, 1).unwrap(),
            PayoutStatus::NoEntries
        );
        assert_eq!(
            f.tournaments.award_payout(&post, 1).unwrap(),
            PayoutStatus::AlreadyPaid
        );
    }

    #[test]
    fn test_concurrent_payout_reports_running() {
        let f = fixture();
        let post = PostId::new("t3_t");
        seed_rated_entries(&f, &post, 4);
        let lock = LeaseLock::new(
            f.tournaments.kv.clone(),
            keys::tournament_payout_lock(&post, 1),
        );
        assert!(lock.try_acquire(Duration::from_secs(60)).unwrap());
        assert_eq!(
            f.tournaments.award_payout(&post, 1).unwrap(),
            PayoutStatus::AlreadyRunning
        );
    }

    #[test]
    fn test_summary_comment_failure_does_not_fail_payout() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 5);
        f.content.set_fail_comments(true);
        let status = f.tournaments.award_payout(&post, 1).unwrap();
        assert!(matches!(status, PayoutStatus::Paid(_)));
        assert_eq!(f.progression.get_score(&users[0]).unwrap(), 150);
        // and the ledger still closed the day
        assert_eq!(
            f.tournaments.award_payout(&post, 1).unwrap(),
            PayoutStatus::AlreadyPaid
        );
    }

    #[test]
    fn test_entry_without_metadata_is_skipped_not_fatal() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let users = seed_rated_entries(&f, &post, 5);
        // top entry's metadata vanished (comment edit race)
        f.tournaments
            .kv
            .del(&keys::tournament_entry(&CommentId::new("t1_e0")))
            .unwrap();
        let status = f.tournaments.award_payout(&post, 1).unwrap();
        let PayoutStatus::Paid(paid) = status else {
            panic!("expected Paid");
        };
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].0, users[1]);
    }
}
