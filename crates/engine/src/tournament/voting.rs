//! Pair selection and voting
//!
//! Votes are high-throughput. Everything around the rating update (the
//! vote reward, participation and vote counters) is fire-and-forget
//! monotone adds. The Elo write itself runs under a short per-tournament
//! lease: holders re-read the latest ratings, non-holders fall back to
//! their pre-read values. Either way `ΔW + ΔL = 0`, so the rating mass of
//! the tournament never drifts.

use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

use scrawl_concurrency::{is_rate_limited, LeaseLock};
use scrawl_core::{keys, CommentId, Error, PostId, Result, UserId};
use scrawl_store::{Kv, Order};

use crate::tournament::elo;
use crate::tournament::TournamentService;

/// Elo lease TTL; long enough for one read-modify-write round
const ELO_LOCK_TTL: Duration = Duration::from_secs(2);

/// Result of one vote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoteOutcome {
    /// Winner's rating after the update
    pub winner_rating: f64,
    /// Loser's rating after the update
    pub loser_rating: f64,
    /// Whether the update ran under the Elo lease
    pub locked: bool,
}

impl TournamentService {
    /// Yield `count` ordered pairs for head-to-head voting
    ///
    /// Entries are shuffled uniformly and paired off. A candidate repeating
    /// the previous pair in order is emitted swapped; one sharing an
    /// endpoint with the previous pair is discarded. Small pools relax the
    /// endpoint rule; two entries can only ever alternate.
    pub fn select_pairs<R: Rng + ?Sized>(
        &self,
        post: &PostId,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<(CommentId, CommentId)>> {
        let members: Vec<String> = self
            .kv
            .z_range_by_rank(
                &keys::tournament_entries(post),
                0,
                usize::MAX - 1,
                Order::Ascending,
            )?
            .into_iter()
            .map(|e| e.member)
            .collect();
        if members.len() < 2 {
            return Err(Error::InsufficientEntries {
                available: members.len(),
            });
        }

        let mut pairs = Vec::with_capacity(count);
        let mut prev: Option<(String, String)> = None;
        let mut queue: Vec<String> = Vec::new();
        // generous bound; only tiny pools ever get near it
        let max_attempts = count * 8 + 16;
        let mut attempts = 0;

        while pairs.len() < count && attempts < max_attempts {
            attempts += 1;
            if queue.len() < 2 {
                let mut reshuffled = members.clone();
                reshuffled.shuffle(rng);
                queue.extend(reshuffled);
            }
            let a = queue.remove(0);
            let b = queue.remove(0);
            if a == b {
                continue;
            }
            if let Some((pa, pb)) = &prev {
                if &a == pa && &b == pb {
                    // exact repeat: show the swap instead
                    pairs.push((CommentId::new(b.clone()), CommentId::new(a.clone())));
                    prev = Some((b, a));
                    continue;
                }
                let shares_endpoint = &a == pa || &a == pb || &b == pa || &b == pb;
                if shares_endpoint && members.len() > 3 {
                    continue;
                }
            }
            pairs.push((CommentId::new(a.clone()), CommentId::new(b.clone())));
            prev = Some((a, b));
        }

        // view counts are best-effort; a miss skews stats, not ratings
        for (a, b) in &pairs {
            for comment in [a, b] {
                if let Err(e) = self.kv.h_incr_by(&keys::tournament_entry(comment), "views", 1) {
                    warn!(comment = %comment, error = %e, "view count bump failed");
                }
            }
        }
        Ok(pairs)
    }

    /// Cast a vote: the winner's rating rises, the loser's falls, the voter
    /// earns the vote reward.
    pub fn vote(
        &self,
        post: &PostId,
        voter: &UserId,
        winner: &CommentId,
        loser: &CommentId,
    ) -> Result<VoteOutcome> {
        if winner == loser {
            return Err(Error::InvalidInput("an entry cannot beat itself".into()));
        }
        if is_rate_limited(
            &self.kv,
            &keys::rate_vote(voter),
            self.config.vote_limit,
            self.config.vote_window(),
        )? {
            return Err(Error::RateLimited("voting too fast".into()));
        }

        let entries_key = keys::tournament_entries(post);
        let pre_winner = self
            .kv
            .z_score(&entries_key, winner.as_str())?
            .ok_or_else(|| Error::NotFound(format!("entry {}", winner)))?;
        let pre_loser = self
            .kv
            .z_score(&entries_key, loser.as_str())?
            .ok_or_else(|| Error::NotFound(format!("entry {}", loser)))?;

        // fire-and-forget counters; a hiccup here never blocks the rating
        if let Err(e) = self.progression.increment_score(voter, self.config.vote_reward) {
            warn!(voter = %voter, error = %e, "vote reward failed");
        }
        if let Err(e) = self
            .kv
            .z_incr_by(&keys::tournament_players(post), voter.as_str(), 1.0)
        {
            warn!(voter = %voter, error = %e, "participation bump failed");
        }
        if let Err(e) = self.kv.h_incr_by(&keys::tournament(post), "votes", 1) {
            warn!(post = %post, error = %e, "tournament vote count failed");
        }
        if let Err(e) = self
            .kv
            .h_incr_by(&keys::tournament_entry(winner), "votes", 1)
        {
            warn!(comment = %winner, error = %e, "entry vote count failed");
        }

        let lock = LeaseLock::new(self.kv.clone(), keys::tournament_elo_lock(post));
        let locked = lock.try_acquire(ELO_LOCK_TTL)?;
        let (r_winner, r_loser) = if locked {
            // re-read under the lease so we update from the latest values
            (
                self.kv
                    .z_score(&entries_key, winner.as_str())?
                    .unwrap_or(pre_winner),
                self.kv
                    .z_score(&entries_key, loser.as_str())?
                    .unwrap_or(pre_loser),
            )
        } else {
            (pre_winner, pre_loser)
        };

        let delta = elo::rating_delta(self.config.elo_k, r_winner, r_loser);
        let winner_rating = r_winner + delta;
        let loser_rating = r_loser - delta;
        self.kv.z_add(&entries_key, winner.as_str(), winner_rating)?;
        self.kv.z_add(&entries_key, loser.as_str(), loser_rating)?;
        if locked {
            lock.release()?;
        }

        debug!(
            post = %post,
            winner = %winner,
            loser = %loser,
            winner_rating,
            loser_rating,
            locked,
            "vote applied"
        );
        Ok(VoteOutcome {
            winner_rating,
            loser_rating,
            locked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::testutil::fixture;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashSet;

    fn seed_entries(f: &crate::tournament::testutil::Fixture, post: &PostId, n: usize) -> Vec<CommentId> {
        (0..n)
            .map(|i| {
                let comment = CommentId::new(format!("t1_e{}", i));
                f.tournaments
                    .record_entry(
                        post,
                        &comment,
                        &UserId::new(format!("t2_u{}", i)),
                        &json!({}),
                        &crate::platform::MediaAsset {
                            media_id: format!("m{}", i),
                            media_url: format!("https://img/{}", i),
                        },
                    )
                    .unwrap();
                comment
            })
            .collect()
    }

    fn rating(f: &crate::tournament::testutil::Fixture, post: &PostId, c: &CommentId) -> f64 {
        f.tournaments
            .kv
            .z_score(&keys::tournament_entries(post), c.as_str())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_vote_elo_symmetry_at_equal_ratings() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 2);
        let outcome = f
            .tournaments
            .vote(&post, &UserId::new("t2_voter"), &entries[0], &entries[1])
            .unwrap();
        assert!(outcome.locked);
        assert_eq!(outcome.winner_rating, 1216.0);
        assert_eq!(outcome.loser_rating, 1184.0);
        assert_eq!(rating(&f, &post, &entries[0]), 1216.0);
        assert_eq!(rating(&f, &post, &entries[1]), 1184.0);
    }

    #[test]
    fn test_rating_mass_is_conserved() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 4);
        let voters: Vec<UserId> = (0..6).map(|i| UserId::new(format!("t2_v{}", i))).collect();
        for (i, voter) in voters.iter().enumerate() {
            let w = &entries[i % 4];
            let l = &entries[(i + 1) % 4];
            f.tournaments.vote(&post, voter, w, l).unwrap();
        }
        let total: f64 = f
            .tournaments
            .kv
            .z_range_by_rank(&keys::tournament_entries(&post), 0, 10, Order::Ascending)
            .unwrap()
            .iter()
            .map(|e| e.score)
            .sum();
        assert!((total - 4.0 * 1200.0).abs() < 1e-6);
    }

    #[test]
    fn test_vote_rewards_voter() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 2);
        let voter = UserId::new("t2_voter");
        f.tournaments
            .vote(&post, &voter, &entries[0], &entries[1])
            .unwrap();
        assert_eq!(f.progression.get_score(&voter).unwrap(), 1);
        // counters moved
        assert_eq!(
            f.tournaments
                .kv
                .h_get(&keys::tournament(&post), "votes")
                .unwrap()
                .as_deref(),
            Some("1")
        );
        let meta = f.tournaments.entry_metadata(&entries[0]).unwrap().unwrap();
        assert_eq!(meta.votes, 1);
    }

    #[test]
    fn test_vote_without_lock_uses_preread_ratings() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 2);
        // someone else holds the Elo lease
        let lock = LeaseLock::new(f.tournaments.kv.clone(), keys::tournament_elo_lock(&post));
        assert!(lock.try_acquire(Duration::from_secs(60)).unwrap());
        let outcome = f
            .tournaments
            .vote(&post, &UserId::new("t2_voter"), &entries[0], &entries[1])
            .unwrap();
        assert!(!outcome.locked);
        assert_eq!(outcome.winner_rating, 1216.0);
        // fallback path must not release someone else's lease
        assert!(!lock.try_acquire(Duration::from_secs(60)).unwrap());
    }

    #[test]
    fn test_vote_rate_limit() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 2);
        let voter = UserId::new("t2_voter");
        for _ in 0..3 {
            f.tournaments
                .vote(&post, &voter, &entries[0], &entries[1])
                .unwrap();
        }
        let err = f
            .tournaments
            .vote(&post, &voter, &entries[0], &entries[1])
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited(_)));
    }

    #[test]
    fn test_vote_on_missing_entry_is_not_found() {
        let f = fixture();
        let post = PostId::new("t3_t");
        let entries = seed_entries(&f, &post, 2);
        let err = f
            .tournaments
            .vote(
                &post,
                &UserId::new("t2_voter"),
                &entries[0],
                &CommentId::new("t1_gone"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_pair_selection_counts_views() {
        let f = fixture();
        let post = PostId::new("t3_t");
        seed_entries(&f, &post, 2);
        let mut rng = StdRng::seed_from_u64(1);
        let pairs = f.tournaments.select_pairs(&post, 1, &mut rng).unwrap();
        let (a, b) = &pairs[0];
        for comment in [a, b] {
            let meta = f.tournaments.entry_metadata(comment).unwrap().unwrap();
            assert_eq!(meta.views, 1);
        }
    }

    #[test]
    fn test_pair_selection_yields_disjoint_pairs() {
        let f = fixture();
        let post = PostId::new("t3_t");
        seed_entries(&f, &post, 8);
        let mut rng = StdRng::seed_from_u64(9);
        let pairs = f.tournaments.select_pairs(&post, 3, &mut rng).unwrap();
        assert_eq!(pairs.len(), 3);
        for (a, b) in &pairs {
            assert_ne!(a, b);
        }
        for window in pairs.windows(2) {
            let (a1, b1) = &window[0];
            let (a2, b2) = &window[1];
            let endpoints: HashSet<&CommentId> = [a1, b1].into_iter().collect();
            assert!(
                !endpoints.contains(a2) && !endpoints.contains(b2),
                "consecutive pairs share an endpoint: {:?}",
                window
            );
        }
    }

    #[test]
    fn test_pair_selection_with_two_entries_alternates() {
        let f = fixture();
        let post = PostId::new("t3_t");
        seed_entries(&f, &post, 2);
        let mut rng = StdRng::seed_from_u64(5);
        let pairs = f.tournaments.select_pairs(&post, 4, &mut rng).unwrap();
        assert!(!pairs.is_empty());
        for window in pairs.windows(2) {
            assert_ne!(window[0], window[1], "exact pair repeated in order");
        }
    }

    #[test]
    fn test_pair_selection_needs_two_entries() {
        let f = fixture();
        let post = PostId::new("t3_t");
        seed_entries(&f, &post, 1);
        let mut rng = StdRng::seed_from_u64(5);
        let err = f.tournaments.select_pairs(&post, 1, &mut rng).unwrap_err();
        assert!(matches!(err, Error::InsufficientEntries { available: 1 }));
    }
}
