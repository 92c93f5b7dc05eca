//! End-to-end scenarios
//!
//! Drive the whole engine (store, job queue, and platform mocks) through
//! the public facade and check the system-level guarantees: deterministic
//! slates, Elo symmetry, payout idempotence, hopper FIFO consumption, ban
//! propagation, and the rate-limit boundary.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use scrawl::{
    Engine, EngineConfig, JobName, JobQueue, JobRequest, Kv, ManualClock, MemoryStore, PostId,
    Scheduler, Status, Timestamp, UserId,
};
use scrawl_engine::platform::mock::{MockContent, MockIdentity, MockMedia, MockRealtime};

struct Harness {
    clock: Arc<ManualClock>,
    store: Arc<MemoryStore>,
    queue: Arc<JobQueue>,
    identity: Arc<MockIdentity>,
    realtime: Arc<MockRealtime>,
    engine: Engine,
}

fn harness() -> Harness {
    // once per process; later calls are no-ops
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_700_000_000)));
    let store = MemoryStore::shared(clock.clone());
    let queue = JobQueue::new(clock.clone());
    let identity = Arc::new(MockIdentity::new());
    let content = Arc::new(MockContent::new());
    let media = Arc::new(MockMedia::new());
    let realtime = Arc::new(MockRealtime::new());
    let engine = Engine::new(
        store.clone(),
        clock.clone(),
        queue.clone(),
        identity.clone(),
        content,
        media,
        realtime.clone(),
        EngineConfig::default(),
    );
    engine.register_jobs(&queue);
    Harness {
        clock,
        store,
        queue,
        identity,
        realtime,
        engine,
    }
}

fn seed_entries(h: &Harness, post: &PostId, n: usize) -> Vec<(UserId, scrawl::CommentId)> {
    let community = h.engine.community("pics");
    (0..n)
        .map(|i| {
            let user = UserId::new(format!("t2_u{}", i));
            let comment = community
                .tournaments
                .submit_entry(post, &user, &json!({"strokes": i}), "https://img/x.png")
                .unwrap();
            // stay under the submission window between entries
            h.clock.advance(Duration::from_secs(30));
            (user, comment)
        })
        .collect()
}

// ============================================================================
// S1: Bandit exploration
// ============================================================================

#[test]
fn s1_slate_is_deterministic_over_unchanged_state() {
    let h = harness();
    let community = h.engine.community("pics");
    for word in ["Cat", "Dog", "Fox"] {
        community.dictionary.add_word(word).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(11);
    let first = community.bandit.generate_slate(3, &mut rng).unwrap();
    let second = community.bandit.generate_slate(3, &mut rng).unwrap();

    let mut words = first.words.clone();
    words.sort();
    assert_eq!(words, vec!["Cat", "Dog", "Fox"]);
    assert_eq!(first.id, second.id, "unchanged state must reproduce the slate id");

    // impressions flow into the funnel for every slate word
    assert!(community.bandit.record_impression(&first.id).unwrap());
}

// ============================================================================
// S2: Elo symmetry
// ============================================================================

#[test]
fn s2_vote_moves_sixteen_points_each_way() {
    let h = harness();
    let post = PostId::new("t3_tourney");
    let entries = seed_entries(&h, &post, 2);

    let outcome = h
        .engine
        .community("pics")
        .tournaments
        .vote(&post, &UserId::new("t2_voter"), &entries[0].1, &entries[1].1)
        .unwrap();

    assert_eq!(outcome.winner_rating, 1216.0);
    assert_eq!(outcome.loser_rating, 1184.0);
    assert_eq!(outcome.winner_rating + outcome.loser_rating, 2400.0);
}

// ============================================================================
// S3: Snapshot idempotence
// ============================================================================

#[test]
fn s3_double_payout_pays_once() {
    let h = harness();
    let post = PostId::new("t3_tourney");
    let entries = seed_entries(&h, &post, 10);
    let community = h.engine.community("pics");

    // push two entries to the top with deterministic ratings
    let voters: Vec<UserId> = (0..8).map(|i| UserId::new(format!("t2_v{}", i))).collect();
    for voter in &voters[..5] {
        community
            .tournaments
            .vote(&post, voter, &entries[0].1, &entries[9].1)
            .unwrap();
        h.clock.advance(Duration::from_secs(2));
    }
    for voter in &voters[5..] {
        community
            .tournaments
            .vote(&post, voter, &entries[1].1, &entries[8].1)
            .unwrap();
        h.clock.advance(Duration::from_secs(2));
    }

    let before: Vec<i64> = entries
        .iter()
        .map(|(user, _)| h.engine.progression().get_score(user).unwrap())
        .collect();

    community.tournaments.award_payout(&post, 1).unwrap();
    community.tournaments.award_payout(&post, 1).unwrap();

    // top two gained exactly 150 and 100 across both calls
    assert_eq!(
        h.engine.progression().get_score(&entries[0].0).unwrap() - before[0],
        150
    );
    assert_eq!(
        h.engine.progression().get_score(&entries[1].0).unwrap() - before[1],
        100
    );
    // everyone below the cutoff gained nothing from the payout
    assert_eq!(
        h.engine.progression().get_score(&entries[5].0).unwrap(),
        before[5]
    );
}

// ============================================================================
// S4: Hopper consumption through the job queue
// ============================================================================

#[test]
fn s4_scheduler_ticks_consume_hopper_fifo() {
    let h = harness();
    let community = h.engine.install_community("pics").unwrap();
    community.tournaments.set_scheduler_enabled(true).unwrap();
    for word in ["Alpha", "Beta", "Gamma"] {
        community.tournaments.add_prompt(word).unwrap();
        h.clock.advance(Duration::from_secs(1));
    }

    for _ in 0..2 {
        h.queue
            .run_job(JobRequest::immediate(
                JobName::TournamentScheduler,
                json!({"community": "pics"}),
            ))
            .unwrap();
        assert_eq!(h.queue.tick(), 1);
        // drain the pinned-comment job the tick scheduled
        assert_eq!(h.queue.tick(), 1);
        h.clock.advance(Duration::from_secs(60));
    }

    assert_eq!(community.tournaments.pending_prompts().unwrap(), vec!["Gamma"]);

    // the two created tournaments carry the prompts in FIFO order
    let created: Vec<String> = h
        .store
        .z_range_by_rank("tournaments:all", 0, 10, scrawl_store::Order::Ascending)
        .unwrap()
        .iter()
        .map(|e| {
            h.store
                .h_get(&format!("pics:tournament:{}", e.member), "word")
                .unwrap()
                .unwrap()
        })
        .collect();
    assert_eq!(created, vec!["Alpha", "Beta"]);

    // three payout days remain scheduled per tournament
    let pending = h.queue.stats().pending;
    assert_eq!(pending, 2 * 3);
}

#[test]
fn s4b_scheduled_payouts_fire_and_close_their_days() {
    let h = harness();
    let community = h.engine.install_community("pics").unwrap();
    community.tournaments.set_scheduler_enabled(true).unwrap();
    community.tournaments.add_prompt("Alpha").unwrap();

    h.queue
        .run_job(JobRequest::immediate(
            JobName::TournamentScheduler,
            json!({"community": "pics"}),
        ))
        .unwrap();
    h.queue.tick();

    // run the pinned-comment job now; payouts are due over the next 3 days
    h.queue.tick();
    for _ in 0..3 {
        h.clock.advance(Duration::from_secs(24 * 3600));
        h.queue.tick();
    }
    let stats = h.queue.stats();
    assert_eq!(stats.pending, 0, "all scheduled jobs drained");
    assert_eq!(stats.failed, 0, "payouts on an empty tournament must not fail");
}

// ============================================================================
// S5: Ban propagation
// ============================================================================

#[test]
fn s5_ban_propagates_across_forms_and_commands() {
    let h = harness();
    let moderator = UserId::new("t2_mod");
    h.identity.add_plain_user("t2_mod", "mod_mary");
    h.identity.make_moderator(&moderator);
    let community = h.engine.community("pics");

    let response = h.engine.handle_command("pics", &moderator, "!ban Meat Loaf");
    assert_eq!(response.status, Status::Success);

    assert!(community.dictionary.is_word_banned("MEAT LOAF").unwrap());
    assert!(community.dictionary.add_word("meat loaf").is_err());
    assert!(!community.dictionary.is_word_active("Meat Loaf").unwrap());
    assert_eq!(
        h.store
            .z_score("pics:words:uncertainty:pics", "Meat Loaf")
            .unwrap(),
        None
    );

    // a non-moderator cannot ban
    let pleb = UserId::new("t2_pleb");
    h.identity.add_plain_user("t2_pleb", "pleb");
    let response = h.engine.handle_command("pics", &pleb, "!ban Cat");
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.code, 400);
}

// ============================================================================
// S6: Rate limit boundary
// ============================================================================

#[test]
fn s6_limiter_boundary_is_exact() {
    let h = harness();
    let kv = scrawl::StoreHandle::new(h.store.clone() as Arc<dyn Kv>);
    let results: Vec<bool> = (0..5)
        .map(|_| {
            scrawl_concurrency::is_rate_limited(&kv, "rate:guess:t2_u1", 3, Duration::from_secs(1))
                .unwrap()
        })
        .collect();
    assert_eq!(results, vec![false, false, false, true, true]);
}

// ============================================================================
// Cross-cutting flows
// ============================================================================

#[test]
fn slate_funnel_feeds_score_update_through_aggregator_job() {
    let h = harness();
    let community = h.engine.install_community("pics").unwrap();
    let bandit = &community.bandit;

    let mut rng = StdRng::seed_from_u64(5);
    let slate = bandit.generate_slate(3, &mut rng).unwrap();
    bandit.record_impression(&slate.id).unwrap();
    bandit.record_pick(&slate.words[0]).unwrap();
    bandit.record_publish(&slate.words[0]).unwrap();

    h.queue
        .run_job(JobRequest::immediate(
            JobName::SlateAggregator,
            json!({"batchSize": 10, "isInitialJob": true}),
        ))
        .unwrap();
    assert_eq!(h.queue.tick(), 1);
    assert_eq!(h.queue.stats().failed, 0);

    // the picked word outranks its unpicked slate mates
    let picked_score = h
        .store
        .z_score("pics:words:all:pics", &slate.words[0])
        .unwrap()
        .unwrap();
    let other_score = h
        .store
        .z_score("pics:words:all:pics", &slate.words[1])
        .unwrap()
        .unwrap();
    assert!(picked_score > other_score);
}

#[test]
fn level_up_flows_through_queue_to_realtime() {
    let h = harness();
    let user = UserId::new("t2_u1");
    h.engine.progression().increment_score(&user, 120).unwrap();

    // USER_LEVEL_UP and SET_USER_FLAIR were enqueued; the engine handles
    // the first, the host owns the second
    assert_eq!(h.queue.tick(), 2);
    let sent = h.realtime.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "user:t2_u1");
    assert_eq!(sent[0].1["type"], "level_up");
    assert_eq!(sent[0].1["rank"], 2);
}

#[test]
fn guess_solve_and_leaderboard_roundtrip() {
    let h = harness();
    h.identity.add_plain_user("t2_artist", "arty");
    h.identity.add_plain_user("t2_guesser", "guessy");
    let community = h.engine.community("pics");
    let post = PostId::new("t3_drawing");
    let artist = UserId::new("t2_artist");
    let guesser = UserId::new("t2_guesser");

    community.drawings.create_drawing(&post, &artist, "Cat").unwrap();
    community.bandit.record_publish("Cat").unwrap();
    let outcome = community.drawings.submit_guess(&post, &guesser, "cat").unwrap();
    assert_eq!(
        outcome,
        scrawl_engine::GuessOutcome::Correct {
            already_solved: false,
            first_solver: true
        }
    );

    let rows = h.engine.progression().get_leaderboard(10, 0).unwrap();
    assert_eq!(rows[0].username, "guessy");
    assert_eq!(rows[0].score, 15);
    assert_eq!(rows[1].username, "arty");
    assert_eq!(rows[1].score, 10);
}

#[test]
fn entry_removal_keeps_zset_as_source_of_truth() {
    let h = harness();
    let post = PostId::new("t3_tourney");
    let entries = seed_entries(&h, &post, 3);
    let community = h.engine.community("pics");

    community
        .on_comment_deleted(Some(&post), &entries[1].1)
        .unwrap();
    assert_eq!(community.tournaments.entry_count(&post).unwrap(), 2);
    assert!(community
        .tournaments
        .entry_metadata(&entries[1].1)
        .unwrap()
        .is_none());

    // votes against the removed entry now fail cleanly
    let err = community
        .tournaments
        .vote(&post, &UserId::new("t2_voter"), &entries[0].1, &entries[1].1)
        .unwrap_err();
    assert_eq!(err.http_status(), 400);
}
