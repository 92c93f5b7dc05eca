//! Chat-command handling through the engine facade

use std::sync::Arc;

use scrawl_api::{Engine, EngineConfig, ManualClock, MemoryStore, Status, Timestamp, UserId};
use scrawl_engine::platform::mock::{MockContent, MockIdentity, MockMedia, MockRealtime};
use scrawl_jobs::RecordingScheduler;

struct Fixture {
    identity: Arc<MockIdentity>,
    engine: Engine,
}

fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_000_000)));
    let store = MemoryStore::shared(clock.clone());
    let identity = Arc::new(MockIdentity::new());
    let engine = Engine::new(
        store,
        clock,
        Arc::new(RecordingScheduler::new()),
        identity.clone(),
        Arc::new(MockContent::new()),
        Arc::new(MockMedia::new()),
        Arc::new(MockRealtime::new()),
        EngineConfig::default(),
    );
    Fixture { identity, engine }
}

fn moderator(f: &Fixture) -> UserId {
    let user = UserId::new("t2_mod");
    f.identity.add_plain_user("t2_mod", "mod_mary");
    f.identity.make_moderator(&user);
    user
}

#[test]
fn moderator_can_add_remove_and_ban() {
    let f = fixture();
    let user = moderator(&f);

    let response = f.engine.handle_command("pics", &user, "!add meat loaf");
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.code, 200);

    let response = f.engine.handle_command("pics", &user, "!words");
    assert_eq!(response.data["words"], serde_json::json!(["Meat Loaf"]));

    let response = f.engine.handle_command("pics", &user, "!remove meat loaf");
    assert_eq!(response.status, Status::Success);

    let response = f.engine.handle_command("pics", &user, "!ban gun");
    assert_eq!(response.status, Status::Success);
    assert!(f
        .engine
        .community("pics")
        .dictionary
        .is_word_banned("Gun")
        .unwrap());
}

#[test]
fn duplicate_add_is_skipped_not_error() {
    let f = fixture();
    let user = moderator(&f);
    f.engine.handle_command("pics", &user, "!add cat");
    let response = f.engine.handle_command("pics", &user, "!add CAT");
    assert_eq!(response.status, Status::Skipped);
    assert_eq!(response.code, 200);
}

#[test]
fn low_level_user_cannot_add_until_leveled() {
    let f = fixture();
    let user = UserId::new("t2_newbie");
    f.identity.add_plain_user("t2_newbie", "newbie");

    let response = f.engine.handle_command("pics", &user, "!add cat");
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.code, 400);

    // level 2 starts at 100 points
    f.engine.progression().increment_score(&user, 150).unwrap();
    let response = f.engine.handle_command("pics", &user, "!add cat");
    assert_eq!(response.status, Status::Success);
}

#[test]
fn non_moderator_cannot_remove_or_ban() {
    let f = fixture();
    let user = UserId::new("t2_pleb");
    f.identity.add_plain_user("t2_pleb", "pleb");
    for input in ["!remove cat", "!ban cat"] {
        let response = f.engine.handle_command("pics", &user, input);
        assert_eq!(response.status, Status::Error, "{} must be gated", input);
        assert_eq!(response.code, 400);
    }
}

#[test]
fn unknown_command_and_bad_arguments_are_client_errors() {
    let f = fixture();
    let user = moderator(&f);
    for input in ["!frobnicate", "!add", "!add    ", "!words extra"] {
        let response = f.engine.handle_command("pics", &user, input);
        assert_eq!(response.status, Status::Error, "{:?}", input);
        assert_eq!(response.code, 400);
    }
}

#[test]
fn overlong_word_is_rejected_by_normalization() {
    let f = fixture();
    let user = moderator(&f);
    let long = format!("!add {}", "a".repeat(51));
    let response = f.engine.handle_command("pics", &user, &long);
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.code, 400);
}
