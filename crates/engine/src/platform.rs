//! External collaborator traits
//!
//! The engine never talks to the host platform directly; it goes through
//! these seams. Identity results are cached in the KV layer with long
//! TTLs: the identity service is slow and users do not rename often.
//!
//! [`mock`] holds in-memory implementations used across the test suites.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use scrawl_concurrency::cached;
use scrawl_core::{keys, CommentId, PostId, Result, UserId};
use scrawl_store::StoreHandle;
use std::sync::Arc;

/// TTL for cached usernames
const USERNAME_CACHE_TTL: Duration = Duration::from_secs(90 * 24 * 3600);
/// TTL for cached moderator status
const MOD_CACHE_TTL: Duration = Duration::from_secs(10 * 24 * 3600);
/// TTL for cached admin status
const ADMIN_CACHE_TTL: Duration = Duration::from_secs(24 * 3600);

/// A resolved platform user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable user id
    pub id: UserId,
    /// Current username
    pub username: String,
    /// Whether the user is a platform admin
    pub is_admin: bool,
}

/// Username ↔ user-id resolution and privilege lookup
pub trait Identity: Send + Sync {
    /// Resolve a user by id
    fn get_user_by_id(&self, id: &UserId) -> Result<UserInfo>;
    /// Resolve a user by username
    fn get_user_by_username(&self, username: &str) -> Result<UserInfo>;
    /// Moderators of a community
    fn get_moderators(&self, community: &str) -> Result<Vec<UserId>>;
}

/// A comment accepted by the content collaborator
#[derive(Debug, Clone, PartialEq)]
pub struct SubmittedComment {
    /// The new comment's id
    pub id: CommentId,
}

/// Post and comment operations on the host platform
pub trait Content: Send + Sync {
    /// Create a post; returns its id
    fn submit_post(&self, community: &str, title: &str) -> Result<PostId>;
    /// Create a comment under a post
    fn submit_comment(&self, post: &PostId, text: &str) -> Result<SubmittedComment>;
    /// Mark a comment as from the community team
    fn distinguish_comment(&self, comment: &CommentId) -> Result<()>;
    /// Replace a comment's text
    fn edit_comment(&self, comment: &CommentId, text: &str) -> Result<()>;
}

/// An uploaded media asset
#[derive(Debug, Clone, PartialEq)]
pub struct MediaAsset {
    /// Platform media handle
    pub media_id: String,
    /// Public URL
    pub media_url: String,
}

/// Media upload collaborator
pub trait Media: Send + Sync {
    /// Upload media by URL; `kind` is the platform media type
    fn upload(&self, url: &str, kind: &str) -> Result<MediaAsset>;
}

/// Fire-and-forget realtime channel
pub trait Realtime: Send + Sync {
    /// Publish a payload on a channel; failures are non-fatal to callers
    fn send(&self, channel: &str, payload: &Value) -> Result<()>;
}

/// Identity lookups memoized in the shared KV cache
#[derive(Clone)]
pub struct CachedIdentity {
    inner: Arc<dyn Identity>,
    kv: StoreHandle,
}

impl CachedIdentity {
    /// Wrap an identity collaborator with the global-namespace cache
    pub fn new(inner: Arc<dyn Identity>, kv: StoreHandle) -> Self {
        Self {
            inner,
            kv: kv.global(),
        }
    }

    /// The uncached collaborator
    pub fn inner(&self) -> &Arc<dyn Identity> {
        &self.inner
    }

    /// Username for a user id (cached 90 days)
    pub fn username(&self, id: &UserId) -> Result<String> {
        cached(&self.kv, &keys::user_name(id), USERNAME_CACHE_TTL, || {
            Ok(self.inner.get_user_by_id(id)?.username)
        })
    }

    /// Whether the user is a platform admin (cached 1 day)
    pub fn is_admin(&self, id: &UserId) -> Result<bool> {
        cached(&self.kv, &keys::user_admin(id), ADMIN_CACHE_TTL, || {
            Ok(self.inner.get_user_by_id(id)?.is_admin)
        })
    }

    /// Whether the user moderates the community (cached 10 days)
    pub fn is_moderator(&self, community: &str, id: &UserId) -> Result<bool> {
        cached(&self.kv, &keys::user_mod(id), MOD_CACHE_TTL, || {
            Ok(self.inner.get_moderators(community)?.contains(id))
        })
    }
}

pub mod mock {
    //! In-memory collaborators for tests

    use super::*;
    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;
    use scrawl_core::Error;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    /// Identity collaborator backed by a user table
    #[derive(Default)]
    pub struct MockIdentity {
        users: Mutex<FxHashMap<String, UserInfo>>,
        moderators: Mutex<HashSet<String>>,
    }

    impl MockIdentity {
        /// Empty identity table
        pub fn new() -> Self {
            Self::default()
        }

        /// Register a user
        pub fn add_user(&self, info: UserInfo) {
            self.users.lock().insert(info.id.as_str().to_string(), info);
        }

        /// Register a plain (non-admin) user by id and name
        pub fn add_plain_user(&self, id: &str, username: &str) {
            self.add_user(UserInfo {
                id: UserId::new(id),
                username: username.to_string(),
                is_admin: false,
            });
        }

        /// Grant moderator status
        pub fn make_moderator(&self, id: &UserId) {
            self.moderators.lock().insert(id.as_str().to_string());
        }
    }

    impl Identity for MockIdentity {
        fn get_user_by_id(&self, id: &UserId) -> Result<UserInfo> {
            self.users
                .lock()
                .get(id.as_str())
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("user {}", id)))
        }

        fn get_user_by_username(&self, username: &str) -> Result<UserInfo> {
            self.users
                .lock()
                .values()
                .find(|u| u.username == username)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("username {}", username)))
        }

        fn get_moderators(&self, _community: &str) -> Result<Vec<UserId>> {
            Ok(self
                .moderators
                .lock()
                .iter()
                .map(|id| UserId::new(id.clone()))
                .collect())
        }
    }

    /// Content collaborator that mints sequential ids and records everything
    #[derive(Default)]
    pub struct MockContent {
        next_id: AtomicU64,
        fail_comments: AtomicBool,
        /// (community, title, post id) of every submitted post
        pub posts: Mutex<Vec<(String, String, PostId)>>,
        /// (post, comment id, text) of every submitted comment
        pub comments: Mutex<Vec<(PostId, CommentId, String)>>,
        /// Comments marked distinguished
        pub distinguished: Mutex<Vec<CommentId>>,
        /// (comment, new text) of every edit
        pub edits: Mutex<Vec<(CommentId, String)>>,
    }

    impl MockContent {
        /// Fresh recorder
        pub fn new() -> Self {
            Self::default()
        }

        /// Make comment submission fail until cleared
        pub fn set_fail_comments(&self, fail: bool) {
            self.fail_comments.store(fail, Ordering::SeqCst);
        }
    }

    impl Content for MockContent {
        fn submit_post(&self, community: &str, title: &str) -> Result<PostId> {
            let id = PostId::new(format!("t3_{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
            self.posts
                .lock()
                .push((community.to_string(), title.to_string(), id.clone()));
            Ok(id)
        }

        fn submit_comment(&self, post: &PostId, text: &str) -> Result<SubmittedComment> {
            if self.fail_comments.load(Ordering::SeqCst) {
                return Err(Error::Transient("comment service down".into()));
            }
            let id = CommentId::new(format!("t1_{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
            self.comments
                .lock()
                .push((post.clone(), id.clone(), text.to_string()));
            Ok(SubmittedComment { id })
        }

        fn distinguish_comment(&self, comment: &CommentId) -> Result<()> {
            self.distinguished.lock().push(comment.clone());
            Ok(())
        }

        fn edit_comment(&self, comment: &CommentId, text: &str) -> Result<()> {
            self.edits.lock().push((comment.clone(), text.to_string()));
            Ok(())
        }
    }

    /// Media collaborator that fabricates asset handles
    #[derive(Default)]
    pub struct MockMedia {
        next_id: AtomicU64,
        /// Every uploaded source URL
        pub uploads: Mutex<Vec<String>>,
    }

    impl MockMedia {
        /// Fresh recorder
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl Media for MockMedia {
        fn upload(&self, url: &str, _kind: &str) -> Result<MediaAsset> {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.uploads.lock().push(url.to_string());
            Ok(MediaAsset {
                media_id: format!("media-{}", n),
                media_url: format!("https://media.invalid/{}", n),
            })
        }
    }

    /// Realtime collaborator recording sends, optionally failing
    #[derive(Default)]
    pub struct MockRealtime {
        fail: AtomicBool,
        /// (channel, payload) of every send
        pub sent: Mutex<Vec<(String, Value)>>,
    }

    impl MockRealtime {
        /// Fresh recorder
        pub fn new() -> Self {
            Self::default()
        }

        /// Make sends fail until cleared
        pub fn set_fail(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl Realtime for MockRealtime {
        fn send(&self, channel: &str, payload: &Value) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::Transient("realtime down".into()));
            }
            self.sent.lock().push((channel.to_string(), payload.clone()));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use scrawl_core::{ManualClock, Timestamp};
    use scrawl_store::MemoryStore;

    fn setup() -> (Arc<MockIdentity>, CachedIdentity) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(0)));
        let kv = StoreHandle::new(MemoryStore::shared(clock));
        let identity = Arc::new(MockIdentity::new());
        identity.add_plain_user("t2_u1", "alice");
        let cached = CachedIdentity::new(identity.clone() as Arc<dyn Identity>, kv);
        (identity, cached)
    }

    #[test]
    fn test_username_served_from_cache_after_first_lookup() {
        let (identity, cached) = setup();
        let user = UserId::new("t2_u1");
        assert_eq!(cached.username(&user).unwrap(), "alice");
        // rename upstream; the cache keeps serving the old name
        identity.add_plain_user("t2_u1", "alice_renamed");
        assert_eq!(cached.username(&user).unwrap(), "alice");
    }

    #[test]
    fn test_moderator_lookup_cached() {
        let (identity, cached) = setup();
        let user = UserId::new("t2_u1");
        assert!(!cached.is_moderator("pics", &user).unwrap());
        // promotion is invisible until the cache lapses
        identity.make_moderator(&user);
        assert!(!cached.is_moderator("pics", &user).unwrap());
    }

    #[test]
    fn test_unknown_user_propagates_not_found() {
        let (_, cached) = setup();
        assert!(cached.username(&UserId::new("t2_nobody")).is_err());
    }
}
