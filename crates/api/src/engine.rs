//! Engine facade
//!
//! Wires the shared store, clock, scheduler, and platform collaborators
//! into per-community service bundles, dispatches chat commands, and
//! registers the background job handlers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use scrawl_core::{keys, Clock, CommentId, Error, PostId, Result, UserId};
use scrawl_dictionary::Dictionary;
use scrawl_engine::platform::{Content, Identity, Media, Realtime};
use scrawl_engine::{
    Bandit, CachedIdentity, Drawings, EngineConfig, Effects, Progression, TournamentService,
};
use scrawl_jobs::{
    AggregatorPayload, Deadline, JobContext, JobName, JobQueue, JobRequest, PayoutPayload,
    PinnedCommentPayload, Scheduler, SchedulerTickPayload,
};
use scrawl_store::{Kv, Order, StoreHandle};

use crate::command::ChatCommand;
use crate::response::ApiResponse;

/// Budget for dictionary-mutating commands
const COMMAND_BUDGET: Duration = Duration::from_secs(10);
/// Budget for read-only commands
const READ_BUDGET: Duration = Duration::from_secs(3);

/// The wired-up engine
#[derive(Clone)]
pub struct Engine {
    root: StoreHandle,
    clock: Arc<dyn Clock>,
    scheduler: Arc<dyn Scheduler>,
    identity: CachedIdentity,
    content: Arc<dyn Content>,
    media: Arc<dyn Media>,
    realtime: Arc<dyn Realtime>,
    config: Arc<EngineConfig>,
    effects: Effects,
    progression: Progression,
}

/// Services bundled for one community
#[derive(Clone)]
pub struct Community {
    /// The community name
    name: String,
    /// Word dictionary
    pub dictionary: Dictionary,
    /// Slate bandit
    pub bandit: Bandit,
    /// Tournament service
    pub tournaments: TournamentService,
    /// Drawing and guess service
    pub drawings: Drawings,
}

impl Community {
    /// The community name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Comment deleted or edited: drop any tournament entry under it and
    /// ban any word it was backing.
    ///
    /// Returns the banned word, if the comment backed one.
    pub fn on_comment_deleted(
        &self,
        post: Option<&PostId>,
        comment: &CommentId,
    ) -> Result<Option<String>> {
        if let Some(post) = post {
            self.tournaments.remove_entry(post, comment)?;
        }
        self.dictionary.on_backing_comment_deleted(comment)
    }
}

impl Engine {
    /// Wire an engine over a store and collaborators
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Kv>,
        clock: Arc<dyn Clock>,
        scheduler: Arc<dyn Scheduler>,
        identity: Arc<dyn Identity>,
        content: Arc<dyn Content>,
        media: Arc<dyn Media>,
        realtime: Arc<dyn Realtime>,
        config: EngineConfig,
    ) -> Self {
        let root = StoreHandle::new(store);
        let config = Arc::new(config);
        let identity = CachedIdentity::new(identity, root.clone());
        let effects = Effects::new(root.clone(), clock.clone(), realtime.clone());
        let progression = Progression::new(
            root.clone(),
            scheduler.clone(),
            effects.clone(),
            identity.clone(),
        );
        Self {
            root,
            clock,
            scheduler,
            identity,
            content,
            media,
            realtime,
            config,
            effects,
            progression,
        }
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Global progression service
    pub fn progression(&self) -> &Progression {
        &self.progression
    }

    /// Global consumables service
    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Cached identity lookups
    pub fn identity(&self) -> &CachedIdentity {
        &self.identity
    }

    /// Service bundle for one community
    pub fn community(&self, name: &str) -> Community {
        let kv = self.root.scoped(name);
        let dictionary = Dictionary::new(kv.clone(), name);
        let bandit = Bandit::new(kv.clone(), name, self.clock.clone());
        let tournaments = TournamentService::new(
            kv.clone(),
            name,
            self.clock.clone(),
            self.scheduler.clone(),
            self.content.clone(),
            self.media.clone(),
            self.progression.clone(),
            self.config.clone(),
        );
        let drawings = Drawings::new(
            kv,
            name,
            self.clock.clone(),
            self.progression.clone(),
            self.config.clone(),
        );
        Community {
            name: name.to_string(),
            dictionary,
            bandit,
            tournaments,
            drawings,
        }
    }

    /// First-install setup for a community: seed the dictionary and add the
    /// community to the global index. Idempotent.
    pub fn install_community(&self, name: &str) -> Result<Community> {
        let community = self.community(name);
        let seeded = community
            .dictionary
            .initialize(&self.root.global(), self.clock.now())?;
        info!(community = name, seeded, "community installed");
        Ok(community)
    }

    /// Every installed community, alphabetical
    pub fn communities(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .root
            .global()
            .z_range_by_rank(&keys::communities_all(), 0, usize::MAX - 1, Order::Ascending)?
            .into_iter()
            .map(|e| e.member)
            .collect();
        names.sort();
        Ok(names)
    }

    // ========== Chat commands ==========

    /// Handle a chat command line from a user
    pub fn handle_command(&self, community: &str, user: &UserId, input: &str) -> ApiResponse {
        let command = match ChatCommand::parse(input) {
            Ok(command) => command,
            Err(e) => return ApiResponse::error(&e),
        };
        let budget = match command {
            ChatCommand::ListWords => READ_BUDGET,
            _ => COMMAND_BUDGET,
        };
        let deadline = Deadline::after(self.clock.now(), budget);
        match self.dispatch_command(community, user, &command, deadline) {
            Ok(response) => response,
            Err(e) => {
                debug!(community, user = %user, command = command.name(), error = %e, "command failed");
                ApiResponse::error(&e)
            }
        }
    }

    fn dispatch_command(
        &self,
        community: &str,
        user: &UserId,
        command: &ChatCommand,
        deadline: Deadline,
    ) -> Result<ApiResponse> {
        let services = self.community(community);
        match command {
            ChatCommand::AddWord { word } => {
                self.require_add_privilege(community, user)?;
                deadline.check(self.clock.now(), "!add")?;
                if services.dictionary.add_word(word)? {
                    Ok(ApiResponse::message(format!(
                        "\"{}\" added to the dictionary",
                        scrawl_core::normalize_word(word)?
                    )))
                } else {
                    Ok(ApiResponse::skipped("that word is already in the dictionary"))
                }
            }
            ChatCommand::RemoveWord { word } => {
                self.require_moderator(community, user)?;
                deadline.check(self.clock.now(), "!remove")?;
                if services.dictionary.remove_word(word)? {
                    Ok(ApiResponse::message("word removed"))
                } else {
                    Ok(ApiResponse::skipped("that word was not in the dictionary"))
                }
            }
            ChatCommand::BanWord { word } => {
                self.require_moderator(community, user)?;
                deadline.check(self.clock.now(), "!ban")?;
                services.dictionary.ban_word(word)?;
                Ok(ApiResponse::message("word banned"))
            }
            ChatCommand::ListWords => {
                deadline.check(self.clock.now(), "!words")?;
                let words: Vec<String> = services
                    .dictionary
                    .get_all_words()?
                    .into_iter()
                    .map(|e| e.member)
                    .collect();
                Ok(ApiResponse::success(json!({ "words": words })))
            }
        }
    }

    fn require_moderator(&self, community: &str, user: &UserId) -> Result<()> {
        if self.identity.is_moderator(community, user)? {
            return Ok(());
        }
        Err(Error::InvalidInput("that command is moderator-only".into()))
    }

    fn require_add_privilege(&self, community: &str, user: &UserId) -> Result<()> {
        if self.identity.is_moderator(community, user)? {
            return Ok(());
        }
        let level = self.progression.get_user_level(user)?;
        if level.rank >= self.config.min_add_level {
            return Ok(());
        }
        Err(Error::InvalidInput(format!(
            "reach level {} to suggest words",
            self.config.min_add_level
        )))
    }

    // ========== Background jobs ==========

    /// Register this engine's job handlers on an in-process queue
    ///
    /// `SET_USER_FLAIR` stays with the hosting runtime; flair rendering is
    /// a presentation concern.
    pub fn register_jobs(&self, queue: &Arc<JobQueue>) {
        let engine = self.clone();
        queue.register(JobName::TournamentScheduler, move |ctx| {
            engine.run_scheduler_tick(ctx)
        });

        let engine = self.clone();
        queue.register(JobName::TournamentPayout, move |ctx| {
            engine.run_payout_job(ctx)
        });

        let engine = self.clone();
        queue.register(JobName::SlateAggregator, move |ctx| {
            engine.run_aggregator_job(ctx)
        });

        let engine = self.clone();
        queue.register(JobName::CreateTournamentPostComment, move |ctx| {
            engine.run_pinned_comment_job(ctx, true)
        });

        let engine = self.clone();
        queue.register(JobName::CreatePinnedPostComment, move |ctx| {
            engine.run_pinned_comment_job(ctx, false)
        });

        let engine = self.clone();
        queue.register(JobName::UpdatePinnedComment, move |ctx| {
            engine.run_update_pinned_job(ctx)
        });

        let engine = self.clone();
        queue.register(JobName::UserLevelUp, move |ctx| engine.run_level_up_job(ctx));
    }

    fn run_scheduler_tick(&self, ctx: &JobContext) -> Result<()> {
        let payload: SchedulerTickPayload =
            serde_json::from_value(ctx.data.clone()).unwrap_or_default();
        let targets = match payload.community {
            Some(name) => vec![name],
            None => self.communities()?,
        };
        for name in targets {
            ctx.deadline.check(self.clock.now(), "tournament scheduler")?;
            let outcome = self.community(&name).tournaments.scheduler_tick()?;
            debug!(community = %name, ?outcome, "scheduler tick");
        }
        Ok(())
    }

    fn run_payout_job(&self, ctx: &JobContext) -> Result<()> {
        let payload: PayoutPayload = serde_json::from_value(ctx.data.clone())?;
        let community = payload
            .community
            .ok_or_else(|| Error::InvalidInput("payout payload missing community".into()))?;
        let status = self
            .community(&community)
            .tournaments
            .award_payout(&payload.post_id, payload.day_index)?;
        info!(post = %payload.post_id, day = payload.day_index, ?status, "payout job done");
        Ok(())
    }

    fn run_aggregator_job(&self, ctx: &JobContext) -> Result<()> {
        let payload: AggregatorPayload =
            serde_json::from_value(ctx.data.clone()).unwrap_or_default();
        let pending: Vec<String> = self
            .communities()?
            .into_iter()
            .filter(|name| match &payload.cursor {
                Some(cursor) => name.as_str() > cursor.as_str(),
                None => true,
            })
            .collect();

        let mut last_processed: Option<String> = None;
        for (idx, name) in pending.iter().enumerate() {
            let out_of_budget =
                idx >= payload.batch_size || ctx.deadline.expired(self.clock.now());
            if out_of_budget {
                // defer the rest to a follow-up job rather than overrun
                let follow_up = AggregatorPayload {
                    batch_size: payload.batch_size,
                    is_initial_job: false,
                    cursor: last_processed,
                };
                ctx.scheduler.run_job(JobRequest::immediate(
                    JobName::SlateAggregator,
                    serde_json::to_value(&follow_up)?,
                ))?;
                debug!(remaining = pending.len() - idx, "aggregator deferred");
                return Ok(());
            }
            match self.community(name).bandit.update_scores() {
                Ok(update) => debug!(community = %name, ?update, "bandit scores updated"),
                Err(e) if e.is_conflict() => {
                    debug!(community = %name, "score update already running, skipping")
                }
                Err(e) => warn!(community = %name, error = %e, "score update failed"),
            }
            last_processed = Some(name.clone());
        }
        debug!(
            processed = pending.len(),
            initial = payload.is_initial_job,
            "aggregator pass complete"
        );
        Ok(())
    }

    fn run_pinned_comment_job(&self, ctx: &JobContext, tournament: bool) -> Result<()> {
        let payload: PinnedCommentPayload = serde_json::from_value(ctx.data.clone())?;
        let community = payload
            .community
            .ok_or_else(|| Error::InvalidInput("pinned comment payload missing community".into()))?;
        let kv = self.root.scoped(&community);
        let post_key = if tournament {
            keys::tournament(&payload.post_id)
        } else {
            keys::drawing(&payload.post_id)
        };
        if kv.h_get(&post_key, "pinnedCommentId")?.is_some() {
            debug!(post = %payload.post_id, "pinned comment already exists");
            return Ok(());
        }
        let text = if tournament {
            let word = kv
                .h_get(&post_key, "word")?
                .unwrap_or_else(|| "the prompt".to_string());
            format!(
                "Welcome to the tournament! Draw \"{}\", vote on head-to-head pairs, and the top entries earn points every day.",
                word
            )
        } else {
            "Guess the word in the comments. First solve earns bonus points!".to_string()
        };
        let comment = self.content.submit_comment(&payload.post_id, &text)?;
        self.content.distinguish_comment(&comment.id)?;
        kv.h_set(&post_key, "pinnedCommentId", comment.id.as_str())?;
        Ok(())
    }

    fn run_update_pinned_job(&self, ctx: &JobContext) -> Result<()> {
        let payload: PinnedCommentPayload = serde_json::from_value(ctx.data.clone())?;
        let community = payload
            .community
            .ok_or_else(|| Error::InvalidInput("pinned comment payload missing community".into()))?;
        let kv = self.root.scoped(&community);
        // a pinned comment exists on exactly one of the two post kinds
        for post_key in [
            keys::tournament(&payload.post_id),
            keys::drawing(&payload.post_id),
        ] {
            if let Some(comment_id) = kv.h_get(&post_key, "pinnedCommentId")? {
                let votes = kv.h_get(&post_key, "votes")?.unwrap_or_default();
                let text = if votes.is_empty() {
                    "Guess the word in the comments. First solve earns bonus points!".to_string()
                } else {
                    format!("The tournament is live: {} votes cast so far!", votes)
                };
                self.content.edit_comment(&CommentId::new(comment_id), &text)?;
                return Ok(());
            }
        }
        warn!(post = %payload.post_id, "no pinned comment to update");
        Ok(())
    }

    fn run_level_up_job(&self, ctx: &JobContext) -> Result<()> {
        let payload: scrawl_jobs::LevelUpPayload = serde_json::from_value(ctx.data.clone())?;
        let announcement = json!({
            "type": "level_up",
            "rank": payload.level_rank,
            "name": payload.level_name,
        });
        if let Err(e) = self
            .realtime
            .send(&keys::user_channel(&payload.user_id), &announcement)
        {
            warn!(user = %payload.user_id, error = %e, "level-up announcement failed");
        }
        Ok(())
    }
}
