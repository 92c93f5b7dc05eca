//! Drawing posts and the guess funnel
//!
//! A drawing post records its prompt word; guesses run through the same
//! normalization as the dictionary, so "MEAT LOAF" solves a "Meat Loaf"
//! drawing. Attempts, guessed words, solves, and skips each live in their
//! own sorted set; all monotone, all safe to replay.

use std::sync::Arc;

use tracing::{debug, info};

use scrawl_concurrency::is_rate_limited;
use scrawl_core::{keys, normalize_word, Clock, Error, PostId, Result, UserId};
use scrawl_store::{Kv, Order, StoreHandle, ZEntry};

use crate::config::EngineConfig;
use crate::progression::Progression;

/// Result of one guess
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Wrong word
    Incorrect,
    /// Right word
    Correct {
        /// The guesser had already solved this drawing; nothing was awarded
        already_solved: bool,
        /// This was the drawing's first solve overall
        first_solver: bool,
    },
}

/// Per-community drawing service
#[derive(Clone)]
pub struct Drawings {
    kv: StoreHandle,
    community: String,
    clock: Arc<dyn Clock>,
    progression: Progression,
    config: Arc<EngineConfig>,
}

impl Drawings {
    /// Create over a community-scoped store handle
    pub fn new(
        kv: StoreHandle,
        community: impl Into<String>,
        clock: Arc<dyn Clock>,
        progression: Progression,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            kv,
            community: community.into(),
            clock,
            progression,
            config,
        }
    }

    /// Record a new drawing post and index it globally and per author
    pub fn create_drawing(&self, post: &PostId, author: &UserId, raw_word: &str) -> Result<()> {
        let word = normalize_word(raw_word)?;
        let now = self.clock.now();
        self.kv.h_set_all(
            &keys::drawing(post),
            &[
                ("type".to_string(), "drawing".to_string()),
                ("word".to_string(), word.clone()),
                ("authorId".to_string(), author.as_str().to_string()),
                ("createdAt".to_string(), now.as_millis().to_string()),
            ],
        )?;
        let global = self.kv.global();
        global.z_add(&keys::drawings_all(), post.as_str(), now.as_millis() as f64)?;
        global.z_add(
            &keys::user_drawings(author),
            post.as_str(),
            now.as_millis() as f64,
        )?;
        info!(community = %self.community, post = %post, author = %author, word = %word, "drawing created");
        Ok(())
    }

    /// The drawing's prompt word
    pub fn drawing_word(&self, post: &PostId) -> Result<String> {
        self.kv
            .h_get(&keys::drawing(post), "word")?
            .ok_or_else(|| Error::NotFound(format!("drawing {}", post)))
    }

    /// Submit a guess. Counts the attempt and the guessed word; a correct
    /// first solve pays the guesser and the artist.
    pub fn submit_guess(&self, post: &PostId, user: &UserId, raw_guess: &str) -> Result<GuessOutcome> {
        if is_rate_limited(
            &self.kv,
            &keys::rate_guess(user),
            self.config.guess_limit,
            self.config.guess_window(),
        )? {
            return Err(Error::RateLimited("guessing too fast".into()));
        }
        let guess = normalize_word(raw_guess)?;
        let word = self.drawing_word(post)?;
        let author = self
            .kv
            .h_get(&keys::drawing(post), "authorId")?
            .map(UserId::new);
        if author.as_ref() == Some(user) {
            return Err(Error::InvalidInput("you drew this one".into()));
        }

        self.kv
            .z_incr_by(&keys::drawing_attempts(post), user.as_str(), 1.0)?;
        self.kv.z_incr_by(&keys::drawing_guesses(post), &guess, 1.0)?;

        if guess != word {
            return Ok(GuessOutcome::Incorrect);
        }

        let solves_key = keys::drawing_solves(post);
        if self.kv.z_score(&solves_key, user.as_str())?.is_some() {
            return Ok(GuessOutcome::Correct {
                already_solved: true,
                first_solver: false,
            });
        }
        let now = self.clock.now();
        self.kv
            .z_add(&solves_key, user.as_str(), now.as_millis() as f64)?;
        let first_solver = self.kv.z_card(&solves_key)? == 1;

        self.progression
            .increment_score(user, self.config.solver_reward)?;
        if let Some(author) = author {
            self.progression
                .increment_score_raw(&author, self.config.author_reward)?;
        }
        debug!(post = %post, user = %user, first_solver, "drawing solved");
        Ok(GuessOutcome::Correct {
            already_solved: false,
            first_solver,
        })
    }

    /// Record that a player skipped the drawing
    pub fn skip_drawing(&self, post: &PostId, user: &UserId) -> Result<()> {
        self.kv.z_add(
            &keys::drawing_skips(post),
            user.as_str(),
            self.clock.now().as_millis() as f64,
        )?;
        Ok(())
    }

    /// Most-guessed words for a drawing, most popular first
    pub fn top_guesses(&self, post: &PostId, limit: usize) -> Result<Vec<ZEntry>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.kv
            .z_range_by_rank(&keys::drawing_guesses(post), 0, limit - 1, Order::Descending)
    }

    /// How many players solved the drawing
    pub fn solve_count(&self, post: &PostId) -> Result<usize> {
        Ok(self.kv.z_card(&keys::drawing_solves(post))?)
    }
}
