//! Per-community word dictionaries
//!
//! Two sorted sets per community, active words and banned words, with the
//! invariant that a word is never in both. Members are normalized words;
//! scores start at the default and are owned by the bandit once it has
//! funnel data.

mod defaults;
mod store;

pub use defaults::DEFAULT_WORDS;
pub use store::{Dictionary, UpdateOutcome, DEFAULT_WORD_SCORE};
