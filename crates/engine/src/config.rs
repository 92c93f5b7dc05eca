//! Engine configuration via `scrawl.toml`
//!
//! Every knob has a hardcoded default, so the file is optional. On
//! deployments that want different payout cadences or rewards, drop a
//! `scrawl.toml` next to the data and restart; no builder sprawl.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use scrawl_core::{Error, Result};

/// Config file name looked up at engine construction
pub const CONFIG_FILE_NAME: &str = "scrawl.toml";

fn default_initial_elo() -> f64 {
    1200.0
}
fn default_elo_k() -> f64 {
    32.0
}
fn default_snapshot_count() -> u32 {
    3
}
fn default_payout_window_hours() -> u64 {
    24
}
fn default_top_percent() -> u32 {
    20
}
fn default_top_reward() -> i64 {
    50
}
fn default_ladder_bonus() -> Vec<i64> {
    vec![100, 50, 25]
}
fn default_vote_reward() -> i64 {
    1
}
fn default_solver_reward() -> i64 {
    15
}
fn default_author_reward() -> i64 {
    10
}
fn default_slate_count() -> usize {
    3
}
fn default_min_add_level() -> u32 {
    2
}
fn default_submit_limit() -> i64 {
    2
}
fn default_submit_window_secs() -> u64 {
    10
}
fn default_vote_limit() -> i64 {
    3
}
fn default_vote_window_secs() -> u64 {
    1
}
fn default_guess_limit() -> i64 {
    10
}
fn default_guess_window_secs() -> u64 {
    10
}

/// Tunable engine constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rating every tournament entry starts at
    pub initial_elo: f64,
    /// Elo K-factor
    pub elo_k: f64,
    /// Snapshot payouts per tournament
    pub snapshot_count: u32,
    /// Hours between snapshot payouts
    pub payout_window_hours: u64,
    /// Percent of entries paid per snapshot
    pub top_percent: u32,
    /// Flat reward for every paid entry
    pub top_reward: i64,
    /// Extra rewards for ranks 1, 2, 3, ...
    pub ladder_bonus: Vec<i64>,
    /// Score awarded for casting a vote
    pub vote_reward: i64,
    /// Score awarded for solving a drawing
    pub solver_reward: i64,
    /// Score awarded to the artist when their drawing is solved
    pub author_reward: i64,
    /// Words per slate
    pub slate_count: usize,
    /// Minimum level required to use the add-word command
    pub min_add_level: u32,
    /// Entry submissions allowed per window
    pub submit_limit: i64,
    /// Entry submission window, seconds
    pub submit_window_secs: u64,
    /// Votes allowed per window
    pub vote_limit: i64,
    /// Vote window, seconds
    pub vote_window_secs: u64,
    /// Guesses allowed per window
    pub guess_limit: i64,
    /// Guess window, seconds
    pub guess_window_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_elo: default_initial_elo(),
            elo_k: default_elo_k(),
            snapshot_count: default_snapshot_count(),
            payout_window_hours: default_payout_window_hours(),
            top_percent: default_top_percent(),
            top_reward: default_top_reward(),
            ladder_bonus: default_ladder_bonus(),
            vote_reward: default_vote_reward(),
            solver_reward: default_solver_reward(),
            author_reward: default_author_reward(),
            slate_count: default_slate_count(),
            min_add_level: default_min_add_level(),
            submit_limit: default_submit_limit(),
            submit_window_secs: default_submit_window_secs(),
            vote_limit: default_vote_limit(),
            vote_window_secs: default_vote_window_secs(),
            guess_limit: default_guess_limit(),
            guess_window_secs: default_guess_window_secs(),
        }
    }
}

impl EngineConfig {
    /// Parse a `scrawl.toml` document; missing fields take defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::InvalidInput(format!("bad config: {}", e)))
    }

    /// Load from a config file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => Self::from_toml_str(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::Transient(format!("reading config: {}", e))),
        }
    }

    /// Interval between snapshot payouts
    pub fn payout_window(&self) -> Duration {
        Duration::from_secs(self.payout_window_hours * 3600)
    }

    /// Entry submission rate-limit window
    pub fn submit_window(&self) -> Duration {
        Duration::from_secs(self.submit_window_secs)
    }

    /// Vote rate-limit window
    pub fn vote_window(&self) -> Duration {
        Duration::from_secs(self.vote_window_secs)
    }

    /// Guess rate-limit window
    pub fn guess_window(&self) -> Duration {
        Duration::from_secs(self.guess_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.initial_elo, 1200.0);
        assert_eq!(config.elo_k, 32.0);
        assert_eq!(config.snapshot_count, 3);
        assert_eq!(config.payout_window(), Duration::from_secs(24 * 3600));
        assert_eq!(config.ladder_bonus, vec![100, 50, 25]);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            elo_k = 24.0
            snapshot_count = 5
            ladder_bonus = [200, 100]
            "#,
        )
        .unwrap();
        assert_eq!(config.elo_k, 24.0);
        assert_eq!(config.snapshot_count, 5);
        assert_eq!(config.ladder_bonus, vec![200, 100]);
        // untouched fields keep defaults
        assert_eq!(config.initial_elo, 1200.0);
    }

    #[test]
    fn test_bad_toml_is_invalid_input() {
        let err = EngineConfig::from_toml_str("elo_k = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
