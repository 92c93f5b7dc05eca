//! Slate bandit configuration
//!
//! Stored as string-encoded numerics in the `slate:config` hash. Reads
//! clamp every field into its valid range, so a hand-edited hash can never
//! push the estimator into NaN territory.

use scrawl_core::{keys, Result};
use scrawl_store::{Kv, StoreHandle};

use crate::bandit::Bandit;

/// Bandit tuning knobs
#[derive(Debug, Clone, PartialEq)]
pub struct SlateConfig {
    /// Probability of substituting one slate slot with a random word
    pub exploration_rate: f64,
    /// Z-scores clamp to ± this
    pub z_score_clamp: f64,
    /// Weight of the pick-rate z-score in the drawer score
    pub weight_pick_rate: f64,
    /// Weight of the post-rate z-score in the drawer score
    pub weight_post_rate: f64,
    /// Exploration bonus multiplier on sqrt(uncertainty)
    pub ucb_constant: f64,
    /// Hourly exponential score decay rate
    pub score_decay_rate: f64,
}

impl Default for SlateConfig {
    fn default() -> Self {
        Self {
            exploration_rate: 0.15,
            z_score_clamp: 2.0,
            weight_pick_rate: 0.7,
            weight_post_rate: 0.3,
            ucb_constant: 0.5,
            score_decay_rate: 0.05,
        }
    }
}

impl SlateConfig {
    /// Clamp every field into its valid range
    pub fn clamped(mut self) -> Self {
        self.exploration_rate = self.exploration_rate.clamp(0.0, 1.0);
        self.z_score_clamp = self.z_score_clamp.max(0.1);
        self.weight_pick_rate = self.weight_pick_rate.max(0.0);
        self.weight_post_rate = self.weight_post_rate.max(0.0);
        self.ucb_constant = self.ucb_constant.max(0.1);
        self.score_decay_rate = self.score_decay_rate.clamp(0.0, 1.0);
        self
    }
}

fn field(fields: &[(String, String)], name: &str, fallback: f64) -> f64 {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(fallback)
}

impl Bandit {
    /// Read the bandit config, falling back to defaults field by field
    pub fn config(&self) -> Result<SlateConfig> {
        let fields = self.kv.h_get_all(&keys::slate_config())?;
        let d = SlateConfig::default();
        Ok(SlateConfig {
            exploration_rate: field(&fields, "explorationRate", d.exploration_rate),
            z_score_clamp: field(&fields, "zScoreClamp", d.z_score_clamp),
            weight_pick_rate: field(&fields, "weightPickRate", d.weight_pick_rate),
            weight_post_rate: field(&fields, "weightPostRate", d.weight_post_rate),
            ucb_constant: field(&fields, "ucbConstant", d.ucb_constant),
            score_decay_rate: field(&fields, "scoreDecayRate", d.score_decay_rate),
        }
        .clamped())
    }

    /// Persist a bandit config as string-encoded numerics
    pub fn set_config(&self, config: &SlateConfig) -> Result<()> {
        let c = config.clone().clamped();
        self.kv.h_set_all(
            &keys::slate_config(),
            &[
                ("explorationRate".to_string(), c.exploration_rate.to_string()),
                ("zScoreClamp".to_string(), c.z_score_clamp.to_string()),
                ("weightPickRate".to_string(), c.weight_pick_rate.to_string()),
                ("weightPostRate".to_string(), c.weight_post_rate.to_string()),
                ("ucbConstant".to_string(), c.ucb_constant.to_string()),
                ("scoreDecayRate".to_string(), c.score_decay_rate.to_string()),
            ],
        )?;
        Ok(())
    }
}
