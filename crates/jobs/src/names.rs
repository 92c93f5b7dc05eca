//! Job names
//!
//! The wire names are part of the scheduler contract; stable, screaming
//! snake case, never renamed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every job the engine schedules or handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobName {
    /// Periodic bandit score recompute across communities
    SlateAggregator,
    /// Hopper tick: instantiate the next pending tournament
    TournamentScheduler,
    /// One snapshot payout for a tournament day
    TournamentPayout,
    /// Announce a user level-up
    UserLevelUp,
    /// Refresh a user's flair after a level change
    SetUserFlair,
    /// Create the pinned comment on a fresh post
    CreatePinnedPostComment,
    /// Create the explainer comment on a tournament post
    CreateTournamentPostComment,
    /// Refresh an existing pinned comment
    UpdatePinnedComment,
}

impl JobName {
    /// Wire name, e.g. `TOURNAMENT_PAYOUT`
    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::SlateAggregator => "SLATE_AGGREGATOR",
            JobName::TournamentScheduler => "TOURNAMENT_SCHEDULER",
            JobName::TournamentPayout => "TOURNAMENT_PAYOUT",
            JobName::UserLevelUp => "USER_LEVEL_UP",
            JobName::SetUserFlair => "SET_USER_FLAIR",
            JobName::CreatePinnedPostComment => "CREATE_PINNED_POST_COMMENT",
            JobName::CreateTournamentPostComment => "CREATE_TOURNAMENT_POST_COMMENT",
            JobName::UpdatePinnedComment => "UPDATE_PINNED_COMMENT",
        }
    }

    /// Parse a wire name
    pub fn parse(raw: &str) -> Option<JobName> {
        match raw {
            "SLATE_AGGREGATOR" => Some(JobName::SlateAggregator),
            "TOURNAMENT_SCHEDULER" => Some(JobName::TournamentScheduler),
            "TOURNAMENT_PAYOUT" => Some(JobName::TournamentPayout),
            "USER_LEVEL_UP" => Some(JobName::UserLevelUp),
            "SET_USER_FLAIR" => Some(JobName::SetUserFlair),
            "CREATE_PINNED_POST_COMMENT" => Some(JobName::CreatePinnedPostComment),
            "CREATE_TOURNAMENT_POST_COMMENT" => Some(JobName::CreateTournamentPostComment),
            "UPDATE_PINNED_COMMENT" => Some(JobName::UpdatePinnedComment),
            _ => None,
        }
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_roundtrip() {
        let all = [
            JobName::SlateAggregator,
            JobName::TournamentScheduler,
            JobName::TournamentPayout,
            JobName::UserLevelUp,
            JobName::SetUserFlair,
            JobName::CreatePinnedPostComment,
            JobName::CreateTournamentPostComment,
            JobName::UpdatePinnedComment,
        ];
        for name in all {
            assert_eq!(JobName::parse(name.as_str()), Some(name));
        }
        assert_eq!(JobName::parse("NO_SUCH_JOB"), None);
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&JobName::SlateAggregator).unwrap();
        assert_eq!(json, "\"SLATE_AGGREGATOR\"");
        let back: JobName = serde_json::from_str("\"TOURNAMENT_PAYOUT\"").unwrap();
        assert_eq!(back, JobName::TournamentPayout);
    }
}
