//! Cooperative job and command deadlines
//!
//! A handler's only structural waits are KV round-trips, so deadlines are
//! checked between them rather than raced against a timer. A job slot
//! allows roughly 60 s of wall time; handlers budget 50 and enqueue a
//! follow-up for whatever remains.

use std::time::Duration;

use scrawl_core::{Error, Result, Timestamp};

/// Wall-time budget a job handler gives itself inside its ~60 s slot
pub const JOB_TIME_BUDGET: Duration = Duration::from_secs(50);

/// An absolute point in time after which work must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Timestamp,
}

impl Deadline {
    /// Deadline at an absolute instant
    pub fn at(at: Timestamp) -> Self {
        Self { at }
    }

    /// Deadline a budget after `start`
    pub fn after(start: Timestamp, budget: Duration) -> Self {
        Self {
            at: start.saturating_add(budget),
        }
    }

    /// Whether the deadline has passed
    pub fn expired(&self, now: Timestamp) -> bool {
        now >= self.at
    }

    /// Error out if the deadline has passed
    pub fn check(&self, now: Timestamp, what: &str) -> Result<()> {
        if self.expired(now) {
            return Err(Error::DeadlineExceeded(what.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_boundary() {
        let d = Deadline::after(Timestamp::from_secs(100), Duration::from_secs(50));
        assert!(!d.expired(Timestamp::from_secs(149)));
        assert!(d.expired(Timestamp::from_secs(150)));
        assert!(d.check(Timestamp::from_secs(149), "work").is_ok());
        let err = d.check(Timestamp::from_secs(150), "work").unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded(_)));
    }
}
