//! Error types for the Scrawl engine
//!
//! A single `Error` enum covers every handler and background job. We use
//! `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! - **InvalidInput**: validation failure; reported to the caller, no retry
//! - **NotFound**: missing word, entry, user, or post; reported, no retry
//! - **Conflict**: a lock is already held or a recompute is in progress;
//!   callers may retry after backoff
//! - **RateLimited**: a sliding window was exceeded
//! - **InsufficientWords / InsufficientEntries**: a slate or pairing was
//!   requested against too small a population
//! - **DeadlineExceeded**: a cooperative per-command deadline expired
//! - **Serialization / Transient**: infrastructure hiccups; scheduled jobs
//!   rely on their next tick to recover
//! - **Fatal**: assertion violations; logged and aborted, never persisted

use thiserror::Error;

/// Result type alias for Scrawl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the Scrawl engine
#[derive(Debug, Error)]
pub enum Error {
    /// Validation failure on caller input (bad word, bad page number, ...)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A lock is already held or the operation is already in progress
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller exceeded a sliding-window rate limit
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Too few active words to build a slate
    #[error("insufficient words: need {needed}, have {available}")]
    InsufficientWords {
        /// How many words the slate asked for
        needed: usize,
        /// How many active words exist
        available: usize,
    },

    /// Too few tournament entries to form a pair
    #[error("insufficient entries: need at least 2, have {available}")]
    InsufficientEntries {
        /// How many entries exist
        available: usize,
    },

    /// A cooperative command deadline expired between suspension points
    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),

    /// Serialization/deserialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transient KV/identity/media failure; safe to retry on the next tick
    #[error("transient failure: {0}")]
    Transient(String),

    /// Assertion violation; the operation is aborted and nothing is persisted
    #[error("fatal: {0}")]
    Fatal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl Error {
    /// HTTP-style status for structured handler responses
    ///
    /// The only distinctions callers need: client-input error (400),
    /// already-in-progress (409), and server error (500).
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidInput(_)
            | Error::NotFound(_)
            | Error::RateLimited(_)
            | Error::InsufficientWords { .. }
            | Error::InsufficientEntries { .. } => 400,
            Error::Conflict(_) => 409,
            Error::DeadlineExceeded(_)
            | Error::Serialization(_)
            | Error::Transient(_)
            | Error::Fatal(_) => 500,
        }
    }

    /// Whether a caller may retry after backoff
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(_) | Error::Transient(_))
    }

    /// Whether this error represents an already-in-progress operation
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("word too long".to_string());
        assert!(err.to_string().contains("invalid input"));
        assert!(err.to_string().contains("word too long"));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(Error::InvalidInput("x".into()).http_status(), 400);
        assert_eq!(Error::NotFound("x".into()).http_status(), 400);
        assert_eq!(Error::RateLimited("x".into()).http_status(), 400);
        assert_eq!(Error::Conflict("x".into()).http_status(), 409);
        assert_eq!(Error::Transient("x".into()).http_status(), 500);
        assert_eq!(Error::Fatal("x".into()).http_status(), 500);
        assert_eq!(
            Error::InsufficientWords {
                needed: 3,
                available: 1
            }
            .http_status(),
            400
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Conflict("lock held".into()).is_retryable());
        assert!(Error::Transient("kv hiccup".into()).is_retryable());
        assert!(!Error::InvalidInput("bad".into()).is_retryable());
        assert!(!Error::Fatal("negative counter".into()).is_retryable());
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(err.http_status(), 500);
    }
}
