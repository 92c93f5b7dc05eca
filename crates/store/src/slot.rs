//! Storage slot: a stored value plus optional expiry
//!
//! TTL is a storage concern. Expiry is an absolute timestamp; a slot whose
//! deadline has passed is treated as absent at access time and removed
//! lazily by whichever access notices it.

use rustc_hash::FxHashMap;
use scrawl_core::Timestamp;

use crate::zset::ZSet;

/// The value kinds a key can hold
#[derive(Debug, Clone)]
pub(crate) enum Stored {
    /// Plain string; also backs atomic counters
    Str(String),
    /// Field → value hash
    Hash(FxHashMap<String, String>),
    /// Sorted set
    Sorted(ZSet),
}

impl Stored {
    /// Kind name for wrong-type diagnostics
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Stored::Str(_) => "string",
            Stored::Hash(_) => "hash",
            Stored::Sorted(_) => "zset",
        }
    }
}

/// A stored value with its optional absolute expiry
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) value: Stored,
    pub(crate) expires_at: Option<Timestamp>,
}

impl Slot {
    pub(crate) fn new(value: Stored) -> Self {
        Slot {
            value,
            expires_at: None,
        }
    }

    pub(crate) fn with_expiry(value: Stored, expires_at: Timestamp) -> Self {
        Slot {
            value,
            expires_at: Some(expires_at),
        }
    }

    pub(crate) fn is_expired(&self, now: Timestamp) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}
