//! Lease-based mutual exclusion
//!
//! A lock is a key set atomically from absent with a TTL. Acquisition
//! failing means another holder is live. Release deletes the key; a holder
//! whose lease lapsed deletes nothing it still owns, which is accepted -
//! all critical sections in the engine are designed to stay safe under
//! lease expiry.

use std::time::Duration;

use scrawl_core::Result;
use scrawl_store::{Kv, StoreHandle};
use tracing::debug;

/// Sentinel stored under a held lock key; any non-empty value works
const LOCK_SENTINEL: &str = "1";

/// A named lease lock over the shared store
#[derive(Clone)]
pub struct LeaseLock {
    kv: StoreHandle,
    key: String,
}

impl LeaseLock {
    /// Create a handle for the given lock key; nothing is acquired yet
    pub fn new(kv: StoreHandle, key: impl Into<String>) -> Self {
        Self {
            kv,
            key: key.into(),
        }
    }

    /// The lock key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Try to take the lease. Returns true iff the key was set from absent.
    pub fn try_acquire(&self, ttl: Duration) -> Result<bool> {
        let acquired = self.kv.set_nx_ex(&self.key, LOCK_SENTINEL, ttl)?;
        debug!(key = %self.key, acquired, "lease lock attempt");
        Ok(acquired)
    }

    /// Release the lease by deleting the key. Idempotent.
    pub fn release(&self) -> Result<()> {
        self.kv.del(&self.key)?;
        Ok(())
    }
}
