//! Sliding-window rate limits
//!
//! `INCR` + first-write `EXPIRE` approximation: one counter bucket per
//! window. Resolution is coarse: a burst straddling a bucket boundary can
//! see up to `2 * limit` calls through, which is acceptable for the
//! abuse-control windows the engine uses (seconds).

use std::time::Duration;

use scrawl_core::Result;
use scrawl_store::{Kv, StoreHandle};

/// Count a call against a window and report whether the caller is over.
///
/// Returns true when the post-increment count exceeds `limit`; the call is
/// still counted. The TTL starts with the first call of a bucket, so a
/// window lapsing resets the count.
pub fn is_rate_limited(
    kv: &StoreHandle,
    key: &str,
    limit: i64,
    window: Duration,
) -> Result<bool> {
    let count = kv.incr_by(key, 1)?;
    if count == 1 {
        kv.expire(key, window)?;
    }
    Ok(count > limit)
}
