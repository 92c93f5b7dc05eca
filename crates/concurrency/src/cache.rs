//! Read-through cached reads
//!
//! Memoizes a fallible computation under a KV key with a TTL. No stampede
//! protection; concurrent misses each compute and the last write wins,
//! which is fine for the identity lookups this backs.
//!
//! Store failures bypass the cache entirely: a broken cache never turns a
//! computable value into an error.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use scrawl_core::Result;
use scrawl_store::{Kv, StoreHandle};

/// Return the cached value under `key`, or compute, store, and return it.
///
/// - Cache hit with a decodable payload → the cached value, `f` not called.
/// - Miss, stale payload, or store read failure → `f()`; its error
///   propagates and nothing is stored.
/// - Store write failure after a successful compute → the computed value,
///   with a warning.
pub fn cached<T, F>(kv: &StoreHandle, key: &str, ttl: Duration, f: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Result<T>,
{
    match kv.get(key) {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => return Ok(value),
            Err(e) => warn!(key, error = %e, "cache payload undecodable, recomputing"),
        },
        Ok(None) => {}
        Err(e) => {
            warn!(key, error = %e, "cache read failed, bypassing");
            return f();
        }
    }

    let value = f()?;
    match serde_json::to_string(&value) {
        Ok(raw) => {
            if let Err(e) = kv.set_with_ttl(key, &raw, ttl) {
                warn!(key, error = %e, "cache write failed");
            }
        }
        Err(e) => warn!(key, error = %e, "cache value unserializable"),
    }
    Ok(value)
}
