//! In-memory KV store
//!
//! DashMap-backed implementation of [`Kv`]: lock-free reads, sharded
//! writes, per-key slots carrying an optional absolute expiry. The clock is
//! injected so tests drive TTL expiry explicitly.
//!
//! Expiry is lazy: whichever access observes a past-deadline slot treats it
//! as absent and removes it. Nothing scans for expired keys.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use rustc_hash::FxHashMap;

use scrawl_core::{Clock, Error, Result, Timestamp};

use crate::kv::Kv;
use crate::slot::{Slot, Stored};
use crate::zset::{Order, ZEntry, ZSet};

fn wrong_kind(key: &str, expected: &str, found: &str) -> Error {
    Error::Fatal(format!(
        "key '{}' holds a {}, expected a {}",
        key, found, expected
    ))
}

fn parse_int(key: &str, raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| Error::Fatal(format!("key '{}' holds non-integer '{}'", key, raw)))
}

/// DashMap-backed [`Kv`] implementation
pub struct MemoryStore {
    data: DashMap<String, Slot>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Create a store reading time from the given clock
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            clock,
        }
    }

    /// Convenience constructor returning an `Arc<MemoryStore>`
    pub fn shared(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self::new(clock))
    }

    /// Number of live keys (expired slots excluded)
    pub fn live_len(&self) -> usize {
        let now = self.clock.now();
        self.data.iter().filter(|e| !e.value().is_expired(now)).count()
    }

    /// Read a live slot's value, treating expired slots as absent
    fn read<R>(&self, key: &str, on_missing: R, f: impl FnOnce(&Stored) -> Result<R>) -> Result<R> {
        let now = self.clock.now();
        let mut expired = false;
        if let Some(slot) = self.data.get(key) {
            if slot.is_expired(now) {
                expired = true;
            } else {
                return f(&slot.value);
            }
        }
        if expired {
            self.data.remove_if(key, |_, s| s.is_expired(now));
        }
        Ok(on_missing)
    }

    /// Mutate a slot, creating it (or replacing an expired one) via `init`
    fn update<R>(
        &self,
        key: &str,
        init: impl Fn() -> Stored,
        f: impl FnOnce(&str, &mut Slot) -> Result<R>,
    ) -> Result<R> {
        let now = self.clock.now();
        let mut slot = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(init()));
        if slot.is_expired(now) {
            *slot = Slot::new(init());
        }
        f(key, &mut slot)
    }
}

impl Kv for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(key, None, |stored| match stored {
            Stored::Str(s) => Ok(Some(s.clone())),
            other => Err(wrong_kind(key, "string", other.kind())),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data
            .insert(key.to_string(), Slot::new(Stored::Str(value.to_string())));
        Ok(())
    }

    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let deadline = self.clock.now().saturating_add(ttl);
        self.data.insert(
            key.to_string(),
            Slot::with_expiry(Stored::Str(value.to_string()), deadline),
        );
        Ok(())
    }

    fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.now();
        let slot = Slot::with_expiry(Stored::Str(value.to_string()), now.saturating_add(ttl));
        match self.data.entry(key.to_string()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(slot);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(slot);
                Ok(true)
            }
        }
    }

    fn del(&self, key: &str) -> Result<bool> {
        let now = self.clock.now();
        Ok(self
            .data
            .remove(key)
            .map(|(_, slot)| !slot.is_expired(now))
            .unwrap_or(false))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.read(key, false, |_| Ok(true))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        let now = self.clock.now();
        let mut refreshed = false;
        let mut stale = false;
        if let Some(mut slot) = self.data.get_mut(key) {
            if slot.is_expired(now) {
                stale = true;
            } else {
                slot.expires_at = Some(now.saturating_add(ttl));
                refreshed = true;
            }
        }
        if stale {
            self.data.remove_if(key, |_, s| s.is_expired(now));
        }
        Ok(refreshed)
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.update(
            key,
            || Stored::Str("0".to_string()),
            |key, slot| match &mut slot.value {
                Stored::Str(raw) => {
                    let next = parse_int(key, raw)? + delta;
                    *raw = next.to_string();
                    Ok(next)
                }
                other => Err(wrong_kind(key, "string", other.kind())),
            },
        )
    }

    fn h_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.read(key, None, |stored| match stored {
            Stored::Hash(map) => Ok(map.get(field).cloned()),
            other => Err(wrong_kind(key, "hash", other.kind())),
        })
    }

    fn h_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.update(
            key,
            || Stored::Hash(FxHashMap::default()),
            |key, slot| match &mut slot.value {
                Stored::Hash(map) => {
                    map.insert(field.to_string(), value.to_string());
                    Ok(())
                }
                other => Err(wrong_kind(key, "hash", other.kind())),
            },
        )
    }

    fn h_set_all(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        self.update(
            key,
            || Stored::Hash(FxHashMap::default()),
            |key, slot| match &mut slot.value {
                Stored::Hash(map) => {
                    for (field, value) in fields {
                        map.insert(field.clone(), value.clone());
                    }
                    Ok(())
                }
                other => Err(wrong_kind(key, "hash", other.kind())),
            },
        )
    }

    fn h_get_all(&self, key: &str) -> Result<Vec<(String, String)>> {
        self.read(key, Vec::new(), |stored| match stored {
            Stored::Hash(map) => {
                let mut fields: Vec<(String, String)> =
                    map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                fields.sort();
                Ok(fields)
            }
            other => Err(wrong_kind(key, "hash", other.kind())),
        })
    }

    fn h_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.update(
            key,
            || Stored::Hash(FxHashMap::default()),
            |key, slot| match &mut slot.value {
                Stored::Hash(map) => {
                    let current = match map.get(field) {
                        Some(raw) => parse_int(key, raw)?,
                        None => 0,
                    };
                    let next = current + delta;
                    map.insert(field.to_string(), next.to_string());
                    Ok(next)
                }
                other => Err(wrong_kind(key, "hash", other.kind())),
            },
        )
    }

    fn h_del(&self, key: &str, field: &str) -> Result<bool> {
        self.update(
            key,
            || Stored::Hash(FxHashMap::default()),
            |key, slot| match &mut slot.value {
                Stored::Hash(map) => Ok(map.remove(field).is_some()),
                other => Err(wrong_kind(key, "hash", other.kind())),
            },
        )
    }

    fn z_add(&self, key: &str, member: &str, score: f64) -> Result<bool> {
        self.update(
            key,
            || Stored::Sorted(ZSet::new()),
            |key, slot| match &mut slot.value {
                Stored::Sorted(zset) => Ok(zset.insert(member, score)),
                other => Err(wrong_kind(key, "zset", other.kind())),
            },
        )
    }

    fn z_rem(&self, key: &str, member: &str) -> Result<bool> {
        self.update(
            key,
            || Stored::Sorted(ZSet::new()),
            |key, slot| match &mut slot.value {
                Stored::Sorted(zset) => Ok(zset.remove(member)),
                other => Err(wrong_kind(key, "zset", other.kind())),
            },
        )
    }

    fn z_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.read(key, None, |stored| match stored {
            Stored::Sorted(zset) => Ok(zset.score(member)),
            other => Err(wrong_kind(key, "zset", other.kind())),
        })
    }

    fn z_incr_by(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        self.update(
            key,
            || Stored::Sorted(ZSet::new()),
            |key, slot| match &mut slot.value {
                Stored::Sorted(zset) => Ok(zset.incr(member, delta)),
                other => Err(wrong_kind(key, "zset", other.kind())),
            },
        )
    }

    fn z_card(&self, key: &str) -> Result<usize> {
        self.read(key, 0, |stored| match stored {
            Stored::Sorted(zset) => Ok(zset.len()),
            other => Err(wrong_kind(key, "zset", other.kind())),
        })
    }

    fn z_count(&self, key: &str, min: f64, max: f64) -> Result<usize> {
        self.read(key, 0, |stored| match stored {
            Stored::Sorted(zset) => Ok(zset.count_in(min, max)),
            other => Err(wrong_kind(key, "zset", other.kind())),
        })
    }

    fn z_range_by_rank(
        &self,
        key: &str,
        start: usize,
        stop: usize,
        order: Order,
    ) -> Result<Vec<ZEntry>> {
        self.read(key, Vec::new(), |stored| match stored {
            Stored::Sorted(zset) => Ok(zset.range_by_rank(start, stop, order)),
            other => Err(wrong_kind(key, "zset", other.kind())),
        })
    }

    fn z_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
    ) -> Result<Vec<ZEntry>> {
        self.read(key, Vec::new(), |stored| match stored {
            Stored::Sorted(zset) => Ok(zset.range_by_score(min, max, order)),
            other => Err(wrong_kind(key, "zset", other.kind())),
        })
    }

    fn z_rem_range_by_rank(&self, key: &str, start: usize, stop: usize) -> Result<usize> {
        self.update(
            key,
            || Stored::Sorted(ZSet::new()),
            |key, slot| match &mut slot.value {
                Stored::Sorted(zset) => Ok(zset.remove_range_by_rank(start, stop)),
                other => Err(wrong_kind(key, "zset", other.kind())),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrawl_core::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(Timestamp::from_secs(1_000)));
        let kv = MemoryStore::new(clock.clone());
        (clock, kv)
    }

    // ========== Strings and TTL ==========

    #[test]
    fn test_get_set_roundtrip() {
        let (_, kv) = store();
        assert_eq!(kv.get("k").unwrap(), None);
        kv.set("k", "v").unwrap();
        assert_eq!(kv.get("k").unwrap(), Some("v".to_string()));
        assert!(kv.del("k").unwrap());
        assert!(!kv.del("k").unwrap());
    }

    #[test]
    fn test_ttl_expiry_is_lazy_but_observed() {
        let (clock, kv) = store();
        kv.set_with_ttl("k", "v", Duration::from_secs(10)).unwrap();
        assert!(kv.exists("k").unwrap());
        clock.advance(Duration::from_secs(10));
        assert!(!kv.exists("k").unwrap());
        assert_eq!(kv.get("k").unwrap(), None);
    }

    #[test]
    fn test_set_clears_ttl() {
        let (clock, kv) = store();
        kv.set_with_ttl("k", "v", Duration::from_secs(10)).unwrap();
        kv.set("k", "w").unwrap();
        clock.advance(Duration::from_secs(3600));
        assert_eq!(kv.get("k").unwrap(), Some("w".to_string()));
    }

    #[test]
    fn test_set_nx_ex_only_sets_absent() {
        let (clock, kv) = store();
        assert!(kv.set_nx_ex("lock", "1", Duration::from_secs(5)).unwrap());
        assert!(!kv.set_nx_ex("lock", "1", Duration::from_secs(5)).unwrap());
        clock.advance(Duration::from_secs(5));
        // lease expired, lock can be taken again
        assert!(kv.set_nx_ex("lock", "1", Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn test_expire_refreshes_only_live_keys() {
        let (clock, kv) = store();
        assert!(!kv.expire("missing", Duration::from_secs(5)).unwrap());
        kv.set("k", "v").unwrap();
        assert!(kv.expire("k", Duration::from_secs(5)).unwrap());
        clock.advance(Duration::from_secs(5));
        assert!(!kv.exists("k").unwrap());
    }

    // ========== Counters ==========

    #[test]
    fn test_incr_by_creates_and_accumulates() {
        let (_, kv) = store();
        assert_eq!(kv.incr_by("c", 1).unwrap(), 1);
        assert_eq!(kv.incr_by("c", 2).unwrap(), 3);
        assert_eq!(kv.incr_by("c", -3).unwrap(), 0);
    }

    #[test]
    fn test_incr_preserves_ttl() {
        let (clock, kv) = store();
        kv.incr_by("c", 1).unwrap();
        kv.expire("c", Duration::from_secs(10)).unwrap();
        kv.incr_by("c", 1).unwrap();
        clock.advance(Duration::from_secs(10));
        // the window lapsed, counter restarts
        assert_eq!(kv.incr_by("c", 1).unwrap(), 1);
    }

    // ========== Hashes ==========

    #[test]
    fn test_hash_operations() {
        let (_, kv) = store();
        kv.h_set("h", "b", "2").unwrap();
        kv.h_set("h", "a", "1").unwrap();
        assert_eq!(kv.h_get("h", "a").unwrap(), Some("1".to_string()));
        assert_eq!(kv.h_get("h", "z").unwrap(), None);
        assert_eq!(
            kv.h_get_all("h").unwrap(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
        assert_eq!(kv.h_incr_by("h", "a", 4).unwrap(), 5);
        assert!(kv.h_del("h", "a").unwrap());
        assert!(!kv.h_del("h", "a").unwrap());
    }

    #[test]
    fn test_h_set_all() {
        let (_, kv) = store();
        kv.h_set_all(
            "h",
            &[
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "2".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(kv.h_get("h", "y").unwrap(), Some("2".to_string()));
    }

    // ========== Sorted sets ==========

    #[test]
    fn test_zset_through_trait() {
        let (_, kv) = store();
        assert!(kv.z_add("z", "a", 2.0).unwrap());
        assert!(kv.z_add("z", "b", 1.0).unwrap());
        assert!(!kv.z_add("z", "a", 3.0).unwrap());
        assert_eq!(kv.z_score("z", "a").unwrap(), Some(3.0));
        assert_eq!(kv.z_card("z").unwrap(), 2);
        let top = kv.z_range_by_rank("z", 0, 0, Order::Descending).unwrap();
        assert_eq!(top[0].member, "a");
        assert_eq!(kv.z_incr_by("z", "b", 9.0).unwrap(), 10.0);
        assert!(kv.z_rem("z", "a").unwrap());
        assert_eq!(kv.z_card("z").unwrap(), 1);
    }

    #[test]
    fn test_zset_missing_key_reads_as_empty() {
        let (_, kv) = store();
        assert_eq!(kv.z_card("nope").unwrap(), 0);
        assert_eq!(kv.z_score("nope", "a").unwrap(), None);
        assert!(kv
            .z_range_by_rank("nope", 0, 10, Order::Ascending)
            .unwrap()
            .is_empty());
    }

    // ========== Kind mismatches ==========

    #[test]
    fn test_wrong_kind_is_fatal() {
        let (_, kv) = store();
        kv.set("k", "v").unwrap();
        let err = kv.h_get("k", "f").unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
        let err = kv.z_card("k").unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
    }

    #[test]
    fn test_expired_key_can_change_kind() {
        let (clock, kv) = store();
        kv.set_with_ttl("k", "v", Duration::from_secs(1)).unwrap();
        clock.advance(Duration::from_secs(2));
        // expired string slot is replaced, not a kind error
        assert_eq!(kv.h_incr_by("k", "f", 1).unwrap(), 1);
    }
}
