//! Namespaced store handles
//!
//! A [`StoreHandle`] is how domain code reaches the KV store. The default
//! handle for a community prefixes every key with `<community>:`, giving
//! each installation its own partition; `global()` drops the prefix and
//! reaches the namespace shared across communities (identity caches, the
//! score ladder, global indexes). Semantics are identical either way.

use std::sync::Arc;
use std::time::Duration;

use scrawl_core::Result;

use crate::kv::Kv;
use crate::zset::{Order, ZEntry};

/// Cloneable, namespaced view over a shared [`Kv`] store
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn Kv>,
    prefix: Option<Arc<str>>,
}

impl StoreHandle {
    /// Handle over the shared (global) namespace
    pub fn new(store: Arc<dyn Kv>) -> Self {
        Self {
            store,
            prefix: None,
        }
    }

    /// Handle scoped to a community partition
    pub fn scoped(&self, community: &str) -> StoreHandle {
        StoreHandle {
            store: self.store.clone(),
            prefix: Some(Arc::from(community)),
        }
    }

    /// The shared namespace view of the same store
    pub fn global(&self) -> StoreHandle {
        StoreHandle {
            store: self.store.clone(),
            prefix: None,
        }
    }

    /// Whether this handle reaches the shared namespace
    pub fn is_global(&self) -> bool {
        self.prefix.is_none()
    }

    fn full_key(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}

impl Kv for StoreHandle {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.store.get(&self.full_key(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.store.set(&self.full_key(key), value)
    }

    fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.store.set_with_ttl(&self.full_key(key), value, ttl)
    }

    fn set_nx_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        self.store.set_nx_ex(&self.full_key(key), value, ttl)
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.store.del(&self.full_key(key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        self.store.exists(&self.full_key(key))
    }

    fn expire(&self, key: &str, ttl: Duration) -> Result<bool> {
        self.store.expire(&self.full_key(key), ttl)
    }

    fn incr_by(&self, key: &str, delta: i64) -> Result<i64> {
        self.store.incr_by(&self.full_key(key), delta)
    }

    fn h_get(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.store.h_get(&self.full_key(key), field)
    }

    fn h_set(&self, key: &str, field: &str, value: &str) -> Result<()> {
        self.store.h_set(&self.full_key(key), field, value)
    }

    fn h_set_all(&self, key: &str, fields: &[(String, String)]) -> Result<()> {
        self.store.h_set_all(&self.full_key(key), fields)
    }

    fn h_get_all(&self, key: &str) -> Result<Vec<(String, String)>> {
        self.store.h_get_all(&self.full_key(key))
    }

    fn h_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64> {
        self.store.h_incr_by(&self.full_key(key), field, delta)
    }

    fn h_del(&self, key: &str, field: &str) -> Result<bool> {
        self.store.h_del(&self.full_key(key), field)
    }

    fn z_add(&self, key: &str, member: &str, score: f64) -> Result<bool> {
        self.store.z_add(&self.full_key(key), member, score)
    }

    fn z_rem(&self, key: &str, member: &str) -> Result<bool> {
        self.store.z_rem(&self.full_key(key), member)
    }

    fn z_score(&self, key: &str, member: &str) -> Result<Option<f64>> {
        self.store.z_score(&self.full_key(key), member)
    }

    fn z_incr_by(&self, key: &str, member: &str, delta: f64) -> Result<f64> {
        self.store.z_incr_by(&self.full_key(key), member, delta)
    }

    fn z_card(&self, key: &str) -> Result<usize> {
        self.store.z_card(&self.full_key(key))
    }

    fn z_count(&self, key: &str, min: f64, max: f64) -> Result<usize> {
        self.store.z_count(&self.full_key(key), min, max)
    }

    fn z_range_by_rank(
        &self,
        key: &str,
        start: usize,
        stop: usize,
        order: Order,
    ) -> Result<Vec<ZEntry>> {
        self.store
            .z_range_by_rank(&self.full_key(key), start, stop, order)
    }

    fn z_range_by_score(
        &self,
        key: &str,
        min: f64,
        max: f64,
        order: Order,
    ) -> Result<Vec<ZEntry>> {
        self.store
            .z_range_by_score(&self.full_key(key), min, max, order)
    }

    fn z_rem_range_by_rank(&self, key: &str, start: usize, stop: usize) -> Result<usize> {
        self.store
            .z_rem_range_by_rank(&self.full_key(key), start, stop)
    }
}
