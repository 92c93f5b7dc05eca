//! Key-value abstraction for the Scrawl game engine
//!
//! The engine treats the host platform's KV store as its only shared state.
//! This crate defines that capability surface as the [`Kv`] trait: strings,
//! hashes, sorted sets, atomic counters, and a set-if-absent-with-expiry
//! primitive. [`MemoryStore`] is a DashMap-backed implementation used in
//! production-shaped tests and local runs.
//!
//! [`StoreHandle`] layers namespacing on top: a handle scoped to a community
//! prefixes every key, while `global()` reaches the shared namespace with
//! identical semantics.
//!
//! TTL is logical: expired slots are treated as absent at access time and
//! removed lazily.

mod handle;
mod kv;
mod memory;
mod slot;
mod zset;

pub use handle::StoreHandle;
pub use kv::Kv;
pub use memory::MemoryStore;
pub use zset::{Order, ZEntry, ZSet};
