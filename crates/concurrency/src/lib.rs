//! Concurrency substrate: lease locks, sliding-window rate limits, and
//! cached reads
//!
//! Everything here is built from single KV round-trips. There is no
//! process-resident coordination; two engine instances sharing a store get
//! the same guarantees as one.
//!
//! Locks are leases: a holder must assume the lease can expire mid-section
//! and keep every protected write idempotent or monotone.

mod cache;
mod lock;
mod ratelimit;

pub use cache::cached;
pub use lock::LeaseLock;
pub use ratelimit::is_rate_limited;
