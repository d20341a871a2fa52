//! The request cache.
//!
//! `QueryCache` is the heart of the crate: it keys fetch results by
//! endpoint + canonical arguments, coalesces concurrent reads into one
//! in-flight network call, tracks subscribers with RAII handles, links
//! entries to invalidation tags, and snapshots its state through the
//! storage bridge after every successful fetch or write.
//!
//! Layout:
//! - `key`: canonical `(endpoint, args)` cache keys
//! - `tag`: invalidation tags and helpers
//! - `entry`: per-key entry state machine
//! - `snapshot`: the persisted `{entries, tag index}` shape
//! - `store`: `QueryCache` itself plus `QuerySubscription`

pub mod entry;
pub mod key;
pub mod snapshot;
pub mod store;
pub mod tag;

pub use entry::{CacheEntry, QueryStatus};
pub use key::QueryKey;
pub use snapshot::Snapshot;
pub use store::{QueryCache, QuerySubscription, ReadOptions};
pub use tag::Tag;
