//! hirecache - a tag-invalidating request cache for job-search REST APIs.
//!
//! This crate wraps two REST backends (a placeholder content API for
//! posts/users/jobs and the HeadHunter public API for vacancy search)
//! behind a declarative caching layer:
//!
//! - `QueryCache` stores fetch results keyed by endpoint + arguments,
//!   coalesces concurrent reads into a single network call, and tracks
//!   subscriber counts with idle eviction.
//! - Successful reads link their entries to `Tag`s; mutations declare
//!   which tags they invalidate, which marks dependent entries stale
//!   and refetches the ones still subscribed.
//! - A persistence bridge snapshots cache state to a durable key-value
//!   backend after every successful fetch or write and rehydrates it
//!   at startup, so the app works offline.
//!
//! The actual HTTP transport and the storage backend are collaborator
//! traits, so tests inject mocks and the cache itself stays free of
//! I/O policy.

pub mod api;
pub mod cache;
pub mod config;
pub mod endpoints;
pub mod models;
pub mod storage;

pub use api::{ApiError, HttpTransport, QueryError, RequestDescriptor, Transport};
pub use cache::{CacheEntry, QueryCache, QueryKey, QueryStatus, QuerySubscription, ReadOptions, Tag};
pub use config::Config;
pub use endpoints::EndpointRegistry;
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
