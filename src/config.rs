//! Cache and API configuration.
//!
//! Base URLs, the User-Agent the HeadHunter API requires, and the cache
//! retention knobs all live here so tests can construct a `QueryCache`
//! with short windows and a throwaway storage location.

use std::time::Duration;

/// Default idle retention for entries that lost their last subscriber.
/// 60 seconds matches the common case of navigating away and back.
const DEFAULT_KEEP_UNUSED_SECS: u64 = 60;

/// Storage key under which the cache snapshot is persisted.
const SNAPSHOT_KEY: &str = "hirecache_snapshot";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the placeholder content API (posts, users, jobs).
    pub content_base_url: String,
    /// Base URL for the HeadHunter API.
    pub hh_base_url: String,
    /// User-Agent sent with every request; HeadHunter rejects requests
    /// without one.
    pub user_agent: String,
    /// How long an entry with zero subscribers is kept before eviction.
    /// Endpoints may override this individually (e.g. the areas
    /// dictionary keeps for a day).
    pub keep_unused_for: Duration,
    /// Key under which the snapshot is written to the storage backend.
    pub snapshot_key: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_base_url: "https://jsonplaceholder.typicode.com".to_string(),
            hh_base_url: "https://api.hh.ru".to_string(),
            user_agent: "hirecache/0.2 (jobsearch@example.com)".to_string(),
            keep_unused_for: Duration::from_secs(DEFAULT_KEEP_UNUSED_SECS),
            snapshot_key: SNAPSHOT_KEY.to_string(),
        }
    }
}

impl Config {
    /// Config with a custom idle window, for tests that exercise
    /// eviction without waiting a minute of clock.
    pub fn with_keep_unused(mut self, keep: Duration) -> Self {
        self.keep_unused_for = keep;
        self
    }
}
