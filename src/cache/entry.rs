use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Pending,
    Fulfilled,
    Rejected,
}

/// Cached state for one endpoint + arguments combination.
///
/// Runtime-only fields (subscriber counts, epoch) are skipped when the
/// entry is snapshotted; a rehydrated entry starts with zero
/// subscribers and epoch zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Original arguments, kept so invalidation-triggered refetches and
    /// tag recomputation can rebuild the request.
    pub args: Value,
    pub status: QueryStatus,
    pub data: Option<Value>,
    pub error: Option<QueryError>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    /// Marked by tag invalidation; a stale entry refetches on next read
    /// (or immediately, if subscribed).
    pub stale: bool,

    #[serde(skip)]
    pub subscribers: usize,
    /// Subscribers that asked for refetch-on-focus / refetch-on-reconnect.
    #[serde(skip)]
    pub focus_subscribers: usize,
    #[serde(skip)]
    pub reconnect_subscribers: usize,
    /// Bumped on every state transition. Eviction timers and fetch
    /// completions capture the epoch they started from and give up if
    /// it moved, so a superseded timer never clobbers newer state.
    #[serde(skip)]
    pub epoch: u64,
}

impl CacheEntry {
    pub fn new(args: Value) -> Self {
        Self {
            args,
            status: QueryStatus::Pending,
            data: None,
            error: None,
            last_fetched_at: None,
            stale: false,
            subscribers: 0,
            focus_subscribers: 0,
            reconnect_subscribers: 0,
            epoch: 0,
        }
    }

    /// Whether a read of this entry can be served without a fetch.
    pub fn is_fresh(&self) -> bool {
        !self.stale
            && matches!(self.status, QueryStatus::Fulfilled | QueryStatus::Rejected)
    }

    pub fn fulfill(&mut self, data: Value) {
        self.status = QueryStatus::Fulfilled;
        self.data = Some(data);
        self.error = None;
        self.stale = false;
        self.last_fetched_at = Some(Utc::now());
        self.epoch += 1;
    }

    pub fn reject(&mut self, error: QueryError) {
        self.status = QueryStatus::Rejected;
        self.error = Some(error);
        self.stale = false;
        self.last_fetched_at = Some(Utc::now());
        self.epoch += 1;
    }

    pub fn mark_stale(&mut self) {
        self.stale = true;
        self.epoch += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fulfill_clears_prior_error() {
        let mut entry = CacheEntry::new(json!(null));
        entry.reject(QueryError {
            status: Some(500),
            message: "boom".to_string(),
        });
        assert!(entry.is_fresh());
        assert_eq!(entry.status, QueryStatus::Rejected);

        entry.fulfill(json!([1, 2]));
        assert_eq!(entry.status, QueryStatus::Fulfilled);
        assert!(entry.error.is_none());
        assert!(!entry.stale);
    }

    #[test]
    fn test_stale_entry_is_not_fresh() {
        let mut entry = CacheEntry::new(json!(null));
        entry.fulfill(json!({}));
        entry.mark_stale();
        assert!(!entry.is_fresh());
    }

    #[test]
    fn test_runtime_fields_survive_serde_as_defaults() {
        let mut entry = CacheEntry::new(json!(1));
        entry.fulfill(json!("x"));
        entry.subscribers = 3;
        entry.epoch = 9;

        let round: CacheEntry =
            serde_json::from_str(&serde_json::to_string(&entry).unwrap()).unwrap();
        assert_eq!(round.subscribers, 0);
        assert_eq!(round.epoch, 0);
        assert_eq!(round.data, Some(json!("x")));
    }
}
