//! Persisted cache snapshot.
//!
//! The shape is an implementation contract with ourselves only; no
//! schema version is written. A format change makes old snapshots fail
//! to parse, which rehydration treats as "no snapshot".

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::entry::{CacheEntry, QueryStatus};
use super::key::QueryKey;
use super::tag::Tag;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub entries: Vec<(QueryKey, CacheEntry)>,
    pub tags: Vec<(Tag, Vec<QueryKey>)>,
}

impl Snapshot {
    /// Capture current state. Pending entries are skipped: they carry
    /// no data and would rehydrate as reads that never resolve.
    pub fn capture(
        entries: &HashMap<QueryKey, CacheEntry>,
        tag_index: &HashMap<Tag, HashSet<QueryKey>>,
    ) -> Self {
        let entries: Vec<(QueryKey, CacheEntry)> = entries
            .iter()
            .filter(|(_, entry)| entry.status != QueryStatus::Pending)
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        let tags = tag_index
            .iter()
            .map(|(tag, keys)| {
                let mut keys: Vec<QueryKey> = keys.iter().cloned().collect();
                keys.sort_by(|a, b| (&a.endpoint, &a.args).cmp(&(&b.endpoint, &b.args)));
                (tag.clone(), keys)
            })
            .collect();

        Self { entries, tags }
    }

    /// Rebuild the entry and tag maps this snapshot was captured from.
    pub fn restore(
        self,
    ) -> (
        HashMap<QueryKey, CacheEntry>,
        HashMap<Tag, HashSet<QueryKey>>,
    ) {
        let entries: HashMap<QueryKey, CacheEntry> = self.entries.into_iter().collect();
        let mut tag_index: HashMap<Tag, HashSet<QueryKey>> = HashMap::new();
        for (tag, keys) in self.tags {
            // Drop edges to entries that were pending (and thus skipped)
            // at capture time.
            let keys: HashSet<QueryKey> = keys
                .into_iter()
                .filter(|key| entries.contains_key(key))
                .collect();
            if !keys.is_empty() {
                tag_index.insert(tag, keys);
            }
        }
        (entries, tag_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fulfilled(args: serde_json::Value, data: serde_json::Value) -> CacheEntry {
        let mut entry = CacheEntry::new(args);
        entry.fulfill(data);
        entry
    }

    #[test]
    fn test_round_trip_preserves_entries_and_edges() {
        let key = QueryKey::new("get_posts", &json!(null)).unwrap();
        let mut entries = HashMap::new();
        entries.insert(key.clone(), fulfilled(json!(null), json!([{"id": 1}])));

        let mut tag_index = HashMap::new();
        tag_index.insert(
            Tag::list("Posts"),
            [key.clone()].into_iter().collect::<HashSet<_>>(),
        );
        tag_index.insert(
            Tag::id("Posts", 1),
            [key.clone()].into_iter().collect::<HashSet<_>>(),
        );

        let snapshot = Snapshot::capture(&entries, &tag_index);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();
        let (entries2, tags2) = parsed.restore();

        assert_eq!(entries2.len(), 1);
        assert_eq!(entries2[&key].data, Some(json!([{"id": 1}])));
        assert_eq!(tags2.len(), 2);
        assert!(tags2[&Tag::id("Posts", 1)].contains(&key));
    }

    #[test]
    fn test_pending_entries_are_skipped() {
        let key = QueryKey::new("get_users", &json!(null)).unwrap();
        let mut entries = HashMap::new();
        entries.insert(key.clone(), CacheEntry::new(json!(null)));

        let mut tag_index = HashMap::new();
        tag_index.insert(
            Tag::list("Users"),
            [key].into_iter().collect::<HashSet<_>>(),
        );

        let (entries2, tags2) = Snapshot::capture(&entries, &tag_index).restore();
        assert!(entries2.is_empty());
        assert!(tags2.is_empty());
    }
}
