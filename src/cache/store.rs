//! The query cache itself.
//!
//! All state mutation happens inside short critical sections of one
//! mutex, never across an `.await`; network fetches are the only
//! suspension points and run outside the lock. Concurrent reads of the
//! same key share a single in-flight future; a spawned driver task
//! guarantees the fetch completes and its result is cached even if
//! every reader unsubscribes mid-flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiError, HttpTransport, QueryError, Transport};
use crate::config::Config;
use crate::endpoints::EndpointRegistry;
use crate::storage::{FileStorage, StorageBackend};

use super::entry::{CacheEntry, QueryStatus};
use super::key::QueryKey;
use super::snapshot::Snapshot;
use super::tag::Tag;

/// One in-flight fetch, shared by every concurrent reader of its key.
type FetchFuture = Shared<BoxFuture<'static, Result<Value, QueryError>>>;

/// Per-read behavior flags, mirroring what a UI layer would ask for
/// when mounting an observer.
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Subscribe without fetching.
    pub skip: bool,
    /// Refetch on this cadence while the subscription is alive.
    pub poll_interval: Option<Duration>,
    /// Refetch this entry when `notify_focus` fires.
    pub refetch_on_focus: bool,
    /// Refetch this entry when `notify_reconnect` fires.
    pub refetch_on_reconnect: bool,
}

struct CacheState {
    entries: HashMap<QueryKey, CacheEntry>,
    tag_index: HashMap<Tag, HashSet<QueryKey>>,
    inflight: HashMap<QueryKey, FetchFuture>,
}

struct Inner {
    registry: EndpointRegistry,
    transport: Arc<dyn Transport>,
    storage: Arc<dyn StorageBackend>,
    config: Config,
    state: Mutex<CacheState>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().expect("cache state mutex poisoned")
    }

    /// Serialize and store the current snapshot. Best-effort: failures
    /// are logged and never propagate to the read/write that triggered
    /// the persist.
    fn persist(&self) {
        let json = {
            let state = self.state();
            serde_json::to_string(&Snapshot::capture(&state.entries, &state.tag_index))
        };
        match json {
            Ok(json) => {
                if let Err(e) = self.storage.set_item(&self.config.snapshot_key, &json) {
                    warn!(error = %e, "Failed to persist cache snapshot");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize cache snapshot"),
        }
    }

    /// Record a settled fetch: update the entry, recompute its tag
    /// edges from the new result, and drop the in-flight handle. The
    /// entry may have been evicted or reset while the fetch was out;
    /// the result is discarded in that case.
    fn complete_fetch(&self, key: &QueryKey, outcome: &Result<Value, QueryError>) {
        {
            let mut guard = self.state();
            // Reborrow so entry and tag_index borrows stay disjoint.
            let state = &mut *guard;
            state.inflight.remove(key);

            let Some(entry) = state.entries.get_mut(key) else {
                debug!(key = %key, "Entry gone before fetch settled; result discarded");
                return;
            };

            match outcome {
                Ok(data) => {
                    entry.fulfill(data.clone());
                    let args = entry.args.clone();
                    let tags = match self.registry.query(&key.endpoint) {
                        Ok(endpoint) => endpoint.tags(data, &args),
                        Err(_) => HashSet::new(),
                    };
                    // Replace edges from any prior fetch of this key.
                    for keys in state.tag_index.values_mut() {
                        keys.remove(key);
                    }
                    state.tag_index.retain(|_, keys| !keys.is_empty());
                    for tag in tags {
                        state.tag_index.entry(tag).or_default().insert(key.clone());
                    }
                }
                Err(error) => entry.reject(error.clone()),
            }
        }

        if outcome.is_ok() {
            self.persist();
        }
    }
}

/// Arm the idle-eviction timer for a key with no subscribers. The
/// timer captures the entry's epoch; any later subscribe, fetch, or
/// invalidation bumps the epoch and the timer stands down (paths that
/// bump it while the entry stays unsubscribed go through
/// `rearm_if_idle` for a replacement). Without a runtime the entry
/// simply lingers.
fn arm_eviction(inner: &Arc<Inner>, key: QueryKey, epoch: u64, keep: Duration) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        debug!(key = %key, "No async runtime; idle entry retained");
        return;
    };
    let inner = Arc::clone(inner);
    handle.spawn(async move {
        tokio::time::sleep(keep).await;
        let mut state = inner.state();
        let evict = matches!(
            state.entries.get(&key),
            Some(entry) if entry.subscribers == 0 && entry.epoch == epoch
        );
        if evict {
            state.entries.remove(&key);
            for keys in state.tag_index.values_mut() {
                keys.remove(&key);
            }
            state.tag_index.retain(|_, keys| !keys.is_empty());
            debug!(key = %key, "Evicted idle cache entry");
        }
    });
}

/// Idle retention for a key: the endpoint's override, else the
/// cache-wide default.
fn keep_window(inner: &Inner, endpoint: &str) -> Duration {
    inner
        .registry
        .query(endpoint)
        .ok()
        .and_then(|endpoint| endpoint.keep_unused_for)
        .unwrap_or(inner.config.keep_unused_for)
}

/// Re-arm the idle timer for a key whose epoch moved while it had no
/// subscribers. Invalidation and late-settling fetches bump the epoch,
/// which stands any armed timer down; without a replacement the idle
/// entry would be retained forever.
fn rearm_if_idle(inner: &Arc<Inner>, key: &QueryKey) {
    let epoch = {
        let state = inner.state();
        match state.entries.get(key) {
            Some(entry) if entry.subscribers == 0 => Some(entry.epoch),
            _ => None,
        }
    };
    if let Some(epoch) = epoch {
        let keep = keep_window(inner, &key.endpoint);
        arm_eviction(inner, key.clone(), epoch, keep);
    }
}

/// The request cache.
///
/// Explicitly constructed and injectable - tests build isolated
/// instances with mock collaborators; nothing here is a global.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    /// Build a cache over the given collaborators, rehydrating any
    /// prior snapshot from storage. A missing or unparseable snapshot
    /// is not an error; the cache starts empty.
    pub fn new(
        registry: EndpointRegistry,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn StorageBackend>,
        config: Config,
    ) -> Self {
        let (entries, tag_index) = match storage.get_item(&config.snapshot_key) {
            Ok(Some(raw)) => match serde_json::from_str::<Snapshot>(&raw) {
                Ok(snapshot) => snapshot.restore(),
                Err(e) => {
                    debug!(error = %e, "Discarding unparseable cache snapshot");
                    (HashMap::new(), HashMap::new())
                }
            },
            Ok(None) => (HashMap::new(), HashMap::new()),
            Err(e) => {
                warn!(error = %e, "Failed to read cache snapshot; starting empty");
                (HashMap::new(), HashMap::new())
            }
        };

        Self {
            inner: Arc::new(Inner {
                registry,
                transport,
                storage,
                config,
                state: Mutex::new(CacheState {
                    entries,
                    tag_index,
                    inflight: HashMap::new(),
                }),
            }),
        }
    }

    /// Production wiring: every standard endpoint, a reqwest transport,
    /// and an on-disk snapshot under the platform cache directory.
    pub fn standard(config: Config) -> anyhow::Result<Self> {
        let registry = EndpointRegistry::standard(&config);
        let transport = Arc::new(HttpTransport::new(&config)?);
        let storage = Arc::new(FileStorage::default_location()?);
        Ok(Self::new(registry, transport, storage, config))
    }

    /// Subscribe to a query and (unless fresh or skipped) fetch it.
    ///
    /// Returns an RAII subscription; dropping it releases the
    /// subscriber count and, on the last release, arms the idle
    /// eviction timer. The fetch outcome is read off the subscription
    /// (`data`/`error`/`outcome`), so a network failure does not fail
    /// `read` itself - only an unknown endpoint or unserializable
    /// arguments do.
    pub async fn read(
        &self,
        endpoint: &str,
        args: Value,
        options: ReadOptions,
    ) -> Result<QuerySubscription, ApiError> {
        self.inner.registry.query(endpoint)?;
        let key = QueryKey::new(endpoint, &args)?;

        let needs_fetch = {
            let mut state = self.inner.state();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(args.clone()));
            entry.subscribers += 1;
            entry.epoch += 1;
            if options.refetch_on_focus {
                entry.focus_subscribers += 1;
            }
            if options.refetch_on_reconnect {
                entry.reconnect_subscribers += 1;
            }
            !options.skip && !entry.is_fresh()
        };

        let mut subscription =
            QuerySubscription::new(Arc::clone(&self.inner), key.clone(), options.clone());

        if needs_fetch {
            let fetch = self.ensure_fetch(&key)?;
            let _ = fetch.await;
        }
        if let Some(interval) = options.poll_interval {
            subscription.start_polling(interval);
        }
        Ok(subscription)
    }

    /// Fetch-and-store without subscribing, so a later `read` hits.
    pub async fn prefetch(&self, endpoint: &str, args: Value) -> Result<(), ApiError> {
        self.inner.registry.query(endpoint)?;
        let key = QueryKey::new(endpoint, &args)?;

        let needs_fetch = {
            let mut state = self.inner.state();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(args.clone()));
            !entry.is_fresh()
        };
        if needs_fetch {
            let fetch = self.ensure_fetch(&key)?;
            let _ = fetch.await;
        }
        Ok(())
    }

    /// Perform a mutation. The network call is never cached; on success
    /// the mutation's declared tags are invalidated and the snapshot is
    /// refreshed. A failed write invalidates nothing.
    pub async fn write(&self, endpoint: &str, args: Value) -> Result<Value, ApiError> {
        let mutation = self.inner.registry.mutation(endpoint)?;
        let request = mutation.request(&args)?;
        let result = self.inner.transport.perform(&request).await?;

        let tags: Vec<Tag> = mutation.tags(&result, &args).into_iter().collect();
        self.invalidate_tags(&tags);
        self.inner.persist();
        Ok(result)
    }

    /// Mark every entry linked to any of `tags` stale. Entries with at
    /// least one subscriber refetch immediately (unordered relative to
    /// each other); the rest stay stale until their next read. Unknown
    /// tags are a no-op.
    pub fn invalidate_tags(&self, tags: &[Tag]) {
        let (refetch, idle) = {
            let mut state = self.inner.state();
            let mut affected: HashSet<QueryKey> = HashSet::new();
            for tag in tags {
                if let Some(keys) = state.tag_index.get(tag) {
                    affected.extend(keys.iter().cloned());
                }
            }

            let mut refetch = Vec::new();
            let mut idle = Vec::new();
            for key in affected {
                if let Some(entry) = state.entries.get_mut(&key) {
                    entry.mark_stale();
                    if entry.subscribers > 0 {
                        refetch.push(key);
                    } else {
                        idle.push(key);
                    }
                }
            }
            (refetch, idle)
        };

        for key in refetch {
            if let Err(e) = self.ensure_fetch(&key) {
                warn!(key = %key, error = %e, "Failed to refetch invalidated entry");
            }
        }
        // mark_stale stood any armed timer down; stale idle entries
        // still have to age out.
        for key in idle {
            rearm_if_idle(&self.inner, &key);
        }
    }

    /// Refetch subscribed entries that opted into refetch-on-focus.
    /// Stands in for the browser's window-focus event.
    pub fn notify_focus(&self) {
        self.refetch_where(|entry| entry.focus_subscribers > 0);
    }

    /// Refetch subscribed entries that opted into refetch-on-reconnect.
    pub fn notify_reconnect(&self) {
        self.refetch_where(|entry| entry.reconnect_subscribers > 0);
    }

    fn refetch_where(&self, pred: impl Fn(&CacheEntry) -> bool) {
        let keys: Vec<QueryKey> = {
            let state = self.inner.state();
            state
                .entries
                .iter()
                .filter(|(_, entry)| entry.subscribers > 0 && pred(entry))
                .map(|(key, _)| key.clone())
                .collect()
        };
        for key in keys {
            if let Err(e) = self.ensure_fetch(&key) {
                warn!(key = %key, error = %e, "Failed to refetch entry");
            }
        }
    }

    /// Drop every entry, edge, and in-flight handle, and clear the
    /// persisted snapshot. Live subscriptions keep their handles but
    /// their entries are gone until refetched.
    pub fn reset_all(&self) {
        {
            let mut state = self.inner.state();
            state.entries.clear();
            state.tag_index.clear();
            state.inflight.clear();
        }
        if let Err(e) = self.inner.storage.remove_item(&self.inner.config.snapshot_key) {
            warn!(error = %e, "Failed to clear persisted snapshot");
        }
    }

    /// Cached data for an endpoint + args, if fulfilled.
    pub fn data(&self, endpoint: &str, args: &Value) -> Option<Value> {
        let key = QueryKey::new(endpoint, args).ok()?;
        let state = self.inner.state();
        state.entries.get(&key).and_then(|entry| entry.data.clone())
    }

    /// All tags currently linked to at least one entry.
    pub fn provided_tags(&self) -> Vec<Tag> {
        let state = self.inner.state();
        state.tag_index.keys().cloned().collect()
    }

    pub fn entry_count(&self) -> usize {
        self.inner.state().entries.len()
    }

    /// Start (or join) the in-flight fetch for a key. Exactly one
    /// transport call happens per key at a time: the first caller
    /// installs the shared future and spawns a driver task so it
    /// settles even if every waiter drops; later callers clone it.
    fn ensure_fetch(&self, key: &QueryKey) -> Result<FetchFuture, ApiError> {
        let mut state = self.inner.state();
        if let Some(existing) = state.inflight.get(key) {
            return Ok(existing.clone());
        }

        let args = match state.entries.get_mut(key) {
            Some(entry) => {
                entry.status = QueryStatus::Pending;
                entry.epoch += 1;
                entry.args.clone()
            }
            None => {
                // The entry can disappear between scheduling and
                // fetching (reset_all, eviction). Rebuild it from the
                // key's canonical args.
                let args: Value = serde_json::from_str(&key.args)
                    .map_err(|e| ApiError::InvalidArgs(format!("{}: {}", key, e)))?;
                state
                    .entries
                    .insert(key.clone(), CacheEntry::new(args.clone()));
                args
            }
        };

        let endpoint = self.inner.registry.query(&key.endpoint)?;
        let request = endpoint.request(&args)?;

        let inner = Arc::clone(&self.inner);
        let fetch_key = key.clone();
        let fetch: FetchFuture = async move {
            let outcome = match inner.transport.perform(&request).await {
                Ok(raw) => {
                    let data = match inner.registry.query(&fetch_key.endpoint) {
                        Ok(endpoint) => endpoint.apply_transform(raw),
                        Err(_) => raw,
                    };
                    Ok(data)
                }
                Err(e) => {
                    debug!(key = %fetch_key, error = %e, "Fetch failed");
                    Err(e.normalized())
                }
            };
            inner.complete_fetch(&fetch_key, &outcome);
            // Prefetches and fetches that settle after the last
            // unsubscribe leave an idle entry behind.
            rearm_if_idle(&inner, &fetch_key);
            outcome
        }
        .boxed()
        .shared();

        state.inflight.insert(key.clone(), fetch.clone());

        // Drive the fetch to completion independently of its waiters,
        // so an unsubscribe mid-flight never loses the result.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(fetch.clone());
        }

        Ok(fetch)
    }
}

/// RAII subscription handle returned by `read`.
///
/// Holds the subscriber count for its key; dropping it releases the
/// count on every exit path and aborts any polling task. The last drop
/// arms the entry's idle-eviction timer.
pub struct QuerySubscription {
    inner: Arc<Inner>,
    key: QueryKey,
    options: ReadOptions,
    poll_task: Option<JoinHandle<()>>,
}

impl QuerySubscription {
    fn new(inner: Arc<Inner>, key: QueryKey, options: ReadOptions) -> Self {
        Self {
            inner,
            key,
            options,
            poll_task: None,
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    pub fn status(&self) -> Option<QueryStatus> {
        let state = self.inner.state();
        state.entries.get(&self.key).map(|entry| entry.status)
    }

    pub fn data(&self) -> Option<Value> {
        let state = self.inner.state();
        state.entries.get(&self.key).and_then(|entry| entry.data.clone())
    }

    pub fn error(&self) -> Option<QueryError> {
        let state = self.inner.state();
        state.entries.get(&self.key).and_then(|entry| entry.error.clone())
    }

    /// The settled outcome, if any: data for fulfilled entries, the
    /// cached error for rejected ones.
    pub fn outcome(&self) -> Option<Result<Value, QueryError>> {
        let state = self.inner.state();
        let entry = state.entries.get(&self.key)?;
        match entry.status {
            QueryStatus::Fulfilled => entry.data.clone().map(Ok),
            QueryStatus::Rejected => entry.error.clone().map(Err),
            QueryStatus::Pending => None,
        }
    }

    /// Explicit retry/refresh: clears a cached rejection and fetches
    /// again, coalescing with any fetch already in flight.
    pub async fn refetch(&self) -> Result<Value, QueryError> {
        {
            let mut state = self.inner.state();
            if let Some(entry) = state.entries.get_mut(&self.key) {
                entry.error = None;
                entry.stale = true;
                entry.epoch += 1;
            }
        }
        let cache = QueryCache {
            inner: Arc::clone(&self.inner),
        };
        match cache.ensure_fetch(&self.key) {
            Ok(fetch) => fetch.await,
            Err(e) => Err(e.normalized()),
        }
    }

    fn start_polling(&mut self, interval: Duration) {
        let inner = Arc::clone(&self.inner);
        let key = self.key.clone();
        self.poll_task = Some(tokio::spawn(async move {
            let cache = QueryCache { inner };
            loop {
                tokio::time::sleep(interval).await;
                match cache.ensure_fetch(&key) {
                    Ok(fetch) => {
                        let _ = fetch.await;
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Polling fetch failed to start");
                        break;
                    }
                }
            }
        }));
    }
}

impl std::fmt::Debug for QuerySubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuerySubscription")
            .field("key", &self.key)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Drop for QuerySubscription {
    fn drop(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }

        let released = {
            let mut state = self.inner.state();
            match state.entries.get_mut(&self.key) {
                Some(entry) => {
                    entry.subscribers = entry.subscribers.saturating_sub(1);
                    if self.options.refetch_on_focus {
                        entry.focus_subscribers = entry.focus_subscribers.saturating_sub(1);
                    }
                    if self.options.refetch_on_reconnect {
                        entry.reconnect_subscribers =
                            entry.reconnect_subscribers.saturating_sub(1);
                    }
                    if entry.subscribers == 0 {
                        entry.epoch += 1;
                        Some(entry.epoch)
                    } else {
                        None
                    }
                }
                None => None,
            }
        };

        if let Some(epoch) = released {
            let keep = keep_window(&self.inner, &self.key.endpoint);
            arm_eviction(&self.inner, self.key.clone(), epoch, keep);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
