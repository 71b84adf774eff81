//! Keyed cache for remote reads.
//!
//! Each key holds at most one value and one in-flight request. Concurrent
//! reads of a key join the same request, fresh values are served without a
//! request, stale values are served while a refresh runs in the background,
//! and an invalidated key is refetched on its next read. Keys nobody has
//! read for the gc window are dropped on the next fetch.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

// longest stale window is the catalog's ten minutes
const DEFAULT_GC_TIME: Duration = Duration::from_secs(15 * 60);

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, ApiError>>>;

/// `(resource, params)` identifier of a cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    resource: String,
    params: Vec<String>,
}

impl QueryKey {
    pub fn new<I, S>(resource: &str, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            resource: resource.to_string(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn resource(resource: &str) -> Self {
        Self::new(resource, Vec::<String>::new())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.resource)?;
        for p in &self.params {
            write!(f, "/{}", p)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Entry {
    value: Option<CachedValue>,
    updated_at: Option<Instant>,
    invalidated: bool,
    generation: u64,
    in_flight: Option<SharedFetch>,
    touched_at: Option<Instant>,
}

impl Entry {
    fn fresh_value(&self, stale_time: Duration) -> Option<CachedValue> {
        match (&self.value, self.updated_at) {
            (Some(v), Some(at)) if !self.invalidated && at.elapsed() < stale_time => Some(v.clone()),
            _ => None,
        }
    }

    fn servable_value(&self) -> Option<CachedValue> {
        if self.invalidated {
            None
        } else {
            self.value.clone()
        }
    }
}

enum Plan {
    Cached(CachedValue),
    Await(SharedFetch),
    Revalidate(CachedValue, SharedFetch),
}

type Entries = Arc<Mutex<HashMap<QueryKey, Entry>>>;

#[derive(Clone)]
pub struct QueryClient {
    entries: Entries,
    gc_time: Duration,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::with_gc_time(DEFAULT_GC_TIME)
    }
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gc_time(gc_time: Duration) -> Self {
        Self {
            entries: Entries::default(),
            gc_time,
        }
    }

    /// Reads `key`, calling `fetcher` only when no fresh value exists and no
    /// request for the key is already running.
    pub async fn fetch<T, F, Fut>(&self, key: &QueryKey, stale_time: Duration, fetcher: F) -> ApiResult<T>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let plan = {
            let mut entries = lock(&self.entries);
            collect_garbage(&mut entries, key, self.gc_time);
            let entry = entries.entry(key.clone()).or_default();
            entry.touched_at = Some(Instant::now());

            if let Some(value) = entry.fresh_value(stale_time) {
                Plan::Cached(value)
            } else if let Some(running) = entry.in_flight.clone() {
                match entry.servable_value() {
                    Some(value) => Plan::Cached(value),
                    None => Plan::Await(running),
                }
            } else {
                let running = start(self.entries.clone(), key.clone(), entry.generation, fetcher());
                entry.in_flight = Some(running.clone());
                match entry.servable_value() {
                    Some(value) => Plan::Revalidate(value, running),
                    None => Plan::Await(running),
                }
            }
        };

        match plan {
            Plan::Cached(value) => downcast(key, value),
            Plan::Await(running) => downcast(key, running.await?),
            Plan::Revalidate(value, running) => {
                debug!(%key, "serving stale value while revalidating");
                let key_for_log = key.clone();
                tokio::spawn(async move {
                    if let Err(e) = running.await {
                        warn!(key = %key_for_log, "background refresh failed: {e}");
                    }
                });
                downcast(key, value)
            }
        }
    }

    /// Current cached value, fresh or not, without fetching.
    pub fn get_cached<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let entries = lock(&self.entries);
        entries
            .get(key)
            .and_then(|e| e.value.as_ref())
            .and_then(|v| v.downcast_ref::<T>().cloned())
    }

    pub fn set<T>(&self, key: &QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut entries = lock(&self.entries);
        let entry = entries.entry(key.clone()).or_default();
        entry.generation += 1;
        entry.in_flight = None;
        entry.value = Some(Arc::new(value));
        entry.updated_at = Some(Instant::now());
        entry.touched_at = entry.updated_at;
        entry.invalidated = false;
    }

    /// The next read of `key` refetches. A response already in flight is dropped.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut entries = lock(&self.entries);
        if let Some(entry) = entries.get_mut(key) {
            mark_invalidated(entry);
            debug!(%key, "query invalidated");
        }
    }

    pub fn invalidate_resource(&self, resource: &str) {
        let mut entries = lock(&self.entries);
        for (key, entry) in entries.iter_mut().filter(|(k, _)| k.resource == resource) {
            mark_invalidated(entry);
            debug!(%key, "query invalidated");
        }
    }

    pub fn remove_resource(&self, resource: &str) {
        lock(&self.entries).retain(|k, _| k.resource != resource);
    }

    #[cfg(test)]
    pub fn is_invalidated(&self, key: &QueryKey) -> bool {
        lock(&self.entries).get(key).map(|e| e.invalidated).unwrap_or(false)
    }
}

// entries with a request still running are kept so the response can settle
fn collect_garbage(entries: &mut HashMap<QueryKey, Entry>, current: &QueryKey, gc_time: Duration) {
    let before = entries.len();
    entries.retain(|key, entry| {
        key == current
            || entry.in_flight.is_some()
            || entry.touched_at.map_or(false, |at| at.elapsed() < gc_time)
    });
    let dropped = before - entries.len();
    if dropped > 0 {
        debug!(dropped, "dropped unused queries");
    }
}

fn mark_invalidated(entry: &mut Entry) {
    entry.invalidated = true;
    entry.generation += 1;
    entry.in_flight = None;
}

fn start<T, Fut>(entries: Entries, key: QueryKey, generation: u64, request: Fut) -> SharedFetch
where
    T: Send + Sync + 'static,
    Fut: Future<Output = ApiResult<T>> + Send + 'static,
{
    async move {
        let result = request.await.map(|v| Arc::new(v) as CachedValue);
        settle(&entries, &key, generation, &result);
        result
    }
    .boxed()
    .shared()
}

fn settle(entries: &Entries, key: &QueryKey, generation: u64, result: &Result<CachedValue, ApiError>) {
    let mut entries = lock(entries);
    let Some(entry) = entries.get_mut(key) else {
        return;
    };
    if entry.generation != generation {
        debug!(%key, "discarding response for invalidated query");
        return;
    }
    entry.in_flight = None;
    if let Ok(value) = result {
        entry.value = Some(value.clone());
        entry.updated_at = Some(Instant::now());
        entry.invalidated = false;
    }
}

fn downcast<T: Clone + 'static>(key: &QueryKey, value: CachedValue) -> ApiResult<T> {
    value
        .downcast_ref::<T>()
        .cloned()
        .ok_or_else(|| ApiError::Decode(format!("cached value for {key} has an unexpected type")))
}

fn lock(entries: &Entries) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}
