//! Process-scoped query cache.
//!
//! `QueryClient` owns one entry per `QueryKey`. Each entry tracks the last
//! successful data, the last error, and at most one in-flight fetch. Fetches
//! run as spawned tasks and write their result back into the entry when they
//! settle; callers read snapshots and never wait unless they use `fetch`.

use futures::future::{AbortHandle, Aborted, BoxFuture, FutureExt, Shared};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use super::key::QueryKey;
use super::retry::RetryPolicy;
use super::state::{QueryState, QueryStatus};

type AnyData = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyData, String>;
/// Resolves to `Err(Aborted)` when a newer fetch for the same key replaced it
type SharedFetch = Shared<BoxFuture<'static, Result<FetchResult, Aborted>>>;

struct InFlight {
  fetch: SharedFetch,
  abort: AbortHandle,
}

/// A factory for futures that load the data of one query key.
///
/// It is called once per attempt, so retries get a fresh future.
pub type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, String>> + Send + Sync>;

/// Wrap an async closure as a `Loader`, turning its error into a display message.
pub fn into_loader<T, E, F, Fut>(fetcher: F) -> Loader<T>
where
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T, E>> + Send + 'static,
  E: Display,
{
  Arc::new(move || {
    let fut = fetcher();
    async move { fut.await.map_err(|e| e.to_string()) }.boxed()
  })
}

/// Cache behaviour for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  /// How long fetched data counts as fresh
  pub stale_time: Duration,
  /// How long an unobserved entry is kept before it may be evicted
  pub gc_time: Duration,
  pub retry: RetryPolicy,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::from_millis(300_000),
      gc_time: Duration::from_millis(600_000),
      retry: RetryPolicy::default(),
    }
  }
}

struct Entry {
  status: QueryStatus,
  data: Option<AnyData>,
  error: Option<String>,
  /// When `data` was last replaced
  data_updated_at: Option<Instant>,
  /// When the last fetch settled, successfully or not
  settled_at: Option<Instant>,
  /// Set by `invalidate()` to the generation current at that time. Only a
  /// fetch started afterwards clears it.
  invalidated: Option<u64>,
  /// Generation of the most recently started fetch
  generation: u64,
  in_flight: Option<InFlight>,
  observers: usize,
  /// Set while no observer is subscribed
  inactive_since: Option<Instant>,
  gc_time: Duration,
}

impl Entry {
  fn new(now: Instant, gc_time: Duration) -> Self {
    Self {
      status: QueryStatus::Idle,
      data: None,
      error: None,
      data_updated_at: None,
      settled_at: None,
      invalidated: None,
      generation: 0,
      in_flight: None,
      observers: 0,
      inactive_since: Some(now),
      gc_time,
    }
  }

  /// Whether a `query()` call should start a background fetch.
  ///
  /// Failures count as settled too, so a failing key is not refetched on
  /// every read; it waits for the stale window or an explicit refetch.
  fn needs_fetch(&self, now: Instant, stale_time: Duration) -> bool {
    if self.in_flight.is_some() {
      return false;
    }
    if self.invalidated.is_some() {
      return true;
    }
    match self.settled_at {
      Some(at) => now.duration_since(at) > stale_time,
      None => true,
    }
  }

  fn is_fresh(&self, now: Instant, stale_time: Duration) -> bool {
    self.invalidated.is_none()
      && self
        .data_updated_at
        .is_some_and(|at| now.duration_since(at) <= stale_time)
  }

  fn snapshot<T: Send + Sync + 'static>(&self, key: &QueryKey) -> QueryState<T> {
    let data = self.data.clone().and_then(|data| match data.downcast::<T>() {
      Ok(data) => Some(data),
      Err(_) => {
        tracing::warn!(%key, "cached data has a different type than requested");
        None
      }
    });

    QueryState {
      status: self.status,
      data,
      error: self.error.clone(),
    }
  }
}

#[derive(Default)]
struct Cache {
  entries: HashMap<QueryKey, Entry>,
  next_generation: u64,
}

/// Shared query cache. Clones share the same entries.
#[derive(Clone)]
pub struct QueryClient {
  cache: Arc<Mutex<Cache>>,
  defaults: QueryOptions,
}

impl QueryClient {
  pub fn new(defaults: QueryOptions) -> Self {
    Self {
      cache: Arc::new(Mutex::new(Cache::default())),
      defaults,
    }
  }

  /// Options used by queries that don't override them
  pub fn default_options(&self) -> QueryOptions {
    self.defaults
  }

  fn lock(&self) -> MutexGuard<'_, Cache> {
    // Entries are only mutated in small synchronous sections, a panic there
    // leaves them consistent enough to keep serving.
    self.cache.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Return the cached state for `key`, starting a background fetch if the
  /// entry is missing or stale. Previous data stays attached while it runs.
  pub fn query<T>(&self, key: &QueryKey, loader: &Loader<T>, options: &QueryOptions) -> QueryState<T>
  where
    T: Send + Sync + 'static,
  {
    let mut cache = self.lock();
    let now = Instant::now();
    let entry = cache
      .entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(now, options.gc_time));
    entry.gc_time = options.gc_time;

    if entry.needs_fetch(now, options.stale_time) {
      self.start_fetch(&mut cache, key, loader, options.retry);
    }

    cache.entries[key].snapshot(key)
  }

  /// Start a new fetch for `key` even if the data is fresh. A fetch already in
  /// flight is superseded and its result will be ignored.
  pub fn refetch<T>(&self, key: &QueryKey, loader: &Loader<T>, options: &QueryOptions) -> QueryState<T>
  where
    T: Send + Sync + 'static,
  {
    let mut cache = self.lock();
    let now = Instant::now();
    cache
      .entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(now, options.gc_time))
      .gc_time = options.gc_time;

    self.start_fetch(&mut cache, key, loader, options.retry);

    cache.entries[key].snapshot(key)
  }

  /// Resolve `key` to data: fresh cached data is returned directly, an
  /// in-flight fetch is joined, otherwise a new fetch is started and awaited.
  /// If the joined fetch is superseded by a `refetch`, the newer one is joined.
  pub async fn fetch<T>(
    &self,
    key: &QueryKey,
    loader: &Loader<T>,
    options: &QueryOptions,
  ) -> Result<Arc<T>, String>
  where
    T: Send + Sync + 'static,
  {
    loop {
      let pending = {
        let mut cache = self.lock();
        let now = Instant::now();
        let entry = cache
          .entries
          .entry(key.clone())
          .or_insert_with(|| Entry::new(now, options.gc_time));
        if entry.observers == 0 {
          entry.inactive_since = Some(now);
        }

        let in_flight = entry.in_flight.as_ref().map(|f| f.fetch.clone());
        let fresh = entry
          .data
          .clone()
          .filter(|_| entry.is_fresh(now, options.stale_time));

        match (in_flight, fresh) {
          (Some(in_flight), _) => in_flight,
          (None, Some(data)) => return downcast(key, data),
          (None, None) => self.start_fetch(&mut cache, key, loader, options.retry),
        }
      };

      match pending.await {
        Ok(result) => return downcast(key, result?),
        Err(Aborted) => tracing::debug!(%key, "joined fetch was superseded"),
      }
    }
  }

  /// Cached data for `key` without triggering a fetch
  #[cfg(test)]
  pub fn get_query_data<T>(&self, key: &QueryKey) -> Option<Arc<T>>
  where
    T: Send + Sync + 'static,
  {
    self.lock().entries.get(key)?.snapshot(key).data
  }

  /// Mark `key` stale so the next `query()` refetches it
  pub fn invalidate(&self, key: &QueryKey) {
    if let Some(entry) = self.lock().entries.get_mut(key) {
      entry.invalidated = Some(entry.generation);
    }
  }

  /// Register an observer of `key`. The entry is kept alive until the returned
  /// guard is dropped and `gc_time` has passed.
  pub fn subscribe(&self, key: &QueryKey) -> QuerySubscription {
    let mut cache = self.lock();
    let now = Instant::now();
    let entry = cache
      .entries
      .entry(key.clone())
      .or_insert_with(|| Entry::new(now, self.defaults.gc_time));
    entry.observers += 1;
    entry.inactive_since = None;

    QuerySubscription {
      client: self.clone(),
      key: key.clone(),
    }
  }

  fn unsubscribe(&self, key: &QueryKey) {
    if let Some(entry) = self.lock().entries.get_mut(key) {
      entry.observers = entry.observers.saturating_sub(1);
      if entry.observers == 0 {
        entry.inactive_since = Some(Instant::now());
      }
    }
  }

  /// Evict entries nobody has observed for longer than their `gc_time`.
  /// Entries with a fetch in flight are kept. Returns the number evicted.
  pub fn collect_garbage(&self) -> usize {
    let mut cache = self.lock();
    let now = Instant::now();
    let before = cache.entries.len();

    cache.entries.retain(|key, entry| {
      let expired = entry.observers == 0
        && entry.in_flight.is_none()
        && entry
          .inactive_since
          .is_some_and(|since| now.duration_since(since) > entry.gc_time);
      if expired {
        tracing::debug!(%key, "evicting unused query");
      }
      !expired
    });

    before - cache.entries.len()
  }

  /// Number of cached keys
  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.lock().entries.len()
  }

  fn start_fetch<T>(
    &self,
    cache: &mut Cache,
    key: &QueryKey,
    loader: &Loader<T>,
    retry: RetryPolicy,
  ) -> SharedFetch
  where
    T: Send + Sync + 'static,
  {
    cache.next_generation += 1;
    let generation = cache.next_generation;

    let client = self.clone();
    let loader = Arc::clone(loader);
    let task_key = key.clone();
    let (fetch, abort) = futures::future::abortable(async move {
      let result = retry
        .run(|| (*loader)())
        .await
        .map(|data| Arc::new(data) as AnyData);
      client.settle(&task_key, generation, &result);
      result
    });
    let fetch = fetch.boxed().shared();

    if let Some(entry) = cache.entries.get_mut(key) {
      // At most one request per key: the superseded one stops at its next poll
      if let Some(previous) = entry.in_flight.take() {
        tracing::debug!(%key, generation, "superseding in-flight fetch");
        previous.abort.abort();
      }
      entry.generation = generation;
      entry.in_flight = Some(InFlight {
        fetch: fetch.clone(),
        abort,
      });
      entry.status = QueryStatus::Loading;
    }

    tracing::debug!(%key, generation, "fetch started");
    tokio::spawn(fetch.clone().map(|_| ()));

    fetch
  }

  fn settle(&self, key: &QueryKey, generation: u64, result: &FetchResult) {
    let mut cache = self.lock();
    let Some(entry) = cache.entries.get_mut(key) else {
      return;
    };
    if entry.generation != generation {
      tracing::debug!(%key, generation, "ignoring superseded result");
      return;
    }

    let now = Instant::now();
    entry.in_flight = None;
    entry.settled_at = Some(now);
    if entry.invalidated.is_some_and(|at| generation > at) {
      entry.invalidated = None;
    }
    if entry.observers == 0 {
      entry.inactive_since = Some(now);
    }

    match result {
      Ok(data) => {
        tracing::debug!(%key, generation, "fetch succeeded");
        entry.status = QueryStatus::Success;
        entry.data = Some(Arc::clone(data));
        entry.data_updated_at = Some(now);
        entry.error = None;
      }
      Err(error) => {
        tracing::warn!(%key, generation, %error, "fetch failed");
        entry.status = QueryStatus::Error;
        entry.error = Some(error.clone());
      }
    }
  }
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, data: AnyData) -> Result<Arc<T>, String> {
  data
    .downcast::<T>()
    .map_err(|_| format!("cached data for {} has an unexpected type", key))
}

/// Keeps a query entry alive while held
pub struct QuerySubscription {
  client: QueryClient,
  key: QueryKey,
}

impl Drop for QuerySubscription {
  fn drop(&mut self) {
    self.client.unsubscribe(&self.key);
  }
}
