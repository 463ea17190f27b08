use std::future::Future;
use std::fmt::Display;

use super::client::{into_loader, Loader, QueryClient, QueryOptions, QuerySubscription};
use super::key::QueryKey;
use super::state::QueryState;

/// A view's handle on one query key.
///
/// Holding a `Query` keeps the key subscribed in the client so its entry is
/// not garbage collected. Reading `state()` returns the cached snapshot and
/// lets the client refresh it in the background when stale.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  loader: Loader<T>,
  options: QueryOptions,
  _subscription: QuerySubscription,
}

impl<T: Send + Sync + 'static> Query<T> {
  /// Create a query for `key` with the client's default options.
  ///
  /// The fetcher is called for every attempt, so it should clone whatever it
  /// captures into the returned future:
  ///
  /// ```ignore
  /// let catalog = catalog.clone();
  /// let query = Query::new(&client, QueryKey::albums(), move || {
  ///     let catalog = catalog.clone();
  ///     async move { catalog.albums().await }
  /// });
  /// ```
  pub fn new<E, F, Fut>(client: &QueryClient, key: QueryKey, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    E: Display,
  {
    Self {
      _subscription: client.subscribe(&key),
      client: client.clone(),
      key,
      loader: into_loader(fetcher),
      options: client.default_options(),
    }
  }

  /// Current state, fetching in the background if missing or stale
  pub fn state(&self) -> QueryState<T> {
    self.client.query(&self.key, &self.loader, &self.options)
  }

  /// Force a fresh fetch
  pub fn refetch(&self) -> QueryState<T> {
    self.client.refetch(&self.key, &self.loader, &self.options)
  }
}

impl<T> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key)
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  #[tokio::test(start_paused = true)]
  async fn test_views_on_the_same_key_share_the_cache() {
    let client = QueryClient::new(QueryOptions::default());
    let calls = Arc::new(AtomicUsize::new(0));

    let make = || {
      let calls = calls.clone();
      Query::new(&client, QueryKey::album(5), move || {
        let calls = calls.clone();
        async move { Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst)) }
      })
    };
    let first = make();
    let second = make();

    first.state();
    second.state();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(first.state().data(), Some(&0));
    assert_eq!(second.state().data(), Some(&0));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_dropping_the_query_releases_the_entry() {
    let options = QueryOptions {
      gc_time: Duration::from_secs(1),
      ..QueryOptions::default()
    };
    let client = QueryClient::new(options);
    let query = Query::new(&client, QueryKey::albums(), || async { Ok::<_, String>(1u8) });
    query.state();
    tokio::time::sleep(Duration::from_millis(10)).await;

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(client.collect_garbage(), 0);

    drop(query);
    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(client.collect_garbage(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_replaces_data() {
    let client = QueryClient::new(QueryOptions::default());
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let query = Query::new(&client, QueryKey::albums(), move || {
      let calls = counter.clone();
      async move { Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst)) }
    });

    query.state();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let refreshing = query.refetch();
    assert!(refreshing.is_loading());
    assert_eq!(refreshing.data(), Some(&0));

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(query.state().data(), Some(&1));
  }
}
