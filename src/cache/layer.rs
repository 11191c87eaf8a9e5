//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{Duration, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{CacheStorage, MemoryStorage};
use super::traits::{CacheResult, QueryKey};

/// Short-lived cache of query results, keyed by [`QueryKey`].
///
/// The backend stays the source of truth: entries only spare a round trip
/// while younger than the stale time, and mutations invalidate them.
#[derive(Clone)]
pub struct QueryCache {
  storage: Arc<dyn CacheStorage>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl QueryCache {
  /// Create an in-memory cache.
  pub fn new(stale_time: Duration) -> Self {
    Self::with_storage(MemoryStorage::new(), stale_time)
  }

  pub fn with_storage(storage: impl CacheStorage + 'static, stale_time: Duration) -> Self {
    Self {
      storage: Arc::new(storage),
      stale_time,
    }
  }

  fn is_stale(&self, cached_at: chrono::DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  /// Fetch with cache-first strategy.
  ///
  /// 1. Check cache - if fresh, return immediately
  /// 2. If stale/missing, fetch from network
  /// 3. Store successful results; errors pass through and leave the cache alone
  pub async fn fetch<T, E, F, Fut>(&self, key: &QueryKey, fetcher: F) -> Result<CacheResult<T>, E>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
  {
    if let Some(cached) = self.storage.get(key) {
      if !self.is_stale(cached.cached_at) {
        match serde_json::from_value(cached.value) {
          Ok(data) => {
            debug!(%key, "cache hit");
            return Ok(CacheResult::from_cache(data, cached.cached_at));
          }
          Err(e) => warn!(%key, error = %e, "discarding undecodable cache entry"),
        }
      }
    }

    let data = fetcher().await?;
    // Stored even if the key was invalidated while the fetch was in flight.
    // Lists are not read concurrently with writes to the same entity.
    match serde_json::to_value(&data) {
      Ok(value) => self.storage.store(key.clone(), value),
      Err(e) => warn!(%key, error = %e, "result not cacheable"),
    }
    Ok(CacheResult::from_network(data))
  }

  /// Drop every entry under `prefix`.
  pub fn invalidate(&self, prefix: &QueryKey) -> usize {
    let removed = self.storage.invalidate(prefix);
    debug!(key = %prefix, removed, "cache invalidated");
    removed
  }

  pub fn clear(&self) {
    self.storage.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheSource, NoopStorage};
  use std::sync::atomic::{AtomicU32, Ordering};

  async fn fetch_counting(
    cache: &QueryCache,
    key: &QueryKey,
    calls: &AtomicU32,
  ) -> CacheResult<Vec<u32>> {
    cache
      .fetch(key, || async {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok::<_, String>(vec![n])
      })
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn test_fresh_entry_skips_fetcher() {
    let cache = QueryCache::new(Duration::minutes(1));
    let key = QueryKey::list("allReleases", "p1");
    let calls = AtomicU32::new(0);

    let first = fetch_counting(&cache, &key, &calls).await;
    let second = fetch_counting(&cache, &key, &calls).await;

    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, vec![0]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_invalidate_forces_refetch() {
    let cache = QueryCache::new(Duration::minutes(1));
    let key = QueryKey::list("allReleases", "p1");
    let calls = AtomicU32::new(0);

    fetch_counting(&cache, &key, &calls).await;
    assert_eq!(cache.invalidate(&key), 1);
    let after = fetch_counting(&cache, &key, &calls).await;

    assert_eq!(after.source, CacheSource::Network);
    assert_eq!(after.data, vec![1]);
  }

  #[tokio::test]
  async fn test_zero_stale_time_always_fetches() {
    let cache = QueryCache::new(Duration::seconds(-1));
    let key = QueryKey::list("allReleases", "p1");
    let calls = AtomicU32::new(0);

    fetch_counting(&cache, &key, &calls).await;
    fetch_counting(&cache, &key, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_errors_are_not_cached() {
    let cache = QueryCache::with_storage(MemoryStorage::new(), Duration::minutes(1));
    let key = QueryKey::list("allIssues", "p1");

    let err = cache
      .fetch(&key, || async { Err::<Vec<u32>, _>("boom") })
      .await
      .unwrap_err();
    assert_eq!(err, "boom");

    let calls = AtomicU32::new(0);
    fetch_counting(&cache, &key, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_noop_storage_disables_caching() {
    let cache = QueryCache::with_storage(NoopStorage, Duration::minutes(1));
    let key = QueryKey::list("allIssues", "p1");
    let calls = AtomicU32::new(0);

    fetch_counting(&cache, &key, &calls).await;
    fetch_counting(&cache, &key, &calls).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }
}
