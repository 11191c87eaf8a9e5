//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::traits::QueryKey;

/// A cached query result.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  /// Serialized result as returned by the backend
  pub value: Value,
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends.
pub trait CacheStorage: Send + Sync {
  fn get(&self, key: &QueryKey) -> Option<CachedEntry>;

  fn store(&self, key: QueryKey, value: Value);

  /// Remove every entry whose key starts with `prefix`. Returns how many were removed.
  fn invalidate(&self, prefix: &QueryKey) -> usize;

  fn clear(&self);
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &QueryKey) -> Option<CachedEntry> {
    None // Always miss
  }

  fn store(&self, _key: QueryKey, _value: Value) {}

  fn invalidate(&self, _prefix: &QueryKey) -> usize {
    0
  }

  fn clear(&self) {}
}

/// Process-local storage, dropped with the session.
#[derive(Default)]
pub struct MemoryStorage {
  entries: Mutex<HashMap<QueryKey, CachedEntry>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  // Entries are advisory, so a poisoned map is still usable.
  fn entries(&self) -> MutexGuard<'_, HashMap<QueryKey, CachedEntry>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStorage for MemoryStorage {
  fn get(&self, key: &QueryKey) -> Option<CachedEntry> {
    self.entries().get(key).cloned()
  }

  fn store(&self, key: QueryKey, value: Value) {
    self.entries().insert(
      key,
      CachedEntry {
        value,
        cached_at: Utc::now(),
      },
    );
  }

  fn invalidate(&self, prefix: &QueryKey) -> usize {
    let mut entries = self.entries();
    let before = entries.len();
    entries.retain(|key, _| !key.starts_with(prefix));
    before - entries.len()
  }

  fn clear(&self) {
    self.entries().clear();
  }
}
