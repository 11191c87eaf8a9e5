//! Core types for the query cache.

use chrono::{DateTime, Utc};
use std::fmt;

/// Ordered tuple identifying a cached query result, e.g. `["allFeatures", "<uuid>"]`.
///
/// Invalidation matches by prefix, so `["allFeatures", p]` also covers
/// filtered variants such as `["allFeatures", p, "status=done"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
  pub fn new<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(segments.into_iter().map(Into::into).collect())
  }

  /// Key for a list of `name` under a parent identifier.
  pub fn list(name: &str, parent: &str) -> Self {
    Self::new([name, parent])
  }

  /// Append filter parameters as `k=v` segments.
  pub fn with_filters(mut self, filters: &[(String, String)]) -> Self {
    self
      .0
      .extend(filters.iter().map(|(k, v)| format!("{}={}", k, v)));
    self
  }

  pub fn starts_with(&self, prefix: &QueryKey) -> bool {
    self.0.starts_with(&prefix.0)
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "[{}]", self.0.join(", "))
  }
}

/// Result from a cache operation, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  pub data: T,
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  pub fn from_cache(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Cache,
      cached_at: Some(cached_at),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  Network,
  /// Served from a cache entry younger than the stale time
  Cache,
}
