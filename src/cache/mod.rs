//! Short-lived cache of query results.
//!
//! This module provides a backend-agnostic caching mechanism that:
//! - Stores serialized list results under tuple-shaped query keys
//! - Serves entries younger than a configurable stale time
//! - Invalidates by key prefix after mutations

mod layer;
mod storage;
mod traits;

pub use layer::QueryCache;
pub use storage::{CacheStorage, CachedEntry, MemoryStorage, NoopStorage};
pub use traits::{CacheResult, CacheSource, QueryKey};
