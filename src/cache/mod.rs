//! Key-value cache abstraction for serialized layer configurations.
//!
//! The pipeline never talks to the authoritative configuration source
//! directly; it only reads and writes opaque byte documents through the
//! [`ConfigCache`] trait. Production deployments back this with an external
//! store, tests use [`MemoryConfigCache`].
//!
//! Reads are unsynchronized with respect to writes: two callers that miss
//! simultaneously may both decode and populate the same key. Last writer
//! wins. Layer configuration is immutable by convention once published, so
//! redundant population is harmless and no single-flight guarantee is made.

use dashmap::DashMap;
use thiserror::Error;

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache backend could not be reached or rejected the write.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
}

/// Cache abstraction for serialized layer configurations.
///
/// Implementations must be safe to share across worker threads.
pub trait ConfigCache: Send + Sync {
    /// Get the cached document for the given key.
    ///
    /// Returns `Some(bytes)` on a hit, `None` on a miss.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store a document under the given key, replacing any previous value.
    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError>;
}

/// In-memory cache backed by a concurrent map.
///
/// Suitable for single-process deployments and tests. Racing writers for
/// the same key are resolved last-writer-wins.
#[derive(Debug, Default)]
pub struct MemoryConfigCache {
    entries: DashMap<String, Vec<u8>>,
}

impl MemoryConfigCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no documents.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigCache for MemoryConfigCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn set(&self, key: &str, value: Vec<u8>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// Cache that never stores anything.
///
/// Every `get` is a miss and every `set` is accepted and dropped. Useful
/// for exercising the cache-miss paths and for embedders that disable
/// configuration caching outright.
#[derive(Debug, Clone, Default)]
pub struct NoOpConfigCache;

impl NoOpConfigCache {
    /// Create a new no-op cache.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigCache for NoOpConfigCache {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<u8>) -> Result<(), CacheError> {
        Ok(())
    }
}
