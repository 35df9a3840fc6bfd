//! Cache-backed layer configuration store.
//!
//! Resolves a layer id to a [`LayerConfig`] through the [`ConfigCache`].
//! The store does not fetch from the authoritative source itself: a cache
//! miss is `NotFound`, and population happens through an explicit `save`
//! by whatever refresh path the embedder runs.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::cache::{CacheError, ConfigCache};
use crate::crs::{Crs, CrsResolver};

use super::parser::{decode, ParseError};
use super::types::LayerConfig;
use super::writer::encode;

/// Prefix of every cached layer configuration key.
pub const CACHE_KEY_PREFIX: &str = "WFSLayer_";

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No cached configuration for the layer; the caller must refresh.
    #[error("no cached configuration for layer '{0}'")]
    NotFound(String),
    /// A configuration cannot be saved without its layer id.
    #[error("layer id must be set before saving a configuration")]
    MissingLayerId,
    /// The cached document failed to decode.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The cache backend failed.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Combines the wire codec with a [`ConfigCache`] and a [`CrsResolver`].
pub struct LayerConfigStore {
    cache: Arc<dyn ConfigCache>,
    crs_resolver: Arc<dyn CrsResolver>,
}

impl LayerConfigStore {
    /// Create a store over the given cache and CRS resolver.
    pub fn new(cache: Arc<dyn ConfigCache>, crs_resolver: Arc<dyn CrsResolver>) -> Self {
        Self {
            cache,
            crs_resolver,
        }
    }

    /// Cache key for a layer id.
    pub fn cache_key(layer_id: &str) -> String {
        format!("{CACHE_KEY_PREFIX}{layer_id}")
    }

    /// Load the configuration for a layer.
    ///
    /// `Ok(None)` means the cached document carries the upstream error
    /// sentinel: there is no usable configuration and the caller must
    /// treat the layer as unavailable. A cache miss is
    /// [`StoreError::NotFound`].
    pub fn load(&self, layer_id: &str) -> Result<Option<LayerConfig>, StoreError> {
        let key = Self::cache_key(layer_id);
        let Some(wire) = self.cache.get(&key) else {
            debug!(layer_id, "no cached configuration");
            return Err(StoreError::NotFound(layer_id.to_string()));
        };
        Ok(decode(&wire)?)
    }

    /// Encode and cache the configuration under its layer id.
    pub fn save(&self, config: &LayerConfig) -> Result<(), StoreError> {
        if config.layer_id.is_empty() {
            return Err(StoreError::MissingLayerId);
        }
        let wire = encode(config);
        self.cache.set(&Self::cache_key(&config.layer_id), wire)?;
        debug!(layer_id = %config.layer_id, "layer configuration cached");
        Ok(())
    }

    /// Resolve (and memoize on the config) the layer's CRS.
    ///
    /// Returns `None` when the layer has no SRS name or resolution failed;
    /// failure is logged by the config and never raised.
    pub fn resolve_crs<'a>(&self, config: &'a LayerConfig) -> Option<&'a Crs> {
        config.crs(self.crs_resolver.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryConfigCache;
    use crate::crs::EpsgCrsResolver;

    fn store() -> LayerConfigStore {
        LayerConfigStore::new(
            Arc::new(MemoryConfigCache::new()),
            Arc::new(EpsgCrsResolver),
        )
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let store = store();
        let mut config = LayerConfig::new("42");
        config.url = Some("https://example.org/wfs".to_string());
        config.srs_name = Some("EPSG:3067".to_string());
        config.feature_type = vec![("name".to_string(), "String".to_string())];

        store.save(&config).unwrap();
        let loaded = store.load("42").unwrap().expect("configuration expected");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_unknown_layer_is_not_found() {
        let err = store().load("missing").unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "missing"));
    }

    #[test]
    fn test_save_without_layer_id_fails() {
        let err = store().save(&LayerConfig::default()).unwrap_err();
        assert!(matches!(err, StoreError::MissingLayerId));
    }

    #[test]
    fn test_load_sentinel_document_is_absent() {
        let cache = Arc::new(MemoryConfigCache::new());
        cache
            .set(
                &LayerConfigStore::cache_key("42"),
                br#"{"error":"backend down"}"#.to_vec(),
            )
            .unwrap();
        let store = LayerConfigStore::new(cache, Arc::new(EpsgCrsResolver));

        assert!(store.load("42").unwrap().is_none());
    }

    #[test]
    fn test_load_corrupt_document_is_parse_error() {
        let cache = Arc::new(MemoryConfigCache::new());
        cache
            .set(&LayerConfigStore::cache_key("42"), b"{broken".to_vec())
            .unwrap();
        let store = LayerConfigStore::new(cache, Arc::new(EpsgCrsResolver));

        assert!(matches!(store.load("42"), Err(StoreError::Parse(_))));
    }

    #[test]
    fn test_resolve_crs_through_store() {
        let store = store();
        let mut config = LayerConfig::new("42");
        config.srs_name = Some("EPSG:3067".to_string());

        let crs = store.resolve_crs(&config).expect("CRS expected");
        assert_eq!(crs.srs_name(), "EPSG:3067");
    }

    #[test]
    fn test_cache_key_convention() {
        assert_eq!(LayerConfigStore::cache_key("42"), "WFSLayer_42");
    }
}
