//! WFSLayer - resilient layer-job pipeline for OGC web services.
//!
//! Third-party WFS/WMS backends are slow, intermittently unavailable, or
//! plain misconfigured. This crate provides the machinery to keep serving
//! layer data anyway:
//!
//! - [`config`] - the typed layer configuration, its strict wire codec, and
//!   a cache-backed store with lazy CRS resolution.
//! - [`breaker`] - per-layer-job circuit breakers so a failing backend is
//!   short-circuited instead of exhausting the worker pool.
//! - [`job`] - the job lifecycle contract, pre-flight validation, and the
//!   [`job::ResilientJobRunner`] that ties validation, breaker and fallback
//!   together.
//! - [`worker`] - a bounded blocking worker pool executing jobs through the
//!   runner.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wfslayer::breaker::CircuitBreakerRegistry;
//! use wfslayer::cache::MemoryConfigCache;
//! use wfslayer::config::LayerConfigStore;
//! use wfslayer::crs::EpsgCrsResolver;
//! use wfslayer::job::{LayerJobValidator, ResilientJobRunner};
//!
//! let store = Arc::new(LayerConfigStore::new(
//!     Arc::new(MemoryConfigCache::new()),
//!     Arc::new(EpsgCrsResolver),
//! ));
//! let runner = ResilientJobRunner::new(
//!     Arc::new(LayerJobValidator::new(Arc::clone(&store))),
//!     Arc::new(CircuitBreakerRegistry::with_defaults()),
//! );
//! let payload = runner.execute(&my_job)?;
//! ```

pub mod breaker;
pub mod cache;
pub mod config;
pub mod crs;
pub mod job;
pub mod worker;

/// Version of the WFSLayer library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
