//! Layer configuration: typed model, wire codec and cache-backed store.
//!
//! The wire format is a flat JSON object with a fixed field vocabulary
//! (see [`keys`]) plus a handful of nested containers. The codec is strict:
//! any unrecognized field name, at top level or inside a style entry, fails
//! the decode. A reserved top-level `error` field is the upstream
//! producer's failure sentinel and decodes to "no configuration" instead.
//!
//! [`LayerConfigStore`] resolves layer ids to configurations through a
//! [`crate::cache::ConfigCache`] and lazily resolves each layer's CRS.

pub mod keys;

mod parser;
mod store;
mod types;
mod writer;

pub use parser::{decode, ParseError};
pub use store::{LayerConfigStore, StoreError, CACHE_KEY_PREFIX};
pub use types::{FeatureTemplate, LayerConfig, SldStyle};
pub use writer::encode;
