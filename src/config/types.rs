//! Typed layer configuration model.

use std::sync::OnceLock;
use tracing::warn;

use crate::crs::{Crs, CrsResolver};

/// One SLD style attached to a layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SldStyle {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Raw SLD document body.
    pub sld_body: Option<String>,
}

/// Request/response template pair for layers driven by a feature template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTemplate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub template_type: Option<String>,
    pub request_template: Option<String>,
    pub response_template: Option<String>,
}

/// Resolved, typed configuration for one layer.
///
/// Ordered containers (`feature_type`, the per-locale parameter lists,
/// `tile_buffer`) are kept as vectors of pairs: insertion order from the
/// wire document is significant for downstream rendering and must survive
/// a decode/encode round trip.
///
/// `selected_feature_params` and `feature_params_locales` overlap in shape;
/// the upstream producer treats them as distinct documents and so do we -
/// both are preserved verbatim.
///
/// The CRS handle is not part of the wire format. It is resolved lazily
/// from `srs_name`, at most once per instance; a failed resolution is
/// logged and memoized as "unresolved".
#[derive(Debug, Clone, Default)]
pub struct LayerConfig {
    /// Cache and breaker lookup key. Must be non-empty before the
    /// configuration is saved or a job is dispatched for it.
    pub layer_id: String,
    pub url: Option<String>,
    pub username: Option<String>,
    /// Backend credential. Decoded from the wire but never encoded back.
    pub password: Option<String>,
    pub layer_name: Option<String>,
    /// Qualified GML geometry property, e.g. `"topp:the_geom"`.
    pub gml_geometry_property: Option<String>,
    pub srs_name: Option<String>,
    pub gml_version: Option<String>,
    pub gml2_separator: bool,
    pub wfs_version: Option<String>,
    pub max_features: Option<u32>,
    pub feature_namespace: Option<String>,
    pub feature_namespace_uri: Option<String>,
    pub geometry_namespace_uri: Option<String>,
    pub feature_element: Option<String>,
    pub output_format: Option<String>,
    /// Feature type name to value, wire order preserved.
    pub feature_type: Vec<(String, String)>,
    /// Locale to ordered parameter names.
    pub selected_feature_params: Vec<(String, Vec<String>)>,
    /// Locale to ordered parameter values. Distinct from
    /// `selected_feature_params`; both are kept.
    pub feature_params_locales: Vec<(String, Vec<String>)>,
    pub geometry_type: Option<String>,
    pub get_map_tiles: bool,
    pub get_highlight_image: bool,
    pub get_feature_info: bool,
    pub tile_request: bool,
    /// Style name to tile buffer.
    pub tile_buffer: Vec<(String, f64)>,
    pub wms_layer_id: Option<String>,
    pub job_type: Option<String>,
    pub min_scale: Option<f64>,
    pub max_scale: Option<f64>,
    pub template: Option<FeatureTemplate>,
    pub selection_sld_style: Option<String>,
    pub styles: Vec<SldStyle>,
    /// Memoized CRS resolution result. `Some(None)` means resolution was
    /// attempted and failed; it is not retried.
    crs: OnceLock<Option<Crs>>,
}

impl LayerConfig {
    /// Create a configuration with the given layer id and all other fields
    /// at their defaults.
    pub fn new(layer_id: impl Into<String>) -> Self {
        Self {
            layer_id: layer_id.into(),
            ..Self::default()
        }
    }

    /// Resolve and memoize the CRS handle for this layer.
    ///
    /// The first call resolves `srs_name` through the given resolver.
    /// Failure (or a missing `srs_name`) is logged, memoized and reported
    /// as `None`; later calls return the memoized outcome without hitting
    /// the resolver again.
    pub fn crs(&self, resolver: &dyn CrsResolver) -> Option<&Crs> {
        self.crs
            .get_or_init(|| {
                let srs = self.srs_name.as_deref()?;
                match resolver.resolve(srs) {
                    Ok(crs) => Some(crs),
                    Err(err) => {
                        warn!(
                            layer_id = %self.layer_id,
                            srs_name = %srs,
                            error = %err,
                            "CRS resolution failed"
                        );
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Local part of the GML geometry property, namespace prefix stripped:
    /// `"topp:the_geom"` becomes `"the_geom"`.
    pub fn gml_geometry_property_local_part(&self) -> Option<&str> {
        let geom = self.gml_geometry_property.as_deref()?;
        Some(geom.split_once(':').map_or(geom, |(_, local)| local))
    }

    /// Selected feature parameter names for the given locale.
    pub fn selected_params_for(&self, locale: &str) -> Option<&[String]> {
        self.selected_feature_params
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, params)| params.as_slice())
    }

    /// Tile buffer configured for the given style name.
    pub fn tile_buffer_for(&self, style: &str) -> Option<f64> {
        self.tile_buffer
            .iter()
            .find(|(s, _)| s == style)
            .map(|(_, buffer)| *buffer)
    }
}

// Equality covers the wire fields only; the CRS memo is derived state and
// must not make two otherwise-identical configurations unequal.
impl PartialEq for LayerConfig {
    fn eq(&self, other: &Self) -> bool {
        self.layer_id == other.layer_id
            && self.url == other.url
            && self.username == other.username
            && self.password == other.password
            && self.layer_name == other.layer_name
            && self.gml_geometry_property == other.gml_geometry_property
            && self.srs_name == other.srs_name
            && self.gml_version == other.gml_version
            && self.gml2_separator == other.gml2_separator
            && self.wfs_version == other.wfs_version
            && self.max_features == other.max_features
            && self.feature_namespace == other.feature_namespace
            && self.feature_namespace_uri == other.feature_namespace_uri
            && self.geometry_namespace_uri == other.geometry_namespace_uri
            && self.feature_element == other.feature_element
            && self.output_format == other.output_format
            && self.feature_type == other.feature_type
            && self.selected_feature_params == other.selected_feature_params
            && self.feature_params_locales == other.feature_params_locales
            && self.geometry_type == other.geometry_type
            && self.get_map_tiles == other.get_map_tiles
            && self.get_highlight_image == other.get_highlight_image
            && self.get_feature_info == other.get_feature_info
            && self.tile_request == other.tile_request
            && self.tile_buffer == other.tile_buffer
            && self.wms_layer_id == other.wms_layer_id
            && self.job_type == other.job_type
            && self.min_scale == other.min_scale
            && self.max_scale == other.max_scale
            && self.template == other.template
            && self.selection_sld_style == other.selection_sld_style
            && self.styles == other.styles
    }
}
