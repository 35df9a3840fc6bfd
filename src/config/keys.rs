//! Wire-format field names for the layer configuration document.
//!
//! This is the single place where wire names are defined. The decoder
//! rejects any field name outside this vocabulary, so adding a field to the
//! format means adding it here, in the parser table and in the writer.

/// Sentinel set by the upstream producer when it failed to build the
/// configuration. Its presence means "no configuration", not a parse error.
pub const ERROR: &str = "error";

pub const LAYER_ID: &str = "layerId";
/// Accepted and discarded; present only so operators can recognize the
/// layer when inspecting the raw cache entry.
pub const LAYER_FRIENDLY_NAME: &str = "layerFriendlyName";
pub const URL: &str = "url";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const LAYER_NAME: &str = "layerName";
pub const GML_GEOMETRY_PROPERTY: &str = "gmlGeometryProperty";
pub const SRS_NAME: &str = "srsName";
pub const GML_VERSION: &str = "gmlVersion";
pub const GML2_SEPARATOR: &str = "gml2Separator";
pub const WFS_VERSION: &str = "wfsVersion";
pub const MAX_FEATURES: &str = "maxFeatures";
pub const FEATURE_NAMESPACE: &str = "featureNamespace";
pub const FEATURE_NAMESPACE_URI: &str = "featureNamespaceURI";
pub const GEOMETRY_NAMESPACE_URI: &str = "geometryNamespaceURI";
pub const FEATURE_ELEMENT: &str = "featureElement";
pub const OUTPUT_FORMAT: &str = "outputFormat";
pub const FEATURE_TYPE: &str = "featureType";
pub const SELECTED_FEATURE_PARAMS: &str = "selectedFeatureParams";
pub const FEATURE_PARAMS_LOCALES: &str = "featureParamsLocales";
pub const GEOMETRY_TYPE: &str = "geometryType";
pub const GET_MAP_TILES: &str = "getMapTiles";
pub const GET_HIGHLIGHT_IMAGE: &str = "getHighlightImage";
pub const GET_FEATURE_INFO: &str = "getFeatureInfo";
pub const TILE_REQUEST: &str = "tileRequest";
pub const TILE_BUFFER: &str = "tileBuffer";
pub const WMS_LAYER_ID: &str = "wmsLayerId";
pub const JOB_TYPE: &str = "jobType";
pub const MIN_SCALE: &str = "minScale";
pub const MAX_SCALE: &str = "maxScale";
pub const TEMPLATE_NAME: &str = "templateName";
pub const TEMPLATE_DESCRIPTION: &str = "templateDescription";
pub const TEMPLATE_TYPE: &str = "templateType";
pub const REQUEST_TEMPLATE: &str = "requestTemplate";
pub const RESPONSE_TEMPLATE: &str = "responseTemplate";
pub const SELECTION_SLD_STYLE: &str = "selectionSLDStyle";
pub const STYLES: &str = "styles";

// Vocabulary of a single entry inside `styles`.
pub const STYLE_ID: &str = "id";
pub const STYLE_NAME: &str = "name";
pub const STYLE_SLD_BODY: &str = "sldStyleBody";
