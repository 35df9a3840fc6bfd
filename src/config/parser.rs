//! Schema-driven decoder for the layer-configuration wire format.
//!
//! The document is parsed into a generic JSON tree first, then walked
//! against the field vocabulary in [`super::keys`]. Unknown field names are
//! hard errors at every object level: silently ignoring them has caused
//! undetected schema drift before, so correctness wins over leniency here.
//!
//! Field order in the document is arbitrary. A failure aborts the whole
//! decode; callers never observe a partial configuration.

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::keys;
use super::types::{FeatureTemplate, LayerConfig, SldStyle};

/// Wire-format decode errors.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not valid JSON at all.
    #[error("configuration is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The top-level value is not an object.
    #[error("configuration is not an object")]
    NotAnObject,
    /// A field name outside the fixed vocabulary was encountered.
    #[error("unrecognized field '{field}'")]
    UnrecognizedField { field: String },
    /// A recognized field carried a value of the wrong shape.
    #[error("invalid value for field '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },
}

impl ParseError {
    fn invalid(field: &str, expected: &'static str) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            expected,
        }
    }
}

/// Decode a wire document into a [`LayerConfig`].
///
/// Returns `Ok(None)` when the document carries the upstream `error`
/// sentinel: the producer failed, there is no configuration, and that is
/// not a decode error. Any unrecognized field or malformed value fails the
/// whole decode.
pub fn decode(wire: &[u8]) -> Result<Option<LayerConfig>, ParseError> {
    let value: Value = serde_json::from_slice(wire)?;
    let Value::Object(fields) = value else {
        return Err(ParseError::NotAnObject);
    };

    // Sentinel check before the field walk so its position in the document
    // does not matter.
    if fields.contains_key(keys::ERROR) {
        warn!("layer configuration carries an upstream error sentinel");
        return Ok(None);
    }

    let mut config = LayerConfig::default();
    for (name, value) in &fields {
        apply_field(&mut config, name, value)?;
    }
    Ok(Some(config))
}

/// Field table: wire name to typed setter.
fn apply_field(config: &mut LayerConfig, name: &str, value: &Value) -> Result<(), ParseError> {
    match name {
        keys::LAYER_ID => config.layer_id = string_value(name, value)?,
        keys::LAYER_FRIENDLY_NAME => {} // operator-debugging aid, discarded
        keys::URL => config.url = Some(string_value(name, value)?),
        keys::USERNAME => config.username = Some(string_value(name, value)?),
        keys::PASSWORD => config.password = Some(string_value(name, value)?),
        keys::LAYER_NAME => config.layer_name = Some(string_value(name, value)?),
        keys::GML_GEOMETRY_PROPERTY => {
            config.gml_geometry_property = Some(string_value(name, value)?)
        }
        keys::SRS_NAME => config.srs_name = Some(string_value(name, value)?),
        keys::GML_VERSION => config.gml_version = Some(string_value(name, value)?),
        keys::GML2_SEPARATOR => config.gml2_separator = bool_value(name, value)?,
        keys::WFS_VERSION => config.wfs_version = Some(string_value(name, value)?),
        keys::MAX_FEATURES => config.max_features = Some(count_value(name, value)?),
        keys::FEATURE_NAMESPACE => config.feature_namespace = Some(string_value(name, value)?),
        keys::FEATURE_NAMESPACE_URI => {
            config.feature_namespace_uri = Some(string_value(name, value)?)
        }
        keys::GEOMETRY_NAMESPACE_URI => {
            config.geometry_namespace_uri = Some(string_value(name, value)?)
        }
        keys::FEATURE_ELEMENT => config.feature_element = Some(string_value(name, value)?),
        keys::OUTPUT_FORMAT => config.output_format = Some(string_value(name, value)?),
        keys::FEATURE_TYPE => config.feature_type = string_map(name, value)?,
        keys::SELECTED_FEATURE_PARAMS => {
            config.selected_feature_params = string_list_map(name, value)?
        }
        keys::FEATURE_PARAMS_LOCALES => {
            config.feature_params_locales = string_list_map(name, value)?
        }
        keys::GEOMETRY_TYPE => config.geometry_type = Some(string_value(name, value)?),
        keys::GET_MAP_TILES => config.get_map_tiles = bool_value(name, value)?,
        keys::GET_HIGHLIGHT_IMAGE => config.get_highlight_image = bool_value(name, value)?,
        keys::GET_FEATURE_INFO => config.get_feature_info = bool_value(name, value)?,
        keys::TILE_REQUEST => config.tile_request = bool_value(name, value)?,
        keys::TILE_BUFFER => config.tile_buffer = float_map(name, value)?,
        keys::WMS_LAYER_ID => config.wms_layer_id = Some(string_value(name, value)?),
        keys::JOB_TYPE => config.job_type = Some(string_value(name, value)?),
        keys::MIN_SCALE => config.min_scale = Some(float_value(name, value)?),
        keys::MAX_SCALE => config.max_scale = Some(float_value(name, value)?),
        keys::TEMPLATE_NAME => template(config).name = Some(string_value(name, value)?),
        keys::TEMPLATE_DESCRIPTION => {
            template(config).description = Some(string_value(name, value)?)
        }
        keys::TEMPLATE_TYPE => template(config).template_type = Some(string_value(name, value)?),
        keys::REQUEST_TEMPLATE => {
            template(config).request_template = Some(string_value(name, value)?)
        }
        keys::RESPONSE_TEMPLATE => {
            template(config).response_template = Some(string_value(name, value)?)
        }
        keys::SELECTION_SLD_STYLE => config.selection_sld_style = Some(string_value(name, value)?),
        keys::STYLES => config.styles = style_entries(value)?,
        other => {
            warn!(field = other, "unrecognized field while decoding layer configuration");
            return Err(ParseError::UnrecognizedField {
                field: other.to_string(),
            });
        }
    }
    Ok(())
}

fn template(config: &mut LayerConfig) -> &mut FeatureTemplate {
    config.template.get_or_insert_with(FeatureTemplate::default)
}

fn string_value(field: &str, value: &Value) -> Result<String, ParseError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        // The upstream producer occasionally publishes numeric ids unquoted.
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ParseError::invalid(field, "string")),
    }
}

fn bool_value(field: &str, value: &Value) -> Result<bool, ParseError> {
    match value {
        Value::Bool(b) => Ok(*b),
        _ => Err(ParseError::invalid(field, "boolean")),
    }
}

fn float_value(field: &str, value: &Value) -> Result<f64, ParseError> {
    value
        .as_f64()
        .ok_or_else(|| ParseError::invalid(field, "number"))
}

fn count_value(field: &str, value: &Value) -> Result<u32, ParseError> {
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| ParseError::invalid(field, "non-negative integer"))
}

/// Object whose values are scalars, e.g. `featureType`. Keys are free-form
/// (type names), order is preserved.
fn string_map(field: &str, value: &Value) -> Result<Vec<(String, String)>, ParseError> {
    let Value::Object(entries) = value else {
        return Err(ParseError::invalid(field, "object"));
    };
    entries
        .iter()
        .map(|(key, v)| Ok((key.clone(), string_value(field, v)?)))
        .collect()
}

/// Object whose values are arrays of strings, e.g. `selectedFeatureParams`.
fn string_list_map(field: &str, value: &Value) -> Result<Vec<(String, Vec<String>)>, ParseError> {
    let Value::Object(entries) = value else {
        return Err(ParseError::invalid(field, "object"));
    };
    entries
        .iter()
        .map(|(key, v)| {
            let Value::Array(items) = v else {
                return Err(ParseError::invalid(field, "array of strings"));
            };
            let list = items
                .iter()
                .map(|item| string_value(field, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((key.clone(), list))
        })
        .collect()
}

/// Object whose values are numbers, e.g. `tileBuffer`.
fn float_map(field: &str, value: &Value) -> Result<Vec<(String, f64)>, ParseError> {
    let Value::Object(entries) = value else {
        return Err(ParseError::invalid(field, "object"));
    };
    entries
        .iter()
        .map(|(key, v)| Ok((key.clone(), float_value(field, v)?)))
        .collect()
}

/// `styles` is an object of named entries; the entry names exist for
/// operator readability and are ignored. Each entry is an object with the
/// fixed `id`/`name`/`sldStyleBody` vocabulary; anything else fails.
fn style_entries(value: &Value) -> Result<Vec<SldStyle>, ParseError> {
    let Value::Object(entries) = value else {
        return Err(ParseError::invalid(keys::STYLES, "object"));
    };
    let mut styles = Vec::with_capacity(entries.len());
    for (_, entry) in entries {
        let Value::Object(fields) = entry else {
            return Err(ParseError::invalid(keys::STYLES, "object entry"));
        };
        let mut style = SldStyle::default();
        for (name, v) in fields {
            match name.as_str() {
                keys::STYLE_ID => style.id = Some(string_value(keys::STYLE_ID, v)?),
                keys::STYLE_NAME => style.name = Some(string_value(keys::STYLE_NAME, v)?),
                keys::STYLE_SLD_BODY => {
                    style.sld_body = Some(string_value(keys::STYLE_SLD_BODY, v)?)
                }
                other => {
                    return Err(ParseError::UnrecognizedField {
                        field: other.to_string(),
                    })
                }
            }
        }
        styles.push(style);
    }
    Ok(styles)
}
