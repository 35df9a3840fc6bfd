//! Serializer for the layer-configuration wire format.
//!
//! Structural inverse of the decoder for every typed field except the two
//! output-only/internal ones: the memoized CRS handle (derived state, never
//! on the wire) and `password` (write-path credential, decoded but never
//! emitted back). Absent options and empty containers are omitted; the
//! capability booleans are always written.

use serde_json::{Map, Value};

use super::keys;
use super::types::{LayerConfig, SldStyle};

/// Encode a configuration into its wire document.
pub fn encode(config: &LayerConfig) -> Vec<u8> {
    let mut doc = Map::new();

    doc.insert(
        keys::LAYER_ID.to_string(),
        Value::String(config.layer_id.clone()),
    );
    put_string(&mut doc, keys::URL, &config.url);
    put_string(&mut doc, keys::USERNAME, &config.username);
    // password is deliberately not written back
    put_string(&mut doc, keys::LAYER_NAME, &config.layer_name);
    put_string(
        &mut doc,
        keys::GML_GEOMETRY_PROPERTY,
        &config.gml_geometry_property,
    );
    put_string(&mut doc, keys::SRS_NAME, &config.srs_name);
    put_string(&mut doc, keys::GML_VERSION, &config.gml_version);
    doc.insert(
        keys::GML2_SEPARATOR.to_string(),
        Value::Bool(config.gml2_separator),
    );
    put_string(&mut doc, keys::WFS_VERSION, &config.wfs_version);
    if let Some(max_features) = config.max_features {
        doc.insert(keys::MAX_FEATURES.to_string(), Value::from(max_features));
    }
    put_string(&mut doc, keys::FEATURE_NAMESPACE, &config.feature_namespace);
    put_string(
        &mut doc,
        keys::FEATURE_NAMESPACE_URI,
        &config.feature_namespace_uri,
    );
    put_string(
        &mut doc,
        keys::GEOMETRY_NAMESPACE_URI,
        &config.geometry_namespace_uri,
    );
    put_string(&mut doc, keys::FEATURE_ELEMENT, &config.feature_element);
    put_string(&mut doc, keys::OUTPUT_FORMAT, &config.output_format);

    if !config.feature_type.is_empty() {
        let entries = config
            .feature_type
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        doc.insert(keys::FEATURE_TYPE.to_string(), Value::Object(entries));
    }
    put_string_list_map(
        &mut doc,
        keys::SELECTED_FEATURE_PARAMS,
        &config.selected_feature_params,
    );
    put_string_list_map(
        &mut doc,
        keys::FEATURE_PARAMS_LOCALES,
        &config.feature_params_locales,
    );

    put_string(&mut doc, keys::GEOMETRY_TYPE, &config.geometry_type);
    doc.insert(
        keys::GET_MAP_TILES.to_string(),
        Value::Bool(config.get_map_tiles),
    );
    doc.insert(
        keys::GET_HIGHLIGHT_IMAGE.to_string(),
        Value::Bool(config.get_highlight_image),
    );
    doc.insert(
        keys::GET_FEATURE_INFO.to_string(),
        Value::Bool(config.get_feature_info),
    );
    doc.insert(
        keys::TILE_REQUEST.to_string(),
        Value::Bool(config.tile_request),
    );

    if !config.tile_buffer.is_empty() {
        let entries = config
            .tile_buffer
            .iter()
            .map(|(style, buffer)| (style.clone(), Value::from(*buffer)))
            .collect();
        doc.insert(keys::TILE_BUFFER.to_string(), Value::Object(entries));
    }

    put_string(&mut doc, keys::WMS_LAYER_ID, &config.wms_layer_id);
    put_string(&mut doc, keys::JOB_TYPE, &config.job_type);
    if let Some(min_scale) = config.min_scale {
        doc.insert(keys::MIN_SCALE.to_string(), Value::from(min_scale));
    }
    if let Some(max_scale) = config.max_scale {
        doc.insert(keys::MAX_SCALE.to_string(), Value::from(max_scale));
    }

    if let Some(template) = &config.template {
        put_string(&mut doc, keys::TEMPLATE_NAME, &template.name);
        put_string(&mut doc, keys::TEMPLATE_DESCRIPTION, &template.description);
        put_string(&mut doc, keys::TEMPLATE_TYPE, &template.template_type);
        put_string(&mut doc, keys::REQUEST_TEMPLATE, &template.request_template);
        put_string(
            &mut doc,
            keys::RESPONSE_TEMPLATE,
            &template.response_template,
        );
    }

    put_string(&mut doc, keys::SELECTION_SLD_STYLE, &config.selection_sld_style);

    if !config.styles.is_empty() {
        doc.insert(keys::STYLES.to_string(), style_entries(&config.styles));
    }

    // Serializing a JSON tree we just built cannot fail.
    Value::Object(doc).to_string().into_bytes()
}

fn put_string(doc: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        doc.insert(key.to_string(), Value::String(v.clone()));
    }
}

fn put_string_list_map(
    doc: &mut Map<String, Value>,
    key: &str,
    entries: &[(String, Vec<String>)],
) {
    if entries.is_empty() {
        return;
    }
    let object = entries
        .iter()
        .map(|(locale, list)| {
            let items = list.iter().cloned().map(Value::String).collect();
            (locale.clone(), Value::Array(items))
        })
        .collect();
    doc.insert(key.to_string(), Value::Object(object));
}

/// Styles encode as an object of named entries (the decoder ignores the
/// names). Entry keys prefer the style name, then the id, then the index,
/// and are de-duplicated so no style is lost.
fn style_entries(styles: &[SldStyle]) -> Value {
    let mut entries = Map::new();
    for (index, style) in styles.iter().enumerate() {
        let mut key = style
            .name
            .clone()
            .or_else(|| style.id.clone())
            .unwrap_or_else(|| index.to_string());
        if entries.contains_key(&key) {
            key = format!("{key}-{index}");
        }

        let mut entry = Map::new();
        put_string(&mut entry, keys::STYLE_ID, &style.id);
        put_string(&mut entry, keys::STYLE_NAME, &style.name);
        put_string(&mut entry, keys::STYLE_SLD_BODY, &style.sld_body);
        entries.insert(key, Value::Object(entry));
    }
    Value::Object(entries)
}

#[cfg(test)]
mod tests {
    use super::super::parser::decode;
    use super::*;
    use crate::config::types::FeatureTemplate;

    fn full_config() -> LayerConfig {
        let mut config = LayerConfig::new("42");
        config.url = Some("https://example.org/wfs".to_string());
        config.username = Some("reader".to_string());
        config.layer_name = Some("topp:roads".to_string());
        config.gml_geometry_property = Some("topp:the_geom".to_string());
        config.srs_name = Some("EPSG:3067".to_string());
        config.gml_version = Some("3.1.1".to_string());
        config.gml2_separator = true;
        config.wfs_version = Some("1.1.0".to_string());
        config.max_features = Some(2000);
        config.feature_namespace = Some("topp".to_string());
        config.feature_namespace_uri = Some("http://www.openplans.org/topp".to_string());
        config.geometry_namespace_uri = Some("http://www.opengis.net/gml".to_string());
        config.feature_element = Some("roads".to_string());
        config.output_format = Some("GML3".to_string());
        config.feature_type = vec![
            ("name".to_string(), "String".to_string()),
            ("the_geom".to_string(), "MultiLineString".to_string()),
        ];
        config.selected_feature_params = vec![
            ("fi".to_string(), vec!["nimi".to_string()]),
            ("en".to_string(), vec!["name".to_string()]),
        ];
        config.feature_params_locales = vec![("fi".to_string(), vec!["Nimi".to_string()])];
        config.geometry_type = Some("2d".to_string());
        config.get_map_tiles = true;
        config.get_feature_info = true;
        config.tile_buffer = vec![
            ("default".to_string(), 1.0),
            ("highlight".to_string(), 0.5),
        ];
        config.wms_layer_id = Some("base_35".to_string());
        config.job_type = Some("normal".to_string());
        config.min_scale = Some(50000.0);
        config.max_scale = Some(1.0);
        config.template = Some(FeatureTemplate {
            name: Some("t".to_string()),
            description: Some("d".to_string()),
            template_type: Some("wfs".to_string()),
            request_template: Some("req".to_string()),
            response_template: Some("resp".to_string()),
        });
        config.selection_sld_style = Some("<sld/>".to_string());
        config.styles = vec![
            SldStyle {
                id: Some("1".to_string()),
                name: Some("default".to_string()),
                sld_body: Some("<sld>a</sld>".to_string()),
            },
            SldStyle {
                id: Some("2".to_string()),
                name: Some("highlight".to_string()),
                sld_body: None,
            },
        ];
        config
    }

    #[test]
    fn test_round_trip_full_config() {
        let config = full_config();
        let decoded = decode(&encode(&config)).unwrap().unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_round_trip_default_config() {
        let config = LayerConfig::new("7");
        let decoded = decode(&encode(&config)).unwrap().unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_password_never_encoded() {
        let decoded = decode(br#"{"layerId":"42","password":"hunter2"}"#)
            .unwrap()
            .unwrap();
        assert_eq!(decoded.password.as_deref(), Some("hunter2"));

        let wire = encode(&decoded);
        let text = String::from_utf8(wire.clone()).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(!text.contains("password"));

        // Round trip drops only the credential.
        let reparsed = decode(&wire).unwrap().unwrap();
        let mut expected = decoded.clone();
        expected.password = None;
        assert_eq!(reparsed, expected);
    }

    #[test]
    fn test_encode_omits_empty_containers() {
        let wire = encode(&LayerConfig::new("7"));
        let text = String::from_utf8(wire).unwrap();
        assert!(!text.contains("featureType"));
        assert!(!text.contains("styles"));
        assert!(!text.contains("tileBuffer"));
        // Booleans are always present.
        assert!(text.contains("gml2Separator"));
        assert!(text.contains("getMapTiles"));
    }

    #[test]
    fn test_encode_duplicate_style_names_kept() {
        let mut config = LayerConfig::new("7");
        config.styles = vec![
            SldStyle {
                id: Some("1".to_string()),
                name: Some("default".to_string()),
                sld_body: None,
            },
            SldStyle {
                id: Some("2".to_string()),
                name: Some("default".to_string()),
                sld_body: None,
            },
        ];
        let decoded = decode(&encode(&config)).unwrap().unwrap();
        assert_eq!(decoded.styles.len(), 2);
    }

    #[test]
    fn test_round_trip_preserves_container_order() {
        let config = full_config();
        let decoded = decode(&encode(&config)).unwrap().unwrap();
        assert_eq!(decoded.feature_type[0].0, "name");
        assert_eq!(decoded.feature_type[1].0, "the_geom");
        assert_eq!(decoded.selected_feature_params[0].0, "fi");
        assert_eq!(decoded.selected_feature_params[1].0, "en");
    }
}
