use crate::config::sources::APP_PROP_SOURCE_ORDER;
use crate::config::MapPropertySource;
use crate::errors::CoreError;
use crate::resources::FileResource;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parses one configuration file into a property source
pub trait PropertySourceLoader: Send + Sync {
    fn file_extensions(&self) -> &'static [&'static str];

    fn load(&self, name: &str, resource: &FileResource) -> Result<MapPropertySource, CoreError>;

    fn supports(&self, resource: &FileResource) -> bool {
        resource
            .extension()
            .map(|ext| {
                self.file_extensions()
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default)]
pub struct YamlPropertySourceLoader;

impl PropertySourceLoader for YamlPropertySourceLoader {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["yaml", "yml"]
    }

    fn load(&self, name: &str, resource: &FileResource) -> Result<MapPropertySource, CoreError> {
        let content = resource.read_to_string()?;
        let document: Value = if content.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(&content)?
        };
        Ok(MapPropertySource::from_map(
            name,
            APP_PROP_SOURCE_ORDER,
            flatten(&document),
        ))
    }
}

#[derive(Debug, Clone, Default)]
pub struct JsonPropertySourceLoader;

impl PropertySourceLoader for JsonPropertySourceLoader {
    fn file_extensions(&self) -> &'static [&'static str] {
        &["json"]
    }

    fn load(&self, name: &str, resource: &FileResource) -> Result<MapPropertySource, CoreError> {
        let document: Value = serde_json::from_str(&resource.read_to_string()?)?;
        Ok(MapPropertySource::from_map(
            name,
            APP_PROP_SOURCE_ORDER,
            flatten(&document),
        ))
    }
}

/// Flatten a document into dotted keys.
///
/// Arrays are kept whole under their own key and also indexed as `key[i]`.
pub fn flatten(document: &Value) -> BTreeMap<String, Value> {
    let mut properties = BTreeMap::new();
    flatten_into(&mut properties, None, document);
    properties
}

fn flatten_into(properties: &mut BTreeMap<String, Value>, prefix: Option<&str>, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let key = match prefix {
                    Some(prefix) => format!("{}.{}", prefix, key),
                    None => key.clone(),
                };
                flatten_into(properties, Some(&key), child);
            }
        }
        Value::Array(items) => {
            if let Some(prefix) = prefix {
                properties.insert(prefix.to_string(), value.clone());
                for (index, item) in items.iter().enumerate() {
                    flatten_into(properties, Some(&format!("{}[{}]", prefix, index)), item);
                }
            }
        }
        scalar => {
            if let Some(prefix) = prefix {
                properties.insert(prefix.to_string(), scalar.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigProperty, PropertySource};
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_flatten_nested_document() {
        let flat = flatten(&json!({
            "application": {"server": {"port": 8080}},
            "config": {"import": ["a.yaml", "b.yaml"]},
            "name": "mystic"
        }));
        assert_eq!(flat.get("application.server.port"), Some(&json!(8080)));
        assert_eq!(flat.get("config.import"), Some(&json!(["a.yaml", "b.yaml"])));
        assert_eq!(flat.get("config.import[1]"), Some(&json!("b.yaml")));
        assert_eq!(flat.get("name"), Some(&json!("mystic")));
    }

    #[test]
    fn test_yaml_and_json_loaders() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("application.yml");
        let json_file = dir.path().join("application.json");
        std::fs::write(&yaml, "application:\n  server:\n    port: 9000\n").unwrap();
        std::fs::write(&json_file, r#"{"feature": {"enabled": true}}"#).unwrap();

        let yaml = FileResource::new(yaml);
        let json_file = FileResource::new(json_file);
        let yaml_loader = YamlPropertySourceLoader;
        let json_loader = JsonPropertySourceLoader;

        assert!(yaml_loader.supports(&yaml));
        assert!(!yaml_loader.supports(&json_file));
        assert!(json_loader.supports(&json_file));

        let source = yaml_loader.load("yaml", &yaml).unwrap();
        assert_eq!(PropertySource::order(&source), APP_PROP_SOURCE_ORDER);
        assert_eq!(
            source.get_property(&ConfigProperty::parse("application.server.port")),
            Some(json!(9000))
        );

        let source = json_loader.load("json", &json_file).unwrap();
        assert_eq!(
            source.get_property(&ConfigProperty::parse("feature.enabled")),
            Some(json!(true))
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = JsonPropertySourceLoader
            .load("broken", &FileResource::new(path))
            .unwrap_err();
        assert!(err.is_discovery());
    }
}
