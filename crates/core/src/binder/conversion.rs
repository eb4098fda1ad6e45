use crate::binder::ObjectType;
use crate::errors::CoreError;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// A single value conversion
pub type ObjectConverter = Arc<dyn Fn(Value) -> Result<Value, CoreError> + Send + Sync>;

/// Converts raw property values towards a named target type
pub trait ObjectConversionService: Send + Sync {
    fn can_convert(&self, source: &Value, target: &ObjectType) -> bool;

    fn convert(&self, source: Value, target: &ObjectType) -> Result<Value, CoreError>;
}

/// The JSON kind of a value, used as the source half of a converter key
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn converter_key(source_kind: &str, target: &ObjectType) -> String {
    format!("{}->{}", source_kind, target.name())
}

/// Conversion service with converters keyed by `"<source kind>-><target>"`
#[derive(Clone, Default)]
pub struct GenericConversionService {
    converters: HashMap<String, ObjectConverter>,
}

impl GenericConversionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service carrying the built-in scalar and location converters
    pub fn with_defaults() -> Self {
        let mut service = Self::new();

        service.add_converter("string", ObjectType::string(), |v| Ok(v));
        service.add_converter("number", ObjectType::string(), |v| Ok(json!(v.to_string())));
        service.add_converter("boolean", ObjectType::string(), |v| Ok(json!(v.to_string())));

        service.add_converter("string", ObjectType::boolean(), |v| {
            let raw = as_str(&v)?;
            match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(json!(true)),
                "false" | "no" | "off" | "0" => Ok(json!(false)),
                other => Err(CoreError::configuration(format!(
                    "cannot convert '{}' to boolean",
                    other
                ))),
            }
        });

        service.add_converter("string", ObjectType::integer(), |v| {
            let raw = as_str(&v)?;
            raw.trim().parse::<i64>().map(|n| json!(n)).map_err(|e| {
                CoreError::configuration(format!("cannot convert '{}' to integer: {}", raw, e))
            })
        });
        service.add_converter("number", ObjectType::integer(), |v| match v.as_i64() {
            Some(n) => Ok(json!(n)),
            None => Err(CoreError::configuration(format!(
                "cannot convert {} to integer",
                v
            ))),
        });

        service.add_converter("string", ObjectType::float(), |v| {
            let raw = as_str(&v)?;
            let parsed = raw.trim().parse::<f64>().map_err(|e| {
                CoreError::configuration(format!("cannot convert '{}' to float: {}", raw, e))
            })?;
            serde_json::Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| CoreError::configuration(format!("'{}' is not a finite float", raw)))
        });

        service.add_converter("string", ObjectType::list(), |v| {
            let raw = as_str(&v)?;
            Ok(Value::Array(split_list(raw).map(|s| json!(s)).collect()))
        });

        service.add_converter("string", ObjectType::config_locations(), |v| {
            let raw = as_str(&v)?;
            Ok(Value::Array(split_list(raw).map(location_value).collect()))
        });
        service.add_converter("array", ObjectType::config_locations(), |v| {
            let Value::Array(items) = v else {
                return Err(CoreError::configuration("expected an array of locations"));
            };
            items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(location_value(&s)),
                    Value::Object(_) => Ok(item),
                    other => Err(CoreError::configuration(format!(
                        "cannot convert {} to a config location",
                        other
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        });

        service
    }

    pub fn add_converter<F>(&mut self, source_kind: &str, target: ObjectType, converter: F)
    where
        F: Fn(Value) -> Result<Value, CoreError> + Send + Sync + 'static,
    {
        self.converters
            .insert(converter_key(source_kind, &target), Arc::new(converter));
    }

    pub fn converter_count(&self) -> usize {
        self.converters.len()
    }
}

impl ObjectConversionService for GenericConversionService {
    fn can_convert(&self, source: &Value, target: &ObjectType) -> bool {
        self.converters
            .contains_key(&converter_key(value_kind(source), target))
    }

    fn convert(&self, source: Value, target: &ObjectType) -> Result<Value, CoreError> {
        let key = converter_key(value_kind(&source), target);
        match self.converters.get(&key) {
            Some(converter) => converter(source),
            None => Err(CoreError::configuration(format!(
                "no converter registered for {}",
                key
            ))),
        }
    }
}

/// Ordered chain of conversion services; the first that can convert wins
#[derive(Clone, Default)]
pub struct ObjectConverters {
    services: Vec<Arc<dyn ObjectConversionService>>,
}

impl ObjectConverters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut converters = Self::new();
        converters.add_service(Arc::new(GenericConversionService::with_defaults()));
        converters
    }

    pub fn add_service(&mut self, service: Arc<dyn ObjectConversionService>) {
        self.services.push(service);
    }

    pub fn add_services(&mut self, services: impl IntoIterator<Item = Arc<dyn ObjectConversionService>>) {
        self.services.extend(services);
    }

    /// Values no service can convert pass through unchanged
    pub fn convert(&self, source: Value, target: &ObjectType) -> Result<Value, CoreError> {
        match self
            .services
            .iter()
            .find(|service| service.can_convert(&source, target))
        {
            Some(service) => service.convert(source, target),
            None => Ok(source),
        }
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

fn as_str(value: &Value) -> Result<&str, CoreError> {
    value
        .as_str()
        .ok_or_else(|| CoreError::configuration(format!("expected a string, got {}", value)))
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn location_value(raw: &str) -> Value {
    json!({ "value": raw, "origin": null })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_defaults() {
        let service = GenericConversionService::with_defaults();
        assert_eq!(
            service.convert(json!("TRUE"), &ObjectType::boolean()).unwrap(),
            json!(true)
        );
        assert_eq!(
            service.convert(json!(" 42 "), &ObjectType::integer()).unwrap(),
            json!(42)
        );
        assert_eq!(
            service.convert(json!("1.5"), &ObjectType::float()).unwrap(),
            json!(1.5)
        );
        assert_eq!(
            service.convert(json!(7), &ObjectType::string()).unwrap(),
            json!("7")
        );
        assert!(service.convert(json!("maybe"), &ObjectType::boolean()).is_err());
    }

    #[test]
    fn test_location_converters() {
        let service = GenericConversionService::with_defaults();
        let converted = service
            .convert(json!("src/resources, config/"), &ObjectType::config_locations())
            .unwrap();
        assert_eq!(
            converted,
            json!([
                {"value": "src/resources", "origin": null},
                {"value": "config/", "origin": null}
            ])
        );

        let converted = service
            .convert(
                json!(["a.yaml", {"value": "b.yaml", "origin": "test"}]),
                &ObjectType::config_locations(),
            )
            .unwrap();
        assert_eq!(converted[1]["origin"], json!("test"));
        assert_eq!(converted[0]["value"], json!("a.yaml"));
    }

    #[test]
    fn test_chain_passes_through_unknown_conversions() {
        let converters = ObjectConverters::with_defaults();
        let value = json!({"nested": true});
        assert_eq!(
            converters.convert(value.clone(), &ObjectType::named("custom")).unwrap(),
            value
        );
    }

    #[test]
    fn test_first_service_wins() {
        let mut first = GenericConversionService::new();
        first.add_converter("string", ObjectType::string(), |_| Ok(json!("first")));
        let mut converters = ObjectConverters::new();
        converters.add_service(Arc::new(first));
        converters.add_service(Arc::new(GenericConversionService::with_defaults()));
        assert_eq!(
            converters.convert(json!("x"), &ObjectType::string()).unwrap(),
            json!("first")
        );
    }
}
