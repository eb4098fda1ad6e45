use crate::binder::{BindResult, Bindable, ObjectConverters};
use crate::config::{ApplicationEnvironment, ConfigProperty, PropertySource};
use crate::errors::CoreError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// The source list a binder searches
pub trait BindContext {
    fn sources(&self) -> &[Arc<dyn PropertySource>];
}

/// Optional hooks observing a bind
pub trait BindHandler<T> {
    fn on_start(&self, _property: &ConfigProperty, _bindable: &Bindable<T>) {}

    fn on_success(&self, _property: &ConfigProperty, _value: &T) {}
}

/// Binds dotted property paths from a fixed source list to typed values.
///
/// The source list is taken in insertion order when the binder is created and
/// searched in that order; the environment's precedence rules do not apply.
pub struct ObjectConfigPropertyBinder {
    sources: Vec<Arc<dyn PropertySource>>,
    converters: ObjectConverters,
}

impl ObjectConfigPropertyBinder {
    /// Snapshot the environment's sources
    pub fn new(environment: &ApplicationEnvironment) -> Self {
        Self::from_sources(environment.property_sources().to_list())
    }

    pub fn from_sources(sources: Vec<Arc<dyn PropertySource>>) -> Self {
        Self {
            sources,
            converters: ObjectConverters::with_defaults(),
        }
    }

    pub fn with_converters(mut self, converters: ObjectConverters) -> Self {
        self.converters = converters;
        self
    }

    pub fn of_property(path: &str) -> ConfigProperty {
        ConfigProperty::parse(path)
    }

    pub fn bind<T: DeserializeOwned>(
        &self,
        path: &str,
        bindable: &Bindable<T>,
    ) -> Result<BindResult<T>, CoreError> {
        self.bind_property(&Self::of_property(path), bindable, None)
    }

    pub fn bind_with_handler<T: DeserializeOwned>(
        &self,
        path: &str,
        bindable: &Bindable<T>,
        handler: &dyn BindHandler<T>,
    ) -> Result<BindResult<T>, CoreError> {
        self.bind_property(&Self::of_property(path), bindable, Some(handler))
    }

    pub fn bind_property<T: DeserializeOwned>(
        &self,
        property: &ConfigProperty,
        bindable: &Bindable<T>,
        handler: Option<&dyn BindHandler<T>>,
    ) -> Result<BindResult<T>, CoreError> {
        if property.is_empty() {
            return Err(CoreError::null_argument("path"));
        }
        let target = bindable
            .target()
            .ok_or_else(|| CoreError::null_argument("bindable.target"))?;

        if let Some(handler) = handler {
            handler.on_start(property, bindable);
        }

        let Some(source) = self
            .sources
            .iter()
            .find(|source| source.contains_property(property))
        else {
            tracing::debug!("Property '{}' is not bound by any source", property);
            return Ok(BindResult::unbound());
        };

        let raw = match source.get_property(property) {
            Some(Value::Null) | None => return Ok(BindResult::unbound()),
            Some(value) => value,
        };

        let path = property.full_name();
        let converted = self
            .converters
            .convert(raw, target)
            .map_err(|e| CoreError::invalid_binding(path, e))?;
        let value: T =
            serde_json::from_value(converted).map_err(|e| CoreError::invalid_binding(path, e))?;

        tracing::debug!("Bound '{}' from source '{}' as {}", path, source.name(), target);
        if let Some(handler) = handler {
            handler.on_success(property, &value);
        }
        Ok(BindResult::bound(value))
    }
}

impl BindContext for ObjectConfigPropertyBinder {
    fn sources(&self) -> &[Arc<dyn PropertySource>] {
        &self.sources
    }
}

impl std::fmt::Debug for ObjectConfigPropertyBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectConfigPropertyBinder")
            .field(
                "sources",
                &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .field("converters", &self.converters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ObjectType;
    use crate::config::MapPropertySource;
    use serde_json::json;
    use std::sync::Mutex;

    fn binder(sources: Vec<MapPropertySource>) -> ObjectConfigPropertyBinder {
        ObjectConfigPropertyBinder::from_sources(
            sources
                .into_iter()
                .map(|s| Arc::new(s) as Arc<dyn PropertySource>)
                .collect(),
        )
    }

    #[test]
    fn test_bind_first_source_in_list_order() {
        // list order wins even though "second" has the lower order
        let binder = binder(vec![
            MapPropertySource::new("first", 20).with_property("server.port", "8080"),
            MapPropertySource::new("second", 1).with_property("server.port", "9090"),
        ]);
        let port: BindResult<u16> = binder
            .bind("server.port", &Bindable::of(ObjectType::integer()))
            .unwrap();
        assert!(port.is_bound());
        assert_eq!(port.get(), Some(&8080));
    }

    #[test]
    fn test_unbound_uses_or_else() {
        let binder = binder(vec![MapPropertySource::new("empty", 1)]);
        let names: Vec<String> = binder
            .bind("application.config.name", &Bindable::of(ObjectType::list()))
            .unwrap()
            .or_else(vec!["application".to_string()]);
        assert_eq!(names, vec!["application"]);
    }

    #[test]
    fn test_empty_path_and_missing_target_are_null_arguments() {
        let binder = binder(vec![MapPropertySource::new("a", 1).with_property("k", "v")]);
        let err = binder
            .bind::<String>("", &Bindable::of(ObjectType::string()))
            .unwrap_err();
        assert!(matches!(err, CoreError::NullArgument { .. }));

        let err = binder.bind::<String>("k", &Bindable::untyped()).unwrap_err();
        assert!(matches!(err, CoreError::NullArgument { .. }));
    }

    #[test]
    fn test_conversion_failure_is_invalid_binding() {
        let binder = binder(vec![
            MapPropertySource::new("a", 1).with_property("server.port", "not-a-port")
        ]);
        let err = binder
            .bind::<u16>("server.port", &Bindable::of(ObjectType::integer()))
            .unwrap_err();
        match err {
            CoreError::InvalidBinding { path, .. } => assert_eq!(path, "server.port"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_bind_with_handler_reports_success() {
        struct Recorder(Mutex<Vec<String>>);
        impl BindHandler<bool> for Recorder {
            fn on_start(&self, property: &ConfigProperty, _bindable: &Bindable<bool>) {
                self.0.lock().unwrap().push(format!("start:{}", property));
            }
            fn on_success(&self, property: &ConfigProperty, value: &bool) {
                self.0.lock().unwrap().push(format!("ok:{}={}", property, value));
            }
        }

        let binder = binder(vec![
            MapPropertySource::new("a", 1).with_property("feature.enabled", json!("yes"))
        ]);
        let recorder = Recorder(Mutex::new(Vec::new()));
        let result = binder
            .bind_with_handler(
                "feature.enabled",
                &Bindable::of(ObjectType::boolean()),
                &recorder,
            )
            .unwrap();
        assert_eq!(result.into_inner(), Some(true));
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec!["start:feature.enabled", "ok:feature.enabled=true"]
        );
    }
}
