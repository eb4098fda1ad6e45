use crate::container::{downcast_object, ObjectProvider};
use crate::errors::CoreError;
use crate::foundation::{ObjectRef, Ordered};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Builds an instance, resolving its parameters by name through the provider
pub type ObjectConstructor =
    Arc<dyn Fn(&dyn ObjectProvider) -> Result<ObjectRef, CoreError> + Send + Sync>;

/// Produces an already available instance, bypassing construction
pub type ObjectSupplier = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// Runs while the new instance is exposed as an early singleton
pub type ObjectInitializer =
    Arc<dyn Fn(&ObjectRef, &dyn ObjectProvider) -> Result<(), CoreError> + Send + Sync>;

/// The key used to locate a set of exported definitions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLoadingConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(rename = "type")]
    pub object_type: String,
}

impl ObjectLoadingConfig {
    pub fn new(name: impl Into<String>, object_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            object_type: object_type.into(),
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Deterministic path of the unit this config points at
    pub fn unit_path(&self) -> String {
        unit_path(self.module.as_deref(), &self.name)
    }
}

impl std::fmt::Display for ObjectLoadingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}]", self.unit_path(), self.object_type)
    }
}

/// `core/<name>` without a module, `applications/<module>/<name>` with one.
/// Dots in the module name become path separators.
pub fn unit_path(module: Option<&str>, name: &str) -> String {
    match module {
        Some(module) => format!("applications/{}/{}", module.replace('.', "/"), name),
        None => format!("core/{}", name),
    }
}

/// One exported entry of a unit: how to build a single named object
#[derive(Clone)]
pub struct ObjectClassExport {
    pub object_id: Option<String>,
    pub class_name: String,
    pub constructor: Option<ObjectConstructor>,
    pub order: i32,
    pub source: Option<ObjectSupplier>,
    pub initializer: Option<ObjectInitializer>,
}

impl ObjectClassExport {
    /// Export a concrete type, named after the type itself
    pub fn of<T, F>(constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&dyn ObjectProvider) -> Result<T, CoreError> + Send + Sync + 'static,
    {
        Self::shared(short_type_name::<T>(), move |provider| {
            constructor(provider).map(Arc::new)
        })
    }

    /// Export an instance behind a shared pointer, usually a trait object.
    ///
    /// The instance is retrievable as `Arc<S>` through `get_object_as::<S>`.
    pub fn shared<S, F>(class_name: impl Into<String>, constructor: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn(&dyn ObjectProvider) -> Result<Arc<S>, CoreError> + Send + Sync + 'static,
    {
        let constructor: ObjectConstructor =
            Arc::new(move |provider| Ok(Arc::new(constructor(provider)?) as ObjectRef));
        Self {
            object_id: None,
            class_name: class_name.into(),
            constructor: Some(constructor),
            order: 0,
            source: None,
            initializer: None,
        }
    }

    /// Export an object that is always available eagerly
    pub fn supplied<S, F>(class_name: impl Into<String>, supplier: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        let source: ObjectSupplier = Arc::new(move || Arc::new(supplier()) as ObjectRef);
        Self {
            object_id: None,
            class_name: class_name.into(),
            constructor: None,
            order: 0,
            source: Some(source),
            initializer: None,
        }
    }

    /// An export with no way to build it
    pub fn unresolved(class_name: impl Into<String>) -> Self {
        Self {
            object_id: None,
            class_name: class_name.into(),
            constructor: None,
            order: 0,
            source: None,
            initializer: None,
        }
    }

    pub fn with_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = Some(object_id.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_initializer<F>(mut self, initializer: F) -> Self
    where
        F: Fn(&ObjectRef, &dyn ObjectProvider) -> Result<(), CoreError> + Send + Sync + 'static,
    {
        self.initializer = Some(Arc::new(initializer));
        self
    }

    /// The registration name: the declared id, else the class name
    pub fn object_name(&self) -> &str {
        self.object_id.as_deref().unwrap_or(&self.class_name)
    }

    pub fn is_resolvable(&self) -> bool {
        self.constructor.is_some() || self.source.is_some()
    }

    /// Build the instance: the eager source if any, else the constructor
    pub fn instantiate(&self, provider: &dyn ObjectProvider) -> Result<ObjectRef, CoreError> {
        if let Some(source) = &self.source {
            return Ok(source());
        }
        match &self.constructor {
            Some(constructor) => constructor(provider),
            None => Err(CoreError::configuration(format!(
                "object {} has no constructor",
                self.object_name()
            ))),
        }
    }

    /// Build the instance and view it as `Arc<S>`
    pub fn instantiate_as<S>(&self, provider: &dyn ObjectProvider) -> Result<Arc<S>, CoreError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        downcast_object(self.object_name(), &self.instantiate(provider)?)
    }
}

impl Ordered for ObjectClassExport {
    fn order(&self) -> i32 {
        self.order
    }
}

impl std::fmt::Debug for ObjectClassExport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectClassExport")
            .field("object_id", &self.object_id)
            .field("class_name", &self.class_name)
            .field("order", &self.order)
            .field("constructor", &self.constructor.is_some())
            .field("source", &self.source.is_some())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConsoleListener;

    #[test]
    fn test_unit_paths() {
        assert_eq!(
            ObjectLoadingConfig::new("listeners", "applicationListener").unit_path(),
            "core/listeners"
        );
        assert_eq!(
            ObjectLoadingConfig::new("processors", "objectDefinitionPostProcessor")
                .with_module("bootstrap.definitions")
                .unit_path(),
            "applications/bootstrap/definitions/processors"
        );
    }

    #[test]
    fn test_export_naming() {
        let export = ObjectClassExport::of(|_| Ok(ConsoleListener));
        assert_eq!(export.class_name, "ConsoleListener");
        assert_eq!(export.object_name(), "ConsoleListener");
        assert!(export.is_resolvable());

        let export = export.with_id("console").with_order(3);
        assert_eq!(export.object_name(), "console");
        assert_eq!(export.order(), 3);

        assert!(!ObjectClassExport::unresolved("Ghost").is_resolvable());
    }

    #[test]
    fn test_loading_config_deserializes_type_key() {
        let config: ObjectLoadingConfig = serde_json::from_str(
            r#"{"name": "processors", "module": "bootstrap", "type": "objectDefinitionPostProcessor"}"#,
        )
        .unwrap();
        assert_eq!(config.object_type, "objectDefinitionPostProcessor");
        assert_eq!(config.module.as_deref(), Some("bootstrap"));
    }
}
