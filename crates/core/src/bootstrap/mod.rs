//! Assembly of the built-in registration table

use crate::config::{ApplicationEnvironment, PropertyResolver};
use crate::config_data::{
    ConfigDataEnvironmentPostProcessor, ConfigDataResolver, EnvironmentPostProcessor,
    JsonPropertySourceLoader, PropertySourceLoader, StandardConfigDataResolver,
    YamlPropertySourceLoader,
};
use crate::container::{ObjectDefinitionPostProcessor, ObjectProvider, RuntimeObjectFactory};
use crate::context::{
    ApplicationEventPublishListener, ApplicationStartupListener, EnvironmentPostProcessListener,
    APPLICATION_ENVIRONMENT_OBJECT,
};
use crate::errors::CoreError;
use crate::loader::kinds::{
    APPLICATION_LISTENER, CONFIG_DATA_RESOLVER, ENVIRONMENT_POST_PROCESSOR,
    OBJECT_DEFINITION_POST_PROCESSOR, PROPERTY_SOURCE_LOADER,
};
use crate::loader::{ObjectCatalog, ObjectClassExport, ObjectUnit};
use std::sync::Arc;

/// Module owning the built-in application units
pub const BOOTSTRAP_MODULE: &str = "bootstrap";

/// The registration table with every built-in component
pub fn default_catalog() -> ObjectCatalog {
    let mut catalog = ObjectCatalog::new();
    register_defaults(&mut catalog);
    catalog
}

/// Add the built-in units to an existing table
pub fn register_defaults(catalog: &mut ObjectCatalog) {
    catalog.register_core_unit(
        "listeners",
        ObjectUnit::new().with_exports(
            APPLICATION_LISTENER,
            vec![
                ObjectClassExport::shared("ApplicationEventPublishListener", publish_listener),
                ObjectClassExport::shared(
                    "EnvironmentPostProcessListener",
                    environment_post_process_listener,
                )
                .with_order(10),
            ],
        ),
    );

    catalog.register_module_unit(
        BOOTSTRAP_MODULE,
        "processors",
        ObjectUnit::new()
            .with_exports(
                ENVIRONMENT_POST_PROCESSOR,
                vec![ObjectClassExport::shared(
                    "ConfigDataEnvironmentPostProcessor",
                    config_data_post_processor,
                )],
            )
            .with_exports(
                OBJECT_DEFINITION_POST_PROCESSOR,
                vec![ObjectClassExport::shared(
                    "ConfigObjectPostProcessor",
                    config_object_post_processor,
                )],
            ),
    );

    catalog.register_module_unit(
        BOOTSTRAP_MODULE,
        "config",
        ObjectUnit::new()
            .with_exports(
                CONFIG_DATA_RESOLVER,
                vec![ObjectClassExport::shared(
                    "StandardConfigDataResolver",
                    standard_resolver,
                )],
            )
            .with_exports(
                PROPERTY_SOURCE_LOADER,
                vec![
                    ObjectClassExport::shared("YamlPropertySourceLoader", yaml_loader),
                    ObjectClassExport::shared("JsonPropertySourceLoader", json_loader).with_order(1),
                ],
            ),
    );
}

fn publish_listener(
    _: &dyn ObjectProvider,
) -> Result<Arc<dyn ApplicationStartupListener>, CoreError> {
    Ok(Arc::new(ApplicationEventPublishListener::new()?))
}

fn environment_post_process_listener(
    _: &dyn ObjectProvider,
) -> Result<Arc<dyn ApplicationStartupListener>, CoreError> {
    Ok(Arc::new(EnvironmentPostProcessListener))
}

fn config_data_post_processor(
    _: &dyn ObjectProvider,
) -> Result<Arc<dyn EnvironmentPostProcessor>, CoreError> {
    Ok(Arc::new(ConfigDataEnvironmentPostProcessor::new()))
}

fn config_object_post_processor(
    provider: &dyn ObjectProvider,
) -> Result<Arc<dyn ObjectDefinitionPostProcessor>, CoreError> {
    let environment = provider.get_object_as::<ApplicationEnvironment>(APPLICATION_ENVIRONMENT_OBJECT)?;
    Ok(Arc::new(ConfigObjectPostProcessor::new(environment)))
}

fn standard_resolver(_: &dyn ObjectProvider) -> Result<Arc<dyn ConfigDataResolver>, CoreError> {
    Ok(Arc::new(StandardConfigDataResolver::new()))
}

fn yaml_loader(_: &dyn ObjectProvider) -> Result<Arc<dyn PropertySourceLoader>, CoreError> {
    Ok(Arc::new(YamlPropertySourceLoader))
}

fn json_loader(_: &dyn ObjectProvider) -> Result<Arc<dyn PropertySourceLoader>, CoreError> {
    Ok(Arc::new(JsonPropertySourceLoader))
}

/// Property listing keys that must resolve before any singleton is built
pub const REQUIRED_PROPERTIES_PROPERTY: &str = "application.required.properties";

/// Checks the definition set against the environment before instantiation.
///
/// Every `parent` must name a known object, and the keys listed under
/// `application.required.properties` must resolve.
#[derive(Debug)]
pub struct ConfigObjectPostProcessor {
    environment: Arc<ApplicationEnvironment>,
}

impl ConfigObjectPostProcessor {
    pub fn new(environment: Arc<ApplicationEnvironment>) -> Self {
        Self { environment }
    }

    fn required_properties(&self) -> Vec<String> {
        match self.environment.get_property(REQUIRED_PROPERTIES_PROPERTY) {
            Some(serde_json::Value::Array(keys)) => keys
                .iter()
                .filter_map(|key| key.as_str().map(str::to_string))
                .collect(),
            Some(serde_json::Value::String(keys)) => keys
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl ObjectDefinitionPostProcessor for ConfigObjectPostProcessor {
    fn post_process(&self, factory: &RuntimeObjectFactory) -> Result<(), CoreError> {
        let names = factory.definition_names();
        tracing::debug!(
            "Checking {} definitions for profile {}",
            names.len(),
            self.environment.active_profile()
        );

        for name in &names {
            let Some(definition) = factory.get_obj_definition(name) else {
                continue;
            };
            if let Some(parent) = &definition.parent {
                if !factory.contains_object(parent) {
                    tracing::error!("Definition {} refers to unknown parent {}", name, parent);
                    return Err(CoreError::definition_not_found(parent));
                }
            }
        }

        let required = self.required_properties();
        let keys: Vec<&str> = required.iter().map(String::as_str).collect();
        self.environment.specify_required_properties(&keys)
    }
}
