use crate::config::sources::{is_present, value_to_string, DEFAULT_APP_PROP_SOURCE};
use crate::config::{ConfigProperty, PropertySource, PropertySources};
use serde_json::Value;
use std::sync::{Arc, RwLock};

/// Single property-resolution facade over a source chain
pub trait PropertyResolver: Send + Sync {
    fn get_property(&self, key: &str) -> Option<Value>;

    fn contains_property(&self, key: &str) -> bool;

    /// Resolve a property rendered as a string
    fn get_string(&self, key: &str) -> Option<String> {
        self.get_property(key).map(|value| value_to_string(&value))
    }
}

/// Three-tier resolver: attached override, then the umbrella source, then an
/// ascending-order scan of every source.
pub struct PropertySourcesPropertyResolver {
    sources: PropertySources,
    attached: RwLock<Option<Arc<dyn PropertySource>>>,
}

impl PropertySourcesPropertyResolver {
    pub fn new(sources: PropertySources) -> Self {
        Self {
            sources,
            attached: RwLock::new(None),
        }
    }

    /// Install or clear the transient override source
    pub fn set_attached_source(&self, source: Option<Arc<dyn PropertySource>>) {
        if let Ok(mut attached) = self.attached.write() {
            *attached = source;
        }
    }

    pub fn attached_source(&self) -> Option<Arc<dyn PropertySource>> {
        self.attached.read().ok().and_then(|attached| attached.clone())
    }

    pub fn resolve(&self, property: &ConfigProperty) -> Option<Value> {
        if property.is_empty() {
            return None;
        }

        if let Some(attached) = self.attached_source() {
            if attached.contains_property(property) {
                return attached.get_property(property);
            }
        }

        if let Some(umbrella) = self.sources.get(DEFAULT_APP_PROP_SOURCE) {
            if umbrella.contains_property(property) {
                return umbrella.get_property(property);
            }
        }

        self.sources
            .sorted()
            .iter()
            .filter(|source| source.name() != DEFAULT_APP_PROP_SOURCE)
            .filter_map(|source| source.get_property(property))
            .find(is_present)
    }
}

impl PropertyResolver for PropertySourcesPropertyResolver {
    fn get_property(&self, key: &str) -> Option<Value> {
        self.resolve(&ConfigProperty::parse(key))
    }

    fn contains_property(&self, key: &str) -> bool {
        self.get_property(key).is_some()
    }
}

impl std::fmt::Debug for PropertySourcesPropertyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySourcesPropertyResolver")
            .field("sources", &self.sources)
            .field("attached", &self.attached_source().map(|s| s.name().to_string()))
            .finish()
    }
}
