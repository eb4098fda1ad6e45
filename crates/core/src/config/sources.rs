use crate::config::ConfigProperty;
use crate::errors::CoreError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, Weak};

/// Name of the umbrella source that iterates over every other source
pub const DEFAULT_APP_PROP_SOURCE: &str = "applicationProperties";
/// Name of the process environment source
pub const SYSTEM_PROP_SOURCE: &str = "systemProperties";

/// Order given to sources loaded from configuration files
pub const APP_PROP_SOURCE_ORDER: i32 = 10;
/// Order of the system properties source, the highest precedence of the fallback scan
pub const APP_SYS_SOURCE_ORDER: i32 = 1;

/// A named, ordered provider of key-value configuration data
pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    /// Lower order means higher precedence in the fallback scan
    fn order(&self) -> i32;

    fn get_property(&self, property: &ConfigProperty) -> Option<Value>;

    fn contains_property(&self, property: &ConfigProperty) -> bool {
        self.get_property(property).is_some()
    }

    fn property_names(&self) -> Vec<String>;
}

impl std::fmt::Debug for dyn PropertySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySource")
            .field("name", &self.name())
            .field("order", &PropertySource::order(self))
            .finish()
    }
}

/// `null` and empty strings count as unset
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Render a property value the way it would appear in a flat config file
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// In-memory property source backed by a flat key map
#[derive(Debug, Clone)]
pub struct MapPropertySource {
    name: String,
    order: i32,
    values: BTreeMap<String, Value>,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>, order: i32) -> Self {
        Self {
            name: name.into(),
            order,
            values: BTreeMap::new(),
        }
    }

    pub fn from_map(name: impl Into<String>, order: i32, values: BTreeMap<String, Value>) -> Self {
        Self {
            name: name.into(),
            order,
            values,
        }
    }

    /// Add a property, builder style
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn get_property(&self, property: &ConfigProperty) -> Option<Value> {
        if property.is_empty() {
            return None;
        }
        self.values.get(property.full_name()).cloned()
    }

    fn contains_property(&self, property: &ConfigProperty) -> bool {
        !property.is_empty() && self.values.contains_key(property.full_name())
    }

    fn property_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Process environment source with a write-through cache of environment hits
#[derive(Debug)]
pub struct SystemPropertySource {
    name: String,
    values: RwLock<HashMap<String, String>>,
}

impl SystemPropertySource {
    pub fn new(snapshot: HashMap<String, String>) -> Self {
        Self {
            name: SYSTEM_PROP_SOURCE.to_string(),
            values: RwLock::new(snapshot),
        }
    }

    /// Seed the backing map from the current process environment
    pub fn from_env() -> Self {
        Self::new(std::env::vars().collect())
    }

    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(value) = self.values.read().ok()?.get(key) {
            return Some(value.clone());
        }

        let value = std::env::var(key).ok().filter(|v| !v.is_empty())?;
        if let Ok(mut values) = self.values.write() {
            values.entry(key.to_string()).or_insert_with(|| value.clone());
        }
        tracing::debug!("Cached environment variable '{}' in {}", key, self.name);
        Some(value)
    }
}

impl PropertySource for SystemPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        APP_SYS_SOURCE_ORDER
    }

    fn get_property(&self, property: &ConfigProperty) -> Option<Value> {
        if property.is_empty() {
            return None;
        }
        self.lookup(property.full_name()).map(Value::String)
    }

    fn property_names(&self) -> Vec<String> {
        self.values
            .read()
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default()
    }
}

type SourceList = RwLock<Vec<Arc<dyn PropertySource>>>;

/// The environment's name-keyed chain of property sources.
///
/// Cloning shares the underlying chain. Sources keep their insertion position;
/// `put` on an existing name replaces the source in place.
#[derive(Clone, Default)]
pub struct PropertySources {
    inner: Arc<SourceList>,
}

impl PropertySources {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding the given sources in insertion order
    pub fn from_sources(sources: Vec<Arc<dyn PropertySource>>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sources)),
        }
    }

    /// Insert or replace a source by name
    pub fn put(&self, source: Arc<dyn PropertySource>) -> Result<(), CoreError> {
        let mut sources = self
            .inner
            .write()
            .map_err(|_| CoreError::lock_error("property_sources"))?;

        match sources.iter().position(|s| s.name() == source.name()) {
            Some(index) => sources[index] = source,
            None => sources.push(source),
        }
        Ok(())
    }

    /// Insert a source only when no source of that name exists yet
    pub fn put_if_absent(&self, source: Arc<dyn PropertySource>) -> Result<bool, CoreError> {
        let mut sources = self
            .inner
            .write()
            .map_err(|_| CoreError::lock_error("property_sources"))?;

        if sources.iter().any(|s| s.name() == source.name()) {
            return Ok(false);
        }
        sources.push(source);
        Ok(true)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PropertySource>> {
        self.inner
            .read()
            .ok()?
            .iter()
            .find(|s| s.name() == name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<dyn PropertySource>> {
        let mut sources = self.inner.write().ok()?;
        let index = sources.iter().position(|s| s.name() == name)?;
        Some(sources.remove(index))
    }

    /// Snapshot in insertion order
    pub fn to_list(&self) -> Vec<Arc<dyn PropertySource>> {
        self.inner
            .read()
            .map(|sources| sources.clone())
            .unwrap_or_default()
    }

    /// Snapshot sorted ascending by declared order
    pub fn sorted(&self) -> Vec<Arc<dyn PropertySource>> {
        let mut sources = self.to_list();
        sources.sort_by_key(|s| PropertySource::order(s.as_ref()));
        sources
    }

    pub fn names(&self) -> Vec<String> {
        self.to_list().iter().map(|s| s.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|sources| sources.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn downgrade(&self) -> Weak<SourceList> {
        Arc::downgrade(&self.inner)
    }
}

impl std::fmt::Debug for PropertySources {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertySources")
            .field("names", &self.names())
            .finish()
    }
}

/// Virtual source over every other source in the chain it is attached to
pub struct PropertySourcesPropertySource {
    name: String,
    sources: Weak<SourceList>,
}

impl PropertySourcesPropertySource {
    pub fn new(name: impl Into<String>, sources: &PropertySources) -> Self {
        Self {
            name: name.into(),
            sources: sources.downgrade(),
        }
    }

    fn delegates(&self) -> Vec<Arc<dyn PropertySource>> {
        let Some(list) = self.sources.upgrade() else {
            return Vec::new();
        };
        let mut delegates: Vec<_> = match list.read() {
            Ok(sources) => sources
                .iter()
                .filter(|s| s.name() != self.name)
                .cloned()
                .collect(),
            Err(_) => return Vec::new(),
        };
        delegates.sort_by_key(|s| PropertySource::order(s.as_ref()));
        delegates
    }
}

impl PropertySource for PropertySourcesPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i32 {
        i32::MIN
    }

    fn get_property(&self, property: &ConfigProperty) -> Option<Value> {
        if property.is_empty() {
            return None;
        }
        self.delegates()
            .iter()
            .filter_map(|source| source.get_property(property))
            .find(is_present)
    }

    fn property_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .delegates()
            .iter()
            .flat_map(|source| source.property_names())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
