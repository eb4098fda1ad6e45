use crate::config::sources::{
    PropertySourcesPropertySource, SystemPropertySource, DEFAULT_APP_PROP_SOURCE,
};
use crate::config::{
    Profile, PropertyResolver, PropertySource, PropertySources, PropertySourcesPropertyResolver,
};
use crate::errors::CoreError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Owns the property-source chain and exposes one resolution facade over it
#[derive(Debug)]
pub struct ApplicationEnvironment {
    property_sources: PropertySources,
    resolver: PropertySourcesPropertyResolver,
    profile: Profile,
}

impl ApplicationEnvironment {
    /// Create an environment seeded with the process environment
    pub fn new() -> Self {
        Self::with_system_properties(std::env::vars().collect())
    }

    /// Create an environment whose system source starts from the given snapshot
    pub fn with_system_properties(snapshot: HashMap<String, String>) -> Self {
        let system: Arc<dyn PropertySource> = Arc::new(SystemPropertySource::new(snapshot));
        Self::from_sources(PropertySources::from_sources(vec![system]))
    }

    /// Create an environment with no property sources at all
    pub fn empty() -> Self {
        Self::from_sources(PropertySources::new())
    }

    fn from_sources(property_sources: PropertySources) -> Self {
        Self {
            resolver: PropertySourcesPropertyResolver::new(property_sources.clone()),
            property_sources,
            profile: Profile::from_env(),
        }
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn active_profile(&self) -> &Profile {
        &self.profile
    }

    pub fn property_sources(&self) -> &PropertySources {
        &self.property_sources
    }

    pub fn add_property_source(&self, source: Arc<dyn PropertySource>) -> Result<(), CoreError> {
        tracing::debug!("Adding property source '{}'", source.name());
        self.property_sources.put(source)
    }

    /// Publish the umbrella `applicationProperties` source over the chain
    pub fn attach_property_sources(&self) -> Result<(), CoreError> {
        let umbrella = PropertySourcesPropertySource::new(
            DEFAULT_APP_PROP_SOURCE,
            &self.property_sources,
        );
        self.property_sources.put(Arc::new(umbrella))
    }

    /// Install or clear the transient override consulted before every other source
    pub fn set_attached_source(&self, source: Option<Arc<dyn PropertySource>>) {
        self.resolver.set_attached_source(source);
    }

    /// Fail when any of the given keys does not resolve
    pub fn specify_required_properties(&self, keys: &[&str]) -> Result<(), CoreError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !self.contains_property(key))
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CoreError::MissingRequiredProperties { keys: missing })
        }
    }

    /// Snapshot of the current process environment
    pub fn system_properties(&self) -> HashMap<String, String> {
        std::env::vars().filter(|(_, v)| !v.is_empty()).collect()
    }
}

impl Default for ApplicationEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyResolver for ApplicationEnvironment {
    fn get_property(&self, key: &str) -> Option<Value> {
        self.resolver.get_property(key)
    }

    fn contains_property(&self, key: &str) -> bool {
        self.resolver.contains_property(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::SYSTEM_PROP_SOURCE;
    use crate::config::MapPropertySource;
    use serde_json::json;
    use serial_test::serial;

    fn snapshot(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_environment_has_system_source() {
        let env = ApplicationEnvironment::with_system_properties(snapshot(&[("HOME_DIR", "/x")]));
        assert!(env.property_sources().contains(SYSTEM_PROP_SOURCE));
        assert_eq!(env.get_property("HOME_DIR"), Some(json!("/x")));
    }

    #[test]
    fn test_system_source_wins_fallback_scan() {
        let env = ApplicationEnvironment::with_system_properties(snapshot(&[("server.port", "9000")]));
        env.add_property_source(Arc::new(
            MapPropertySource::new("application.yaml", 10).with_property("server.port", 8080),
        ))
        .unwrap();
        assert_eq!(env.get_string("server.port").as_deref(), Some("9000"));
    }

    #[test]
    fn test_attach_property_sources_adds_umbrella() {
        let env = ApplicationEnvironment::empty();
        env.add_property_source(Arc::new(MapPropertySource::new("a", 10).with_property("k", "a")))
            .unwrap();
        env.attach_property_sources().unwrap();
        assert!(env.property_sources().contains(DEFAULT_APP_PROP_SOURCE));
        assert_eq!(env.get_property("k"), Some(json!("a")));
    }

    #[test]
    fn test_attached_override_beats_umbrella() {
        let env = ApplicationEnvironment::empty();
        env.add_property_source(Arc::new(MapPropertySource::new("a", 10).with_property("k", "a")))
            .unwrap();
        env.attach_property_sources().unwrap();
        env.set_attached_source(Some(Arc::new(
            MapPropertySource::new("cli", 0).with_property("k", "cli"),
        )));
        assert_eq!(env.get_property("k"), Some(json!("cli")));
    }

    #[test]
    fn test_specify_required_properties() {
        let env = ApplicationEnvironment::empty();
        env.add_property_source(Arc::new(MapPropertySource::new("a", 10).with_property("k", "v")))
            .unwrap();
        assert!(env.specify_required_properties(&["k"]).is_ok());
        match env.specify_required_properties(&["k", "missing.one"]) {
            Err(CoreError::MissingRequiredProperties { keys }) => {
                assert_eq!(keys, vec!["missing.one".to_string()]);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_system_source_falls_back_to_process_env() {
        std::env::set_var("MYSTIC_ENV_FALLBACK_TEST", "late");
        let env = ApplicationEnvironment::with_system_properties(HashMap::new());
        assert_eq!(env.get_string("MYSTIC_ENV_FALLBACK_TEST").as_deref(), Some("late"));

        // cached on first hit
        std::env::remove_var("MYSTIC_ENV_FALLBACK_TEST");
        assert_eq!(env.get_string("MYSTIC_ENV_FALLBACK_TEST").as_deref(), Some("late"));
    }
}
