//! Logical object kinds and the unit names that export them

pub const APPLICATION_LISTENER: &str = "applicationListener";
pub const ENVIRONMENT_POST_PROCESSOR: &str = "environmentPostProcessor";
pub const CONFIG_DATA_RESOLVER: &str = "configDataResolver";
pub const PROPERTY_SOURCE_LOADER: &str = "propertySourceLoader";
pub const OBJECT_BINDER: &str = "objectBinder";
pub const CONFIG_RESOURCE_LOADER: &str = "configResourceLoader";
pub const OBJECT_DEFINITION_POST_PROCESSOR: &str = "objectDefinitionPostProcessor";

const KIND_TABLE: &[(&str, &[&str])] = &[
    (APPLICATION_LISTENER, &["listeners"]),
    (ENVIRONMENT_POST_PROCESSOR, &["processors"]),
    (CONFIG_DATA_RESOLVER, &["config"]),
    (PROPERTY_SOURCE_LOADER, &["config"]),
    (OBJECT_BINDER, &["object_properties"]),
    (CONFIG_RESOURCE_LOADER, &["resource_loader"]),
    (OBJECT_DEFINITION_POST_PROCESSOR, &["processors"]),
];

/// Unit names searched for a kind; unknown kinds have none
pub fn unit_names(kind: &str) -> &'static [&'static str] {
    KIND_TABLE
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, names)| *names)
        .unwrap_or(&[])
}

pub fn known_kinds() -> impl Iterator<Item = &'static str> {
    KIND_TABLE.iter().map(|(kind, _)| *kind)
}
