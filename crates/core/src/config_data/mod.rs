//! Config data pipeline: locations are resolved to files, files are loaded
//! into property sources, and `config.import` entries are followed until no
//! new file turns up.

pub mod contributor;
pub mod importer;
pub mod loader;
pub mod location;
pub mod processor;
pub mod resolver;
pub mod resource;

pub use contributor::{
    ConfigDataContributor, ConfigDataContributorKind, ConfigDataContributors,
    CONFIG_IMPORT_PROPERTY,
};
pub use importer::{ConfigDataImporter, ImportedConfig};
pub use loader::{flatten, JsonPropertySourceLoader, PropertySourceLoader, YamlPropertySourceLoader};
pub use location::ConfigLocation;
pub use processor::{
    ConfigDataEnvironmentPostProcessor, EnvironmentPostProcessor, CONFIG_LOCATION_PROPERTY,
    DEFAULT_CONFIG_LOCATION,
};
pub use resolver::{
    ConfigDataResolver, ConfigDataResolverContext, StandardConfigDataResolver,
    CONFIG_NAME_PROPERTY,
};
pub use resource::ConfigDataResource;
