pub mod app_config;
pub mod environment;
pub mod property;
pub mod resolver;
pub mod sources;

pub use app_config::{ApplicationSettings, Profile};
pub use environment::ApplicationEnvironment;
pub use property::ConfigProperty;
pub use resolver::{PropertyResolver, PropertySourcesPropertyResolver};
pub use sources::{
    MapPropertySource, PropertySource, PropertySources, PropertySourcesPropertySource,
    SystemPropertySource,
};
