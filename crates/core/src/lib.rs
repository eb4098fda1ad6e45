pub mod binder;
pub mod bootstrap;
pub mod config;
pub mod config_data;
pub mod container;
pub mod context;
pub mod errors;
pub mod foundation;
pub mod loader;
pub mod logging;
pub mod resources;
pub mod tasks;

// Re-export key types for convenience
pub use binder::{BindResult, Bindable, ObjectConfigPropertyBinder, ObjectType};
pub use bootstrap::default_catalog;
pub use config::{
    ApplicationEnvironment, ApplicationSettings, MapPropertySource, Profile, PropertyResolver,
    PropertySource, PropertySources,
};
pub use config_data::{ConfigDataEnvironmentPostProcessor, ConfigLocation, EnvironmentPostProcessor};
pub use container::{
    ObjectDefinition, ObjectDefinitionPostProcessor, ObjectProvider, ObjectScope,
    RuntimeObjectFactory,
};
pub use context::{
    ApplicationContext, ApplicationContextFactory, ApplicationServer, RunningApplication,
    RuntimeApplicationContextFactory,
};
pub use errors::{CoreError, CoreResult};
pub use foundation::{LifecycleManager, LifecycleState, ObjectRef, Ordered};
pub use loader::{ObjectCatalog, ObjectClassExport, ObjectLoader, ObjectLoadingConfig, ObjectUnit};
pub use logging::{init_logging, LoggingConfig};
pub use tasks::{AsyncTaskManager, TaskStatus};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Framework information
pub const FRAMEWORK_NAME: &str = "mystic";

pub fn version() -> &'static str {
    VERSION
}

pub fn name() -> &'static str {
    FRAMEWORK_NAME
}
