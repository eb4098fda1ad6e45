//! Application context, startup listeners and the server entry point

pub mod application_context;
pub mod events;
pub mod factory;
pub mod listeners;
pub mod server;

pub use application_context::{
    ApplicationContext, ApplicationContextInitializer, ObjectConfigReaderInitializer,
    APPLICATION_ENVIRONMENT_OBJECT, CONFIG_RESOURCE_LOADER_OBJECT,
};
pub use events::{
    ApplicationEvent, ApplicationEventPublisher, ApplicationListener, ApplicationStartupEvent,
};
pub use factory::{ApplicationContextFactory, RuntimeApplicationContextFactory};
pub use listeners::{
    ApplicationEventPublishListener, ApplicationStartupListener, BootstrapApplicationListener,
    EnvironmentPostProcessListener,
};
pub use server::{ApplicationServer, RunningApplication};
