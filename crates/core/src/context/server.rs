use crate::config::{ApplicationEnvironment, ApplicationSettings};
use crate::context::{ApplicationContext, ApplicationContextFactory, ApplicationStartupListener};
use crate::errors::CoreError;
use crate::foundation::sort_by_order;
use crate::loader::kinds::APPLICATION_LISTENER;
use crate::loader::ObjectLoadingConfig;
use std::sync::Arc;

/// A refreshed context and the port the HTTP layer should bind
#[derive(Debug, Clone)]
pub struct RunningApplication {
    pub context: Arc<ApplicationContext>,
    pub port: u16,
}

/// Drives startup: listeners, environment, context, refresh
#[derive(Debug, Default)]
pub struct ApplicationServer;

impl ApplicationServer {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(
        &self,
        factory: &dyn ApplicationContextFactory,
    ) -> Result<RunningApplication, CoreError> {
        tracing::info!("Starting mystic application server");

        let resource_loader = factory.create_resource_loader()?;
        let environment = factory.create_environment()?;
        let context = factory.create_context()?;
        context.set_resource_loader(resource_loader)?;

        let listeners = self.application_run_listeners(&context).await?;
        for listener in &listeners {
            listener.on_application_starting(&context).await?;
        }

        self.prepare_environment(&context, &environment, &listeners)
            .await?;
        self.prepare_context(&context, environment, &listeners)
            .await?;

        let mut port = None;
        context
            .refresh(|ready| port = Some(Self::server_port(ready)))
            .await?;
        let port = port.ok_or_else(|| CoreError::server_startup("context never became ready"))??;

        tracing::info!("Application is ready to serve on port {}", port);
        Ok(RunningApplication { context, port })
    }

    /// Every `applicationListener` of the core namespace, lowest order first
    async fn application_run_listeners(
        &self,
        context: &ApplicationContext,
    ) -> Result<Vec<Arc<dyn ApplicationStartupListener>>, CoreError> {
        let config = ObjectLoadingConfig::new("listeners", APPLICATION_LISTENER);
        let mut exports = context
            .resource_loader()?
            .object_loader()
            .load_object(&config)
            .await?
            .unwrap_or_default();
        sort_by_order(&mut exports);
        tracing::info!("Loaded {} application listeners", exports.len());

        let factory = context.object_factory();
        exports
            .iter()
            .map(|export| export.instantiate_as::<dyn ApplicationStartupListener>(factory.as_ref()))
            .collect()
    }

    async fn prepare_environment(
        &self,
        context: &ApplicationContext,
        environment: &Arc<ApplicationEnvironment>,
        listeners: &[Arc<dyn ApplicationStartupListener>],
    ) -> Result<(), CoreError> {
        environment.attach_property_sources()?;
        for listener in listeners {
            listener.on_environment_prepared(context, environment).await?;
        }
        Ok(())
    }

    async fn prepare_context(
        &self,
        context: &ApplicationContext,
        environment: Arc<ApplicationEnvironment>,
        listeners: &[Arc<dyn ApplicationStartupListener>],
    ) -> Result<(), CoreError> {
        context.set_environment(environment)?;
        context.initialize()?;
        for listener in listeners {
            listener.on_context_prepared(context).await?;
        }
        Ok(())
    }

    fn server_port(context: &ApplicationContext) -> Result<u16, CoreError> {
        let environment = context.environment()?;
        ApplicationSettings::new(&environment).server_port()
    }
}
