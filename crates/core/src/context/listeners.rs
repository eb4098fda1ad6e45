use crate::config::{ApplicationEnvironment, ApplicationSettings};
use crate::config_data::EnvironmentPostProcessor;
use crate::context::events::{
    ApplicationEvent, ApplicationEventPublisher, ApplicationListener, ApplicationStartupEvent,
    APP_STARTING, APP_START_CONTEXT_PREPARED, APP_START_ENV_PREPARED,
};
use crate::context::ApplicationContext;
use crate::errors::CoreError;
use crate::foundation::sort_by_order;
use crate::loader::kinds::ENVIRONMENT_POST_PROCESSOR;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Hooks invoked at each startup phase boundary
#[async_trait]
pub trait ApplicationStartupListener: Send + Sync {
    async fn on_application_starting(&self, _context: &ApplicationContext) -> Result<(), CoreError> {
        Ok(())
    }

    async fn on_environment_prepared(
        &self,
        _context: &ApplicationContext,
        _environment: &Arc<ApplicationEnvironment>,
    ) -> Result<(), CoreError> {
        Ok(())
    }

    async fn on_context_prepared(&self, _context: &ApplicationContext) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Loads every environment post-processor and runs it, lowest order first
#[derive(Debug, Default)]
pub struct EnvironmentPostProcessListener;

#[async_trait]
impl ApplicationStartupListener for EnvironmentPostProcessListener {
    async fn on_environment_prepared(
        &self,
        context: &ApplicationContext,
        environment: &Arc<ApplicationEnvironment>,
    ) -> Result<(), CoreError> {
        let mut exports = context
            .resource_loader()?
            .get_resources(ENVIRONMENT_POST_PROCESSOR)
            .await?;
        sort_by_order(&mut exports);

        let factory = context.object_factory();
        for export in &exports {
            tracing::debug!("Running environment post-processor {}", export.object_name());
            let processor = export.instantiate_as::<dyn EnvironmentPostProcessor>(factory.as_ref())?;
            processor.post_process_environment(context, environment).await?;
        }
        Ok(())
    }
}

/// Republishes the startup hooks as events on its publisher
#[derive(Debug)]
pub struct ApplicationEventPublishListener {
    publisher: ApplicationEventPublisher,
}

impl ApplicationEventPublishListener {
    /// A publisher with the bootstrap listener already subscribed
    pub fn new() -> Result<Self, CoreError> {
        let publisher = ApplicationEventPublisher::new();
        publisher.add_listener(Arc::new(BootstrapApplicationListener::new()))?;
        Ok(Self { publisher })
    }

    pub fn with_publisher(publisher: ApplicationEventPublisher) -> Self {
        Self { publisher }
    }

    pub fn publisher(&self) -> &ApplicationEventPublisher {
        &self.publisher
    }
}

#[async_trait]
impl ApplicationStartupListener for ApplicationEventPublishListener {
    async fn on_application_starting(&self, context: &ApplicationContext) -> Result<(), CoreError> {
        self.publisher
            .multicast_event(&ApplicationStartupEvent::new(APP_STARTING, context))
    }

    async fn on_environment_prepared(
        &self,
        context: &ApplicationContext,
        environment: &Arc<ApplicationEnvironment>,
    ) -> Result<(), CoreError> {
        let event = ApplicationStartupEvent::new(APP_START_ENV_PREPARED, context)
            .with_environment(Arc::clone(environment));
        self.publisher.multicast_event(&event)
    }

    async fn on_context_prepared(&self, context: &ApplicationContext) -> Result<(), CoreError> {
        self.publisher
            .multicast_event(&ApplicationStartupEvent::new(APP_START_CONTEXT_PREPARED, context))
    }
}

/// Observes startup events when `application.bootstrap.enabled` is set
#[derive(Debug, Default)]
pub struct BootstrapApplicationListener {
    handled: AtomicUsize,
}

impl BootstrapApplicationListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events seen while bootstrap was enabled
    pub fn handled_count(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }

    fn bootstrap_enabled(&self, event: &ApplicationStartupEvent<'_>) -> bool {
        event
            .application_environment()
            .map(|environment| ApplicationSettings::new(&environment).bootstrap_enabled())
            .unwrap_or(false)
    }
}

impl ApplicationListener for BootstrapApplicationListener {
    fn on_application_event(&self, event: &ApplicationStartupEvent<'_>) -> Result<(), CoreError> {
        if !self.bootstrap_enabled(event) {
            return Ok(());
        }
        self.handled.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Bootstrap observed {} at {}", event.event_type(), event.timestamp());
        Ok(())
    }
}
