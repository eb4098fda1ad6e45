use crate::config::ApplicationEnvironment;
use crate::context::ApplicationContext;
use crate::errors::CoreError;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

pub const APP_STARTING: &str = "app_start_starting";
pub const APP_START_ENV_PREPARED: &str = "app_start_env_prepared";
pub const APP_START_CONTEXT_PREPARED: &str = "app_start_context_prepared";

pub trait ApplicationEvent {
    fn event_type(&self) -> &str;

    fn timestamp(&self) -> DateTime<Utc>;
}

/// A startup phase boundary
#[derive(Debug, Clone)]
pub struct ApplicationStartupEvent<'a> {
    event_type: &'static str,
    context: &'a ApplicationContext,
    environment: Option<Arc<ApplicationEnvironment>>,
    timestamp: DateTime<Utc>,
}

impl<'a> ApplicationStartupEvent<'a> {
    pub fn new(event_type: &'static str, context: &'a ApplicationContext) -> Self {
        Self {
            event_type,
            context,
            environment: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_environment(mut self, environment: Arc<ApplicationEnvironment>) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn application_context(&self) -> &'a ApplicationContext {
        self.context
    }

    /// The environment carried by the event, else the context's
    pub fn application_environment(&self) -> Option<Arc<ApplicationEnvironment>> {
        self.environment
            .clone()
            .or_else(|| self.context.environment().ok())
    }
}

impl ApplicationEvent for ApplicationStartupEvent<'_> {
    fn event_type(&self) -> &str {
        self.event_type
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

pub trait ApplicationListener: Send + Sync {
    fn on_application_event(&self, event: &ApplicationStartupEvent<'_>) -> Result<(), CoreError>;

    fn supports_event_type(&self, _event_type: &str) -> bool {
        true
    }
}

/// Fans startup events out to its subscribed listeners, in subscription order
#[derive(Default)]
pub struct ApplicationEventPublisher {
    listeners: RwLock<Vec<Arc<dyn ApplicationListener>>>,
}

impl ApplicationEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, listener: Arc<dyn ApplicationListener>) -> Result<(), CoreError> {
        self.listeners
            .write()
            .map_err(|_| CoreError::lock_error("application_listeners"))?
            .push(listener);
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|l| l.len()).unwrap_or(0)
    }

    pub fn multicast_event(&self, event: &ApplicationStartupEvent<'_>) -> Result<(), CoreError> {
        let listeners = self
            .listeners
            .read()
            .map_err(|_| CoreError::lock_error("application_listeners"))?
            .clone();

        tracing::debug!(
            "Publishing {} to {} listeners",
            event.event_type(),
            listeners.len()
        );
        for listener in listeners
            .iter()
            .filter(|l| l.supports_event_type(event.event_type()))
        {
            listener.on_application_event(event)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApplicationEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationEventPublisher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
