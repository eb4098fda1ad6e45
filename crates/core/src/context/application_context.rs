use crate::config::ApplicationEnvironment;
use crate::container::{ObjectDefinitionPostProcessor, RuntimeObjectFactory};
use crate::errors::CoreError;
use crate::foundation::{LifecycleManager, LifecycleState};
use crate::loader::kinds::OBJECT_DEFINITION_POST_PROCESSOR;
use crate::loader::ObjectLoadingConfig;
use crate::resources::ObjectConfigResourceLoader;
use std::sync::{Arc, RwLock};

/// Object name of the environment inside the factory
pub const APPLICATION_ENVIRONMENT_OBJECT: &str = "applicationEnvironment";
/// Object name of the resource loader inside the factory
pub const CONFIG_RESOURCE_LOADER_OBJECT: &str = "configResourceLoader";

/// Runs against a context after its environment is set and before refresh
pub trait ApplicationContextInitializer: Send + Sync {
    fn initialize(&self, context: &ApplicationContext) -> Result<(), CoreError>;
}

/// Publishes the environment and the resource loader as singletons
#[derive(Debug, Default)]
pub struct ObjectConfigReaderInitializer;

impl ApplicationContextInitializer for ObjectConfigReaderInitializer {
    fn initialize(&self, context: &ApplicationContext) -> Result<(), CoreError> {
        let factory = context.object_factory();
        let environment = context.environment()?;
        factory.register_obj_with_supplier(APPLICATION_ENVIRONMENT_OBJECT, || environment)?;

        let resource_loader = context.resource_loader()?;
        factory.register_obj_with_supplier(CONFIG_RESOURCE_LOADER_OBJECT, || resource_loader)?;
        Ok(())
    }
}

/// The container handed to the HTTP layer once it is ready.
///
/// Holds the object factory, the environment and the resource loader. The
/// environment and loader are set during startup and read afterwards.
pub struct ApplicationContext {
    object_factory: Arc<RuntimeObjectFactory>,
    environment: RwLock<Option<Arc<ApplicationEnvironment>>>,
    resource_loader: RwLock<Option<Arc<ObjectConfigResourceLoader>>>,
    factory_processors: Vec<ObjectLoadingConfig>,
    initializers: Vec<Arc<dyn ApplicationContextInitializer>>,
    lifecycle: LifecycleManager,
}

impl ApplicationContext {
    pub fn new(object_factory: Arc<RuntimeObjectFactory>) -> Self {
        Self {
            object_factory,
            environment: RwLock::new(None),
            resource_loader: RwLock::new(None),
            factory_processors: vec![ObjectLoadingConfig::new(
                "processors",
                OBJECT_DEFINITION_POST_PROCESSOR,
            )
            .with_module("bootstrap")],
            initializers: vec![Arc::new(ObjectConfigReaderInitializer)],
            lifecycle: LifecycleManager::new(),
        }
    }

    pub fn with_initializer(mut self, initializer: Arc<dyn ApplicationContextInitializer>) -> Self {
        self.initializers.push(initializer);
        self
    }

    pub fn with_factory_processors(mut self, configs: Vec<ObjectLoadingConfig>) -> Self {
        self.factory_processors = configs;
        self
    }

    pub fn object_factory(&self) -> Arc<RuntimeObjectFactory> {
        Arc::clone(&self.object_factory)
    }

    pub fn environment(&self) -> Result<Arc<ApplicationEnvironment>, CoreError> {
        self.environment
            .read()
            .map_err(|_| CoreError::lock_error("environment"))?
            .clone()
            .ok_or_else(|| CoreError::server_startup("application environment is not set"))
    }

    pub fn set_environment(&self, environment: Arc<ApplicationEnvironment>) -> Result<(), CoreError> {
        *self
            .environment
            .write()
            .map_err(|_| CoreError::lock_error("environment"))? = Some(environment);
        Ok(())
    }

    pub fn resource_loader(&self) -> Result<Arc<ObjectConfigResourceLoader>, CoreError> {
        self.resource_loader
            .read()
            .map_err(|_| CoreError::lock_error("resource_loader"))?
            .clone()
            .ok_or_else(|| CoreError::server_startup("resource loader is not set"))
    }

    /// Set the resource loader; its object loader becomes the factory's
    pub fn set_resource_loader(
        &self,
        resource_loader: Arc<ObjectConfigResourceLoader>,
    ) -> Result<(), CoreError> {
        self.object_factory
            .set_object_loader(resource_loader.object_loader())?;
        *self
            .resource_loader
            .write()
            .map_err(|_| CoreError::lock_error("resource_loader"))? = Some(resource_loader);
        Ok(())
    }

    pub fn factory_processors(&self) -> &[ObjectLoadingConfig] {
        &self.factory_processors
    }

    /// Run every context initializer in registration order
    pub fn initialize(&self) -> Result<(), CoreError> {
        for initializer in &self.initializers {
            initializer.initialize(self)?;
        }
        Ok(())
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_ready(&self) -> bool {
        self.lifecycle.is_ready()
    }

    /// Register processors, post-process definitions, build singletons.
    ///
    /// `on_ready` receives the context once every singleton is built. Any
    /// failure leaves the context in `Failed` and is returned to the caller.
    pub async fn refresh<F>(&self, on_ready: F) -> Result<(), CoreError>
    where
        F: FnOnce(&ApplicationContext),
    {
        self.lifecycle.transition(LifecycleState::Refreshing);
        match self.do_refresh().await {
            Ok(()) => {
                self.lifecycle.transition(LifecycleState::Ready);
                tracing::info!("Application context is ready");
                on_ready(self);
                Ok(())
            }
            Err(e) => {
                self.lifecycle.transition(LifecycleState::Failed);
                tracing::error!("Application context refresh failed: {}", e);
                Err(e)
            }
        }
    }

    async fn do_refresh(&self) -> Result<(), CoreError> {
        self.prepare_object_factory().await?;
        self.post_process_object_factory()?;
        self.object_factory.instantiate_object_singletons()
    }

    async fn prepare_object_factory(&self) -> Result<(), CoreError> {
        if self.factory_processors.is_empty() {
            return Ok(());
        }
        self.object_factory
            .register_objects_with_configs(&self.factory_processors, || {
                tracing::debug!("Object definition post-processors registered");
            })
            .await
    }

    fn post_process_object_factory(&self) -> Result<(), CoreError> {
        let processors = self
            .object_factory
            .get_object_names_for_type(OBJECT_DEFINITION_POST_PROCESSOR);

        for priority in processors.sorted() {
            tracing::debug!("Running definition post-processor {}", priority.name);
            let processor = self
                .object_factory
                .get_object_as::<dyn ObjectDefinitionPostProcessor>(&priority.name)?;
            processor.post_process(&self.object_factory)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("state", &self.state())
            .field("object_factory", &self.object_factory)
            .field("factory_processors", &self.factory_processors)
            .field("initializers", &self.initializers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ObjectProvider;
    use crate::loader::{ObjectCatalog, ObjectClassExport, ObjectUnit};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProcessor {
        seen: Arc<AtomicUsize>,
    }

    impl ObjectDefinitionPostProcessor for CountingProcessor {
        fn post_process(&self, factory: &RuntimeObjectFactory) -> Result<(), CoreError> {
            self.seen
                .store(factory.definition_names().len(), Ordering::SeqCst);
            Ok(())
        }
    }

    fn context_with(catalog: ObjectCatalog) -> ApplicationContext {
        let context = ApplicationContext::new(Arc::new(RuntimeObjectFactory::new()));
        let loader = ObjectConfigResourceLoader::new(Arc::new(catalog), ".");
        context.set_resource_loader(Arc::new(loader)).unwrap();
        context
            .set_environment(Arc::new(ApplicationEnvironment::empty()))
            .unwrap();
        context
    }

    #[tokio::test]
    async fn test_refresh_runs_processors_then_builds_singletons() {
        let seen = Arc::new(AtomicUsize::new(0));
        let processor_seen = Arc::clone(&seen);
        let catalog = ObjectCatalog::new().with_unit(
            "applications/bootstrap/processors",
            ObjectUnit::new().with_exports(
                OBJECT_DEFINITION_POST_PROCESSOR,
                vec![ObjectClassExport::shared::<dyn ObjectDefinitionPostProcessor, _>(
                    "CountingProcessor",
                    move |_| {
                        Ok(Arc::new(CountingProcessor {
                            seen: Arc::clone(&processor_seen),
                        }))
                    },
                )],
            ),
        );

        let context = context_with(catalog);
        context.initialize().unwrap();

        let mut ready = false;
        context.refresh(|_| ready = true).await.unwrap();

        assert!(ready);
        assert!(context.is_ready());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        let factory = context.object_factory();
        assert!(factory.contains_object(APPLICATION_ENVIRONMENT_OBJECT));
        assert!(factory.contains_object(CONFIG_RESOURCE_LOADER_OBJECT));
        assert!(factory.get_singleton("CountingProcessor").is_some());
    }

    #[tokio::test]
    async fn test_failed_refresh_marks_context_failed() {
        let catalog = ObjectCatalog::new().with_unit(
            "applications/bootstrap/processors",
            ObjectUnit::new().with_exports(
                OBJECT_DEFINITION_POST_PROCESSOR,
                vec![ObjectClassExport::of::<u32, _>(|_| {
                    Err(CoreError::configuration("cannot build"))
                })],
            ),
        );
        let context = context_with(catalog);

        let mut ready = false;
        assert!(context.refresh(|_| ready = true).await.is_err());
        assert!(!ready);
        assert_eq!(context.state(), LifecycleState::Failed);
    }

    #[test]
    fn test_missing_environment_is_a_startup_error() {
        let context = ApplicationContext::new(Arc::new(RuntimeObjectFactory::new()));
        assert!(matches!(
            context.environment(),
            Err(CoreError::ServerStartup { .. })
        ));
    }
}
