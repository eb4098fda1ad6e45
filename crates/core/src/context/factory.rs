use crate::config::{ApplicationEnvironment, Profile};
use crate::container::RuntimeObjectFactory;
use crate::context::ApplicationContext;
use crate::errors::CoreError;
use crate::loader::ObjectCatalog;
use crate::resources::ObjectConfigResourceLoader;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

/// Creates the pieces the server assembles at startup
pub trait ApplicationContextFactory: Send + Sync {
    fn create_environment(&self) -> Result<Arc<ApplicationEnvironment>, CoreError>;

    /// The context; repeated calls return the same instance
    fn create_context(&self) -> Result<Arc<ApplicationContext>, CoreError>;

    fn create_resource_loader(&self) -> Result<Arc<ObjectConfigResourceLoader>, CoreError>;
}

/// Builds everything from a registration table and a resource root
pub struct RuntimeApplicationContextFactory {
    catalog: Arc<ObjectCatalog>,
    root: PathBuf,
    system_properties: Option<HashMap<String, String>>,
    profile: Option<Profile>,
    context: OnceLock<Arc<ApplicationContext>>,
}

impl RuntimeApplicationContextFactory {
    pub fn new(catalog: Arc<ObjectCatalog>, root: impl Into<PathBuf>) -> Self {
        Self {
            catalog,
            root: root.into(),
            system_properties: None,
            profile: None,
            context: OnceLock::new(),
        }
    }

    /// Seed the system source from a snapshot instead of the process environment
    pub fn with_system_properties(mut self, snapshot: HashMap<String, String>) -> Self {
        self.system_properties = Some(snapshot);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn catalog(&self) -> &Arc<ObjectCatalog> {
        &self.catalog
    }
}

impl ApplicationContextFactory for RuntimeApplicationContextFactory {
    fn create_environment(&self) -> Result<Arc<ApplicationEnvironment>, CoreError> {
        let environment = match &self.system_properties {
            Some(snapshot) => ApplicationEnvironment::with_system_properties(snapshot.clone()),
            None => ApplicationEnvironment::new(),
        };
        let environment = match &self.profile {
            Some(profile) => environment.with_profile(profile.clone()),
            None => environment,
        };
        tracing::debug!("Created environment for profile {}", environment.active_profile());
        Ok(Arc::new(environment))
    }

    fn create_context(&self) -> Result<Arc<ApplicationContext>, CoreError> {
        let context = self.context.get_or_init(|| {
            Arc::new(ApplicationContext::new(Arc::new(RuntimeObjectFactory::new())))
        });
        Ok(Arc::clone(context))
    }

    fn create_resource_loader(&self) -> Result<Arc<ObjectConfigResourceLoader>, CoreError> {
        Ok(Arc::new(ObjectConfigResourceLoader::new(
            Arc::clone(&self.catalog),
            self.root.clone(),
        )))
    }
}

impl std::fmt::Debug for RuntimeApplicationContextFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeApplicationContextFactory")
            .field("root", &self.root)
            .field("units", &self.catalog.len())
            .field("profile", &self.profile)
            .finish()
    }
}
