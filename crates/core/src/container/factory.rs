use crate::container::{
    downcast_object, object_ref, ObjectDefinition, ObjectPriority, ObjectPriorityMap,
    ObjectProvider,
};
use crate::errors::CoreError;
use crate::foundation::ObjectRef;
use crate::loader::{ObjectClassExport, ObjectLoader, ObjectLoadingConfig};
use crate::tasks::AsyncTaskManager;
use futures::future::BoxFuture;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// A definition post-processor inspects the full definition set before any
/// singleton is built
pub trait ObjectDefinitionPostProcessor: Send + Sync {
    fn post_process(&self, factory: &RuntimeObjectFactory) -> Result<(), CoreError>;
}

#[derive(Debug, Default)]
struct DefinitionRegistry {
    by_name: HashMap<String, ObjectDefinition>,
    names: Vec<String>,
}

/// The object registry: definitions, early singletons and singletons.
///
/// A name moves from defined to early (constructed, initializer pending) to
/// singleton. Locks are released before any constructor or initializer runs,
/// so constructors may resolve other objects through the factory.
pub struct RuntimeObjectFactory {
    object_loader: RwLock<Option<Arc<dyn ObjectLoader>>>,
    loading_configs: RwLock<Vec<ObjectLoadingConfig>>,
    definitions: RwLock<DefinitionRegistry>,
    singletons: RwLock<HashMap<String, ObjectRef>>,
    early_singletons: RwLock<HashMap<String, ObjectRef>>,
    in_creation: RwLock<HashSet<String>>,
}

impl RuntimeObjectFactory {
    pub fn new() -> Self {
        Self {
            object_loader: RwLock::new(None),
            loading_configs: RwLock::new(Vec::new()),
            definitions: RwLock::new(DefinitionRegistry::default()),
            singletons: RwLock::new(HashMap::new()),
            early_singletons: RwLock::new(HashMap::new()),
            in_creation: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_loader(loader: Arc<dyn ObjectLoader>) -> Self {
        let factory = Self::new();
        if let Ok(mut slot) = factory.object_loader.write() {
            *slot = Some(loader);
        }
        factory
    }

    pub fn set_object_loader(&self, loader: Arc<dyn ObjectLoader>) -> Result<(), CoreError> {
        let mut slot = self
            .object_loader
            .write()
            .map_err(|_| CoreError::lock_error("object_loader"))?;
        *slot = Some(loader);
        Ok(())
    }

    pub fn object_loader(&self) -> Option<Arc<dyn ObjectLoader>> {
        self.object_loader.read().ok()?.clone()
    }

    /// Configs passed to `register_objects_with_configs` so far
    pub fn loading_configs(&self) -> Vec<ObjectLoadingConfig> {
        self.loading_configs
            .read()
            .map(|configs| configs.clone())
            .unwrap_or_default()
    }

    /// Load every config as one batch and register the exported definitions.
    ///
    /// `on_complete` runs once all loads finished. A unit the loader cannot
    /// find contributes nothing; a duplicate name fails the batch.
    pub async fn register_objects_with_configs<C>(
        &self,
        configs: &[ObjectLoadingConfig],
        on_complete: C,
    ) -> Result<(), CoreError>
    where
        C: FnOnce(),
    {
        let loader = self
            .object_loader()
            .ok_or_else(|| CoreError::server_startup("object loader is not ready"))?;

        let mut manager = AsyncTaskManager::new();
        for config in configs {
            self.loading_configs
                .write()
                .map_err(|_| CoreError::lock_error("loading_configs"))?
                .push(config.clone());

            let loader = Arc::clone(&loader);
            let owned = config.clone();
            let future: BoxFuture<'_, Result<Option<Vec<ObjectClassExport>>, CoreError>> =
                Box::pin(async move { loader.load_object(&owned).await });

            let object_type = config.object_type.clone();
            manager.add_task(config.to_string(), future, move |exports| {
                self.register_exports(&object_type, exports.unwrap_or_default())
            })?;
        }

        manager
            .start(on_complete, |e| {
                tracing::error!("Object registration batch failed: {}", e);
            })
            .await
    }

    fn register_exports(
        &self,
        object_type: &str,
        exports: Vec<ObjectClassExport>,
    ) -> Result<(), CoreError> {
        for export in exports {
            self.register_obj_definition(ObjectDefinition::from_export(export, object_type))?;
        }
        Ok(())
    }

    pub fn register_obj_definition(&self, definition: ObjectDefinition) -> Result<(), CoreError> {
        let mut definitions = self
            .definitions
            .write()
            .map_err(|_| CoreError::lock_error("object_definitions"))?;

        if definitions.by_name.contains_key(&definition.class_name) {
            return Err(CoreError::duplicate_definition(&definition.class_name));
        }

        tracing::debug!(
            "Registered definition {} of type {}",
            definition.class_name,
            definition.object_type
        );
        definitions.names.push(definition.class_name.clone());
        definitions
            .by_name
            .insert(definition.class_name.clone(), definition);
        Ok(())
    }

    /// Materialize a singleton right away from an eager supplier
    pub fn register_obj_with_supplier<S, F>(&self, name: &str, supplier: F) -> Result<(), CoreError>
    where
        S: ?Sized + Send + Sync + 'static,
        F: FnOnce() -> Arc<S>,
    {
        self.register_singleton(name, object_ref(supplier()))
    }

    pub fn register_singleton(&self, name: &str, object: ObjectRef) -> Result<(), CoreError> {
        let mut singletons = self
            .singletons
            .write()
            .map_err(|_| CoreError::lock_error("singleton_objects"))?;
        if singletons.contains_key(name) {
            tracing::warn!("Singleton object {} exists and will be overwritten", name);
        }
        singletons.insert(name.to_string(), object);
        Ok(())
    }

    /// A fully built singleton, else an early one
    pub fn get_singleton(&self, name: &str) -> Option<ObjectRef> {
        if let Some(object) = self.singletons.read().ok()?.get(name) {
            return Some(Arc::clone(object));
        }
        self.early_singletons.read().ok()?.get(name).cloned()
    }

    pub fn get_obj_definition(&self, name: &str) -> Option<ObjectDefinition> {
        self.definitions.read().ok()?.by_name.get(name).cloned()
    }

    pub fn contains_definition(&self, name: &str) -> bool {
        self.definitions
            .read()
            .map(|definitions| definitions.by_name.contains_key(name))
            .unwrap_or(false)
    }

    /// Definition names in registration order
    pub fn definition_names(&self) -> Vec<String> {
        self.definitions
            .read()
            .map(|definitions| definitions.names.clone())
            .unwrap_or_default()
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Every definition of the given declared type, in registration order
    pub fn get_object_names_for_type(&self, object_type: &str) -> ObjectPriorityMap {
        let mut objects = ObjectPriorityMap::new();
        let Ok(definitions) = self.definitions.read() else {
            return objects;
        };
        for name in &definitions.names {
            if let Some(definition) = definitions.by_name.get(name) {
                if definition.object_type == object_type {
                    objects.put(ObjectPriority {
                        name: definition.class_name.clone(),
                        object_type: definition.object_type.clone(),
                        order: definition.order(),
                    });
                }
            }
        }
        objects
    }

    /// Typed lookup; the object must have been stored as `Arc<S>`
    pub fn get_object_as<S>(&self, name: &str) -> Result<Arc<S>, CoreError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        downcast_object(name, &self.get_object(name)?)
    }

    /// Build one singleton; a definition with nothing to build from is an error
    pub fn instantiate_object_singleton(&self, name: &str) -> Result<(), CoreError> {
        let definition = self
            .get_obj_definition(name)
            .ok_or_else(|| CoreError::definition_not_found(name))?;

        if !definition.scope.is_singleton() || self.has_singleton(name) {
            return Ok(());
        }
        self.create_singleton(&definition).map(|_| ())
    }

    /// Build every singleton definition; definitions that cannot be built are skipped
    pub fn instantiate_object_singletons(&self) -> Result<(), CoreError> {
        let names = self.definition_names();
        tracing::info!("Instantiating singletons from {} definitions", names.len());

        for name in names {
            let Some(definition) = self.get_obj_definition(&name) else {
                continue;
            };
            if !definition.class_definition.is_resolvable() {
                tracing::warn!("Definition {} has no constructor, skipping", name);
                continue;
            }
            if !definition.scope.is_singleton() || self.has_singleton(&name) {
                continue;
            }
            self.create_singleton(&definition)?;
        }
        Ok(())
    }

    fn has_singleton(&self, name: &str) -> bool {
        self.singletons
            .read()
            .map(|singletons| singletons.contains_key(name))
            .unwrap_or(false)
    }

    fn create_singleton(&self, definition: &ObjectDefinition) -> Result<ObjectRef, CoreError> {
        let name = definition.class_name.as_str();
        let _guard = CreationGuard::enter(&self.in_creation, name)?;

        let object = self.construct(definition)?;
        self.early_singletons
            .write()
            .map_err(|_| CoreError::lock_error("early_singleton_objects"))?
            .insert(name.to_string(), Arc::clone(&object));

        let initialized = self.initialize(definition, &object);
        self.early_singletons
            .write()
            .map_err(|_| CoreError::lock_error("early_singleton_objects"))?
            .remove(name);
        initialized?;

        self.singletons
            .write()
            .map_err(|_| CoreError::lock_error("singleton_objects"))?
            .insert(name.to_string(), Arc::clone(&object));
        tracing::debug!("Instantiated singleton {}", name);
        Ok(object)
    }

    fn create_prototype(&self, definition: &ObjectDefinition) -> Result<ObjectRef, CoreError> {
        let _guard = CreationGuard::enter(&self.in_creation, &definition.class_name)?;
        let object = self.construct(definition)?;
        self.initialize(definition, &object)?;
        Ok(object)
    }

    fn construct(&self, definition: &ObjectDefinition) -> Result<ObjectRef, CoreError> {
        definition.class_definition.instantiate(self)
    }

    fn initialize(&self, definition: &ObjectDefinition, object: &ObjectRef) -> Result<(), CoreError> {
        match &definition.class_definition.initializer {
            Some(initializer) => initializer(object, self),
            None => Ok(()),
        }
    }
}

impl ObjectProvider for RuntimeObjectFactory {
    /// Singleton, else early singleton, else build from the definition
    fn get_object(&self, name: &str) -> Result<ObjectRef, CoreError> {
        if let Some(object) = self.get_singleton(name) {
            return Ok(object);
        }

        let definition = self
            .get_obj_definition(name)
            .ok_or_else(|| CoreError::definition_not_found(name))?;

        if definition.scope.is_prototype() {
            return self.create_prototype(&definition);
        }
        self.create_singleton(&definition)
    }

    fn contains_object(&self, name: &str) -> bool {
        self.get_singleton(name).is_some() || self.contains_definition(name)
    }
}

impl Default for RuntimeObjectFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeObjectFactory")
            .field("definitions", &self.definition_names())
            .field("singletons", &self.singleton_count())
            .finish()
    }
}

/// Marks a name as under construction until dropped
struct CreationGuard<'a> {
    in_creation: &'a RwLock<HashSet<String>>,
    name: String,
}

impl<'a> CreationGuard<'a> {
    fn enter(in_creation: &'a RwLock<HashSet<String>>, name: &str) -> Result<Self, CoreError> {
        let mut names = in_creation
            .write()
            .map_err(|_| CoreError::lock_error("objects_in_creation"))?;
        if !names.insert(name.to_string()) {
            return Err(CoreError::ObjectCurrentlyInCreation {
                name: name.to_string(),
            });
        }
        Ok(Self {
            in_creation,
            name: name.to_string(),
        })
    }
}

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut names) = self.in_creation.write() {
            names.remove(&self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ObjectScope;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        value: usize,
    }

    fn counter_export(name: &str, calls: Arc<AtomicUsize>) -> ObjectClassExport {
        ObjectClassExport::of(move |_| {
            let value = calls.fetch_add(1, Ordering::SeqCst);
            Ok(Counter { value })
        })
        .with_id(name)
    }

    #[test]
    fn test_duplicate_definition_keeps_first() {
        let factory = RuntimeObjectFactory::new();
        let calls = Arc::new(AtomicUsize::new(0));
        factory
            .register_obj_definition(ObjectDefinition::new(
                "Counter",
                "service",
                counter_export("Counter", Arc::clone(&calls)),
            ))
            .unwrap();

        let err = factory
            .register_obj_definition(ObjectDefinition::new(
                "Counter",
                "other",
                ObjectClassExport::unresolved("Counter"),
            ))
            .unwrap_err();
        assert!(matches!(err, CoreError::ObjectDefinitionDuplicate { .. }));
        assert_eq!(
            factory.get_obj_definition("Counter").unwrap().object_type,
            "service"
        );
    }

    #[test]
    fn test_lookup_before_register_fails() {
        let factory = RuntimeObjectFactory::new();
        assert!(matches!(
            factory.get_object("missing"),
            Err(CoreError::ObjectDefinitionNotFound { .. })
        ));
        assert!(matches!(
            factory.instantiate_object_singleton("missing"),
            Err(CoreError::ObjectDefinitionNotFound { .. })
        ));
    }

    #[test]
    fn test_singleton_is_cached_and_prototype_is_not() {
        let factory = RuntimeObjectFactory::new();
        let singleton_calls = Arc::new(AtomicUsize::new(0));
        let prototype_calls = Arc::new(AtomicUsize::new(0));
        factory
            .register_obj_definition(ObjectDefinition::new(
                "single",
                "service",
                counter_export("single", Arc::clone(&singleton_calls)),
            ))
            .unwrap();
        factory
            .register_obj_definition(
                ObjectDefinition::new(
                    "proto",
                    "service",
                    counter_export("proto", Arc::clone(&prototype_calls)),
                )
                .with_scope(ObjectScope::Prototype),
            )
            .unwrap();

        factory.get_object_as::<Counter>("single").unwrap();
        factory.get_object_as::<Counter>("single").unwrap();
        assert_eq!(singleton_calls.load(Ordering::SeqCst), 1);

        let first = factory.get_object_as::<Counter>("proto").unwrap();
        let second = factory.get_object_as::<Counter>("proto").unwrap();
        assert_eq!((first.value, second.value), (0, 1));

        factory.instantiate_object_singletons().unwrap();
        assert_eq!(factory.singleton_count(), 1);
    }

    #[test]
    fn test_constructor_resolves_dependencies_by_name() {
        struct Repository;
        struct Service {
            repository: Arc<Repository>,
        }

        let factory = RuntimeObjectFactory::new();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "service",
                "service",
                ObjectClassExport::of(|provider| {
                    Ok(Service {
                        repository: provider.get_object_as::<Repository>("repository")?,
                    })
                }),
            ))
            .unwrap();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "repository",
                "repository",
                ObjectClassExport::of(|_| Ok(Repository)),
            ))
            .unwrap();

        let service = factory.get_object_as::<Service>("service").unwrap();
        let repository = factory.get_object_as::<Repository>("repository").unwrap();
        assert!(Arc::ptr_eq(&service.repository, &repository));
    }

    #[test]
    fn test_reentrant_construction_is_rejected() {
        let factory = RuntimeObjectFactory::new();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "selfish",
                "service",
                ObjectClassExport::of(|provider| {
                    provider.get_object("selfish")?;
                    Ok(())
                }),
            ))
            .unwrap();

        assert!(matches!(
            factory.get_object("selfish"),
            Err(CoreError::ObjectCurrentlyInCreation { .. })
        ));
        assert!(factory.in_creation.read().unwrap().is_empty());
        assert_eq!(factory.singleton_count(), 0);
    }

    #[test]
    fn test_early_singleton_breaks_initializer_cycle() {
        struct Parent;
        struct Child {
            parent: Arc<Parent>,
        }

        let factory = RuntimeObjectFactory::new();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "parent",
                "service",
                ObjectClassExport::of(|_| Ok(Parent)).with_initializer(|_, provider| {
                    provider.get_object("child").map(|_| ())
                }),
            ))
            .unwrap();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "child",
                "service",
                ObjectClassExport::of(|provider| {
                    Ok(Child {
                        parent: provider.get_object_as::<Parent>("parent")?,
                    })
                }),
            ))
            .unwrap();

        factory.instantiate_object_singleton("parent").unwrap();
        let child = factory.get_object_as::<Child>("child").unwrap();
        let parent = factory.get_object_as::<Parent>("parent").unwrap();
        assert!(Arc::ptr_eq(&child.parent, &parent));
    }

    #[test]
    fn test_bulk_skips_unresolvable_but_single_path_errors() {
        let factory = RuntimeObjectFactory::new();
        factory
            .register_obj_definition(ObjectDefinition::new(
                "Ghost",
                "service",
                ObjectClassExport::unresolved("Ghost"),
            ))
            .unwrap();

        factory.instantiate_object_singletons().unwrap();
        assert!(factory.instantiate_object_singleton("Ghost").is_err());
    }

    #[test]
    fn test_supplier_and_overwrite() {
        let factory = RuntimeObjectFactory::new();
        factory
            .register_obj_with_supplier("greeting", || Arc::new("hello".to_string()))
            .unwrap();
        assert_eq!(
            *factory.get_object_as::<String>("greeting").unwrap(),
            "hello"
        );

        factory
            .register_singleton("greeting", object_ref(Arc::new("hi".to_string())))
            .unwrap();
        assert_eq!(*factory.get_object_as::<String>("greeting").unwrap(), "hi");
        assert!(matches!(
            factory.get_object_as::<u32>("greeting"),
            Err(CoreError::ObjectTypeMismatch { .. })
        ));
    }
}
