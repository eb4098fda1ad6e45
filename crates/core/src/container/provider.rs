use crate::errors::CoreError;
use crate::foundation::ObjectRef;
use std::sync::Arc;

/// Name-based object lookup handed to constructors and initializers
pub trait ObjectProvider: Send + Sync {
    fn get_object(&self, name: &str) -> Result<ObjectRef, CoreError>;

    fn contains_object(&self, name: &str) -> bool;
}

impl dyn ObjectProvider + '_ {
    /// Look up an object and view it as `Arc<S>`
    pub fn get_object_as<S>(&self, name: &str) -> Result<Arc<S>, CoreError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        downcast_object(name, &self.get_object(name)?)
    }

    /// Like `get_object_as`, substituting `default` when the name is unknown
    pub fn get_object_or<S>(&self, name: &str, default: Arc<S>) -> Result<Arc<S>, CoreError>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        if self.contains_object(name) {
            self.get_object_as(name)
        } else {
            Ok(default)
        }
    }
}

/// View a stored instance as the shared pointer it was registered with
pub fn downcast_object<S>(name: &str, object: &ObjectRef) -> Result<Arc<S>, CoreError>
where
    S: ?Sized + Send + Sync + 'static,
{
    object
        .downcast_ref::<Arc<S>>()
        .cloned()
        .ok_or_else(|| CoreError::ObjectTypeMismatch {
            name: name.to_string(),
            expected: std::any::type_name::<S>().to_string(),
        })
}

/// Box a shared pointer for storage in the registry
pub fn object_ref<S>(instance: Arc<S>) -> ObjectRef
where
    S: ?Sized + Send + Sync + 'static,
{
    Arc::new(instance)
}
