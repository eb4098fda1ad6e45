pub mod definition;
pub mod factory;
pub mod provider;
pub mod scope;

pub use definition::{ObjectDefinition, ObjectPriority, ObjectPriorityMap};
pub use factory::{ObjectDefinitionPostProcessor, RuntimeObjectFactory};
pub use provider::{downcast_object, object_ref, ObjectProvider};
pub use scope::ObjectScope;
