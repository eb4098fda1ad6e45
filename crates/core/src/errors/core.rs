use thiserror::Error;

/// Core error type for the mystic container
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Null argument: {argument}")]
    NullArgument { argument: String },

    #[error("Invalid binding for '{path}': {source}")]
    InvalidBinding {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Required properties are missing: {}", keys.join(", "))]
    MissingRequiredProperties { keys: Vec<String> },

    #[error("Duplicate object definition for {name}")]
    ObjectDefinitionDuplicate { name: String },

    #[error("Object definition not found for {name}")]
    ObjectDefinitionNotFound { name: String },

    #[error("Object '{name}' is currently in creation")]
    ObjectCurrentlyInCreation { name: String },

    #[error("Object '{name}' is not of the requested type {expected}")]
    ObjectTypeMismatch { name: String, expected: String },

    #[error("AsyncTaskManager is already running")]
    AsyncTaskAlreadyRunning,

    #[error("AsyncTaskManager failed to run task {task}: {message}")]
    AsyncTaskRunningFailed { task: String, message: String },

    #[error("Resource {path} not found")]
    ResourceNotFound { path: String },

    #[error("Module {module} not defined")]
    ModuleNotDefined { module: String },

    #[error("Server startup failed: {message}")]
    ServerStartup { message: String },

    #[error("Lock error on resource: {resource}")]
    LockError { resource: String },
}

impl CoreError {
    /// Create a new null argument error
    pub fn null_argument(argument: impl Into<String>) -> Self {
        Self::NullArgument {
            argument: argument.into(),
        }
    }

    /// Wrap a conversion failure for the given property path
    pub fn invalid_binding(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::InvalidBinding {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Create a new configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn duplicate_definition(name: impl Into<String>) -> Self {
        Self::ObjectDefinitionDuplicate { name: name.into() }
    }

    pub fn definition_not_found(name: impl Into<String>) -> Self {
        Self::ObjectDefinitionNotFound { name: name.into() }
    }

    /// Create a failed batch error for the given task
    pub fn task_failed(task: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AsyncTaskRunningFailed {
            task: task.into(),
            message: message.into(),
        }
    }

    pub fn resource_not_found(path: impl Into<String>) -> Self {
        Self::ResourceNotFound { path: path.into() }
    }

    pub fn module_not_defined(module: impl Into<String>) -> Self {
        Self::ModuleNotDefined {
            module: module.into(),
        }
    }

    pub fn server_startup(message: impl Into<String>) -> Self {
        Self::ServerStartup {
            message: message.into(),
        }
    }

    pub fn lock_error(resource: impl Into<String>) -> Self {
        Self::LockError {
            resource: resource.into(),
        }
    }

    /// Caller-data problems raised by the binder and the environment
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NullArgument { .. }
                | Self::InvalidBinding { .. }
                | Self::Configuration { .. }
                | Self::MissingRequiredProperties { .. }
        )
    }

    /// Structural misuse of the object registry
    pub fn is_registry(&self) -> bool {
        matches!(
            self,
            Self::ObjectDefinitionDuplicate { .. }
                | Self::ObjectDefinitionNotFound { .. }
                | Self::ObjectCurrentlyInCreation { .. }
                | Self::ObjectTypeMismatch { .. }
        )
    }

    pub fn is_batch(&self) -> bool {
        matches!(
            self,
            Self::AsyncTaskAlreadyRunning | Self::AsyncTaskRunningFailed { .. }
        )
    }

    pub fn is_resource(&self) -> bool {
        matches!(
            self,
            Self::ResourceNotFound { .. } | Self::ModuleNotDefined { .. } | Self::Io(_)
        )
    }

    /// Failures that a discovery step downgrades to an empty result
    pub fn is_discovery(&self) -> bool {
        self.is_resource() || matches!(self, Self::Yaml(_) | Self::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_taxonomy() {
        assert!(CoreError::null_argument("path").is_configuration());
        assert!(CoreError::duplicate_definition("a").is_registry());
        assert!(CoreError::definition_not_found("a").is_registry());
        assert!(CoreError::AsyncTaskAlreadyRunning.is_batch());
        assert!(CoreError::task_failed("t", "boom").is_batch());
        assert!(CoreError::resource_not_found("src/resources").is_resource());
        assert!(CoreError::module_not_defined("core").is_discovery());
        assert!(!CoreError::configuration("x").is_registry());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CoreError::duplicate_definition("Listener").to_string(),
            "Duplicate object definition for Listener"
        );
        let missing = CoreError::MissingRequiredProperties {
            keys: vec!["a.b".to_string(), "c".to_string()],
        };
        assert_eq!(missing.to_string(), "Required properties are missing: a.b, c");
    }
}
