use crate::errors::CoreError;
use crate::loader::{ObjectCatalog, ObjectClassExport, ObjectLoadingConfig};
use async_trait::async_trait;
use std::sync::Arc;

/// Resolves a loading config to the definitions its unit exports
#[async_trait]
pub trait ObjectLoader: Send + Sync {
    /// `Ok(None)` means the unit could not be loaded; `Ok(Some(vec![]))` means
    /// it loaded but exports nothing under the requested type.
    async fn load_object(
        &self,
        config: &ObjectLoadingConfig,
    ) -> Result<Option<Vec<ObjectClassExport>>, CoreError>;
}

/// Conventional loader over the registration table.
///
/// Load failures are logged and reported as `None` so that one missing unit
/// never aborts the caller's batch.
#[derive(Debug, Clone)]
pub struct CatalogObjectLoader {
    catalog: Arc<ObjectCatalog>,
}

impl CatalogObjectLoader {
    pub fn new(catalog: Arc<ObjectCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<ObjectCatalog> {
        &self.catalog
    }
}

#[async_trait]
impl ObjectLoader for CatalogObjectLoader {
    async fn load_object(
        &self,
        config: &ObjectLoadingConfig,
    ) -> Result<Option<Vec<ObjectClassExport>>, CoreError> {
        let path = config.unit_path();
        match self.catalog.load(&path) {
            Ok(unit) => {
                let exports = unit
                    .exports(&config.object_type)
                    .map(<[ObjectClassExport]>::to_vec)
                    .unwrap_or_default();
                tracing::debug!(
                    "Loaded {} '{}' exports from unit {}",
                    exports.len(),
                    config.object_type,
                    path
                );
                Ok(Some(exports))
            }
            Err(e) => {
                tracing::error!("Failed to load unit {}: {}", path, e);
                Ok(None)
            }
        }
    }
}

/// Strict loader for module units; the module is mandatory
#[derive(Debug, Clone)]
pub struct ModuleObjectLoader {
    catalog: Arc<ObjectCatalog>,
}

impl ModuleObjectLoader {
    pub fn new(catalog: Arc<ObjectCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ObjectLoader for ModuleObjectLoader {
    async fn load_object(
        &self,
        config: &ObjectLoadingConfig,
    ) -> Result<Option<Vec<ObjectClassExport>>, CoreError> {
        if config.module.is_none() {
            return Err(CoreError::module_not_defined(format!(
                "<undefined>/{}",
                config.name
            )));
        }

        let unit = self.catalog.load(&config.unit_path())?;
        Ok(Some(
            unit.exports(&config.object_type)
                .map(<[ObjectClassExport]>::to_vec)
                .unwrap_or_default(),
        ))
    }
}
