use crate::errors::CoreError;
use crate::loader::{
    kinds, unit_path, CatalogObjectLoader, ObjectCatalog, ObjectClassExport, ObjectLoader,
    ObjectLoadingConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const URL_FILE_PROTOCOL: &str = "file://";

/// A locatable resource
pub trait Resource: Send + Sync + std::fmt::Debug {
    fn exists(&self) -> bool;

    fn is_file(&self) -> bool;

    fn uri(&self) -> &str;
}

/// A resource on the local filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
    uri: String,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let uri = format!("{}{}", URL_FILE_PROTOCOL, path.display());
        Self { path, uri }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|ext| ext.to_str())
    }

    pub fn read_to_string(&self) -> Result<String, CoreError> {
        if !self.exists() {
            return Err(CoreError::resource_not_found(self.path.display().to_string()));
        }
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

impl Resource for FileResource {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn is_file(&self) -> bool {
        self.path.is_file()
    }

    fn uri(&self) -> &str {
        &self.uri
    }
}

/// Finds exported objects of a kind across application modules, and file
/// resources under a root directory
#[derive(Clone)]
pub struct ObjectConfigResourceLoader {
    object_loader: Arc<dyn ObjectLoader>,
    catalog: Arc<ObjectCatalog>,
    root: PathBuf,
}

impl ObjectConfigResourceLoader {
    pub fn new(catalog: Arc<ObjectCatalog>, root: impl Into<PathBuf>) -> Self {
        Self {
            object_loader: Arc::new(CatalogObjectLoader::new(Arc::clone(&catalog))),
            catalog,
            root: root.into(),
        }
    }

    pub fn with_object_loader(mut self, object_loader: Arc<dyn ObjectLoader>) -> Self {
        self.object_loader = object_loader;
        self
    }

    pub fn object_loader(&self) -> Arc<dyn ObjectLoader> {
        Arc::clone(&self.object_loader)
    }

    pub fn catalog(&self) -> &Arc<ObjectCatalog> {
        &self.catalog
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every export of `kind` found in any application module
    pub async fn get_resources(&self, kind: &str) -> Result<Vec<ObjectClassExport>, CoreError> {
        let modules = self.catalog.application_modules();
        if modules.is_empty() {
            tracing::error!("No application modules are registered");
            return Err(CoreError::resource_not_found("applications"));
        }

        let unit_names = kinds::unit_names(kind);
        tracing::debug!("Looking up {} in units {:?}", kind, unit_names);

        let mut exports = Vec::new();
        for module in &modules {
            for name in unit_names {
                if !self.catalog.contains_unit(&unit_path(Some(module.as_str()), name)) {
                    continue;
                }
                let config = ObjectLoadingConfig::new(*name, kind).with_module(module.as_str());
                if let Some(found) = self.object_loader.load_object(&config).await? {
                    exports.extend(found);
                }
            }
        }
        Ok(exports)
    }

    /// A file resource resolved against the root directory
    pub fn get_resource(&self, resource: &str) -> FileResource {
        let trimmed = resource.strip_prefix(URL_FILE_PROTOCOL).unwrap_or(resource);
        let path = Path::new(trimmed);
        if path.is_absolute() {
            FileResource::new(path)
        } else {
            FileResource::new(self.root.join(path))
        }
    }
}

impl std::fmt::Debug for ObjectConfigResourceLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectConfigResourceLoader")
            .field("root", &self.root)
            .field("units", &self.catalog.len())
            .finish()
    }
}
