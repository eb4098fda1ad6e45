use crate::errors::CoreError;
use crate::loader::{unit_path, ObjectClassExport};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A loadable unit: the lists of exports it carries, keyed by logical type
#[derive(Debug, Clone, Default)]
pub struct ObjectUnit {
    exports: HashMap<String, Vec<ObjectClassExport>>,
}

impl ObjectUnit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an export list, builder style
    pub fn with_exports(
        mut self,
        object_type: impl Into<String>,
        exports: Vec<ObjectClassExport>,
    ) -> Self {
        self.exports
            .entry(object_type.into())
            .or_default()
            .extend(exports);
        self
    }

    pub fn export(&mut self, object_type: impl Into<String>, export: ObjectClassExport) {
        self.exports.entry(object_type.into()).or_default().push(export);
    }

    pub fn exports(&self, object_type: &str) -> Option<&[ObjectClassExport]> {
        self.exports.get(object_type).map(Vec::as_slice)
    }

    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.exports.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

#[derive(Debug, Clone)]
enum UnitEntry {
    Loaded(ObjectUnit),
    Broken(String),
}

/// The registration table: unit path to unit, built once during assembly
#[derive(Debug, Clone, Default)]
pub struct ObjectCatalog {
    units: BTreeMap<String, UnitEntry>,
}

impl ObjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_unit(&mut self, path: impl Into<String>, unit: ObjectUnit) {
        let path = path.into();
        if self.units.contains_key(&path) {
            tracing::warn!("Unit {} is already registered and will be replaced", path);
        }
        self.units.insert(path, UnitEntry::Loaded(unit));
    }

    /// Register a unit under `core/<name>`
    pub fn register_core_unit(&mut self, name: &str, unit: ObjectUnit) {
        self.register_unit(unit_path(None, name), unit);
    }

    /// Register a unit under `applications/<module>/<name>`
    pub fn register_module_unit(&mut self, module: &str, name: &str, unit: ObjectUnit) {
        self.register_unit(unit_path(Some(module), name), unit);
    }

    /// Register a unit that exists but fails to load
    pub fn register_broken_unit(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.units.insert(path.into(), UnitEntry::Broken(reason.into()));
    }

    pub fn with_unit(mut self, path: impl Into<String>, unit: ObjectUnit) -> Self {
        self.register_unit(path, unit);
        self
    }

    pub fn contains_unit(&self, path: &str) -> bool {
        self.units.contains_key(path)
    }

    /// Load a unit by path
    pub fn load(&self, path: &str) -> Result<&ObjectUnit, CoreError> {
        match self.units.get(path) {
            Some(UnitEntry::Loaded(unit)) => Ok(unit),
            Some(UnitEntry::Broken(reason)) => Err(CoreError::configuration(format!(
                "unit {} failed to load: {}",
                path, reason
            ))),
            None => Err(CoreError::resource_not_found(path)),
        }
    }

    /// Names of the application modules that own at least one unit
    pub fn application_modules(&self) -> Vec<String> {
        let modules: BTreeSet<String> = self
            .units
            .keys()
            .filter_map(|path| path.strip_prefix("applications/"))
            .filter_map(|rest| rest.rsplit_once('/').map(|(module, _)| module.to_string()))
            .collect();
        modules.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
