use crate::config::PropertySource;
use crate::config_data::{
    ConfigDataResolver, ConfigDataResolverContext, ConfigDataResource, ConfigLocation,
    PropertySourceLoader,
};
use crate::errors::CoreError;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// A resource loaded by the importer
#[derive(Debug, Clone)]
pub struct ImportedConfig {
    pub resource: ConfigDataResource,
    pub source: Arc<dyn PropertySource>,
}

/// Resolves import locations and loads the resulting files, each at most once
pub struct ConfigDataImporter {
    resolvers: Vec<Arc<dyn ConfigDataResolver>>,
    loaders: Vec<Arc<dyn PropertySourceLoader>>,
    loaded: HashSet<PathBuf>,
    loaded_locations: Vec<ConfigLocation>,
}

impl ConfigDataImporter {
    pub fn new(
        resolvers: Vec<Arc<dyn ConfigDataResolver>>,
        loaders: Vec<Arc<dyn PropertySourceLoader>>,
    ) -> Self {
        Self {
            resolvers,
            loaders,
            loaded: HashSet::new(),
            loaded_locations: Vec::new(),
        }
    }

    /// Ask each resolver in turn; the first that can resolve a location does
    pub fn resolve(
        &self,
        context: &ConfigDataResolverContext<'_>,
        locations: &[ConfigLocation],
    ) -> Result<Vec<ConfigDataResource>, CoreError> {
        let mut resolved = Vec::new();
        for location in locations {
            match self
                .resolvers
                .iter()
                .find(|resolver| resolver.resolvable(context, location))
            {
                Some(resolver) => resolved.extend(resolver.resolve(context, location)?),
                None => tracing::warn!("No resolver accepts config location {}", location),
            }
        }
        Ok(resolved)
    }

    /// Resolve the locations and load every file not loaded before.
    ///
    /// Files are only recorded as loaded once the whole call succeeds, so a
    /// failed call leaves them available to later imports.
    pub fn resolve_and_load(
        &mut self,
        context: &ConfigDataResolverContext<'_>,
        locations: &[ConfigLocation],
    ) -> Result<Vec<ImportedConfig>, CoreError> {
        let mut imported: Vec<ImportedConfig> = Vec::new();
        for resource in self.resolve(context, locations)? {
            let seen = self.loaded.contains(resource.path())
                || imported.iter().any(|c| c.resource.path() == resource.path());
            if seen {
                tracing::debug!("Config resource {} is already loaded", resource.path().display());
                continue;
            }

            let Some(loader) = self
                .loaders
                .iter()
                .find(|loader| loader.supports(resource.file()))
            else {
                tracing::warn!(
                    "No property source loader for {}",
                    resource.path().display()
                );
                continue;
            };

            let name = format!("Config resource '{}'", resource.path().display());
            let source = loader.load(&name, resource.file())?;
            tracing::info!("Loaded {} with {} properties", name, source.len());
            imported.push(ImportedConfig {
                resource,
                source: Arc::new(source),
            });
        }

        for config in &imported {
            self.loaded.insert(config.resource.path().to_path_buf());
            if !self.loaded_locations.contains(config.resource.location()) {
                self.loaded_locations.push(config.resource.location().clone());
            }
        }
        Ok(imported)
    }

    pub fn loaded_locations(&self) -> &[ConfigLocation] {
        &self.loaded_locations
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }
}

impl std::fmt::Debug for ConfigDataImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigDataImporter")
            .field("resolvers", &self.resolvers.len())
            .field("loaders", &self.loaders.len())
            .field("loaded_locations", &self.loaded_locations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ObjectConfigPropertyBinder;
    use crate::config::Profile;
    use crate::config_data::{StandardConfigDataResolver, YamlPropertySourceLoader};
    use tempfile::TempDir;

    fn importer() -> ConfigDataImporter {
        let loaders: Vec<Arc<dyn PropertySourceLoader>> = vec![Arc::new(YamlPropertySourceLoader)];
        ConfigDataImporter::new(vec![Arc::new(StandardConfigDataResolver::new())], loaders)
    }

    #[test]
    fn test_failed_load_does_not_mark_earlier_files_loaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.yaml"), "k: v\n").unwrap();
        std::fs::write(dir.path().join("bad.yaml"), "k: [unclosed\n").unwrap();

        let binder = ObjectConfigPropertyBinder::from_sources(Vec::new());
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: &Profile::Production,
        };
        let mut importer = importer();

        let batch = [ConfigLocation::new("good.yaml"), ConfigLocation::new("bad.yaml")];
        assert!(importer.resolve_and_load(&context, &batch).is_err());
        assert_eq!(importer.loaded_count(), 0);
        assert!(importer.loaded_locations().is_empty());

        let imported = importer
            .resolve_and_load(&context, &[ConfigLocation::new("good.yaml")])
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(importer.loaded_count(), 1);
    }

    #[test]
    fn test_same_file_is_loaded_once() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.yaml"), "k: v\n").unwrap();

        let binder = ObjectConfigPropertyBinder::from_sources(Vec::new());
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: &Profile::Production,
        };
        let mut importer = importer();

        let twice = [ConfigLocation::new("good.yaml"), ConfigLocation::new("good.yaml")];
        assert_eq!(importer.resolve_and_load(&context, &twice).unwrap().len(), 1);
        assert!(importer
            .resolve_and_load(&context, &[ConfigLocation::new("good.yaml")])
            .unwrap()
            .is_empty());
    }
}
