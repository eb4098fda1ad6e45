use crate::binder::{Bindable, ObjectConfigPropertyBinder, ObjectType};
use crate::config::PropertySource;
use crate::config_data::{ConfigDataImporter, ConfigDataResolverContext, ConfigDataResource, ConfigLocation};
use crate::errors::CoreError;
use std::sync::Arc;

/// Property a config file uses to pull in further locations
pub const CONFIG_IMPORT_PROPERTY: &str = "config.import";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigDataContributorKind {
    /// Wraps a source already present in the environment
    Existing,
    /// Seed locations bound at bootstrap
    Initial,
    /// Loaded by an import, not yet bound
    Unbound,
    /// Reserved for a later binding phase
    Bound,
}

/// One unit of configuration state processed by the import loop
#[derive(Debug, Clone)]
pub struct ConfigDataContributor {
    kind: ConfigDataContributorKind,
    property_source: Option<Arc<dyn PropertySource>>,
    resource: Option<ConfigDataResource>,
    imports: Option<Vec<ConfigLocation>>,
}

impl ConfigDataContributor {
    pub fn existing(source: Arc<dyn PropertySource>) -> Self {
        Self {
            kind: ConfigDataContributorKind::Existing,
            property_source: Some(source),
            resource: None,
            imports: None,
        }
    }

    pub fn initial(imports: Vec<ConfigLocation>) -> Self {
        Self {
            kind: ConfigDataContributorKind::Initial,
            property_source: None,
            resource: None,
            imports: Some(imports),
        }
    }

    /// A freshly imported file; its own `config.import` entries become its imports.
    ///
    /// An import value that cannot be bound is logged and leaves the file with
    /// no imports; its other properties are still contributed.
    pub fn unbound(resource: ConfigDataResource, source: Arc<dyn PropertySource>) -> Self {
        let binder = ObjectConfigPropertyBinder::from_sources(vec![Arc::clone(&source)]);
        let bound = binder.bind::<Vec<ConfigLocation>>(
            CONFIG_IMPORT_PROPERTY,
            &Bindable::of(ObjectType::config_locations()),
        );
        let imports = match bound {
            Ok(result) => result.into_inner().map(|locations| {
                let origin = resource.path().display().to_string();
                locations
                    .into_iter()
                    .map(|location| match location.origin {
                        Some(_) => location,
                        None => location.with_origin(origin.clone()),
                    })
                    .collect()
            }),
            Err(e) => {
                tracing::error!(
                    "Ignoring {} of {}: {}",
                    CONFIG_IMPORT_PROPERTY,
                    resource.path().display(),
                    e
                );
                None
            }
        };

        Self {
            kind: ConfigDataContributorKind::Unbound,
            property_source: Some(source),
            resource: Some(resource),
            imports,
        }
    }

    pub fn kind(&self) -> ConfigDataContributorKind {
        self.kind
    }

    pub fn property_source(&self) -> Option<&Arc<dyn PropertySource>> {
        self.property_source.as_ref()
    }

    pub fn resource(&self) -> Option<&ConfigDataResource> {
        self.resource.as_ref()
    }

    pub fn imports(&self) -> Option<&[ConfigLocation]> {
        self.imports.as_deref()
    }
}

/// The flat, ordered contributor sequence
#[derive(Debug, Clone, Default)]
pub struct ConfigDataContributors {
    contributors: Vec<ConfigDataContributor>,
}

impl ConfigDataContributors {
    pub fn new(contributors: Vec<ConfigDataContributor>) -> Self {
        Self { contributors }
    }

    pub fn add_all(&mut self, contributors: impl IntoIterator<Item = ConfigDataContributor>) {
        self.contributors.extend(contributors);
    }

    /// Walk the sequence until no contributor is left unprocessed.
    ///
    /// Imports found while processing a contributor are appended and visited
    /// later in the same walk. A failed resolution or a malformed import value
    /// is logged and imports nothing.
    pub fn with_processed_imports(
        &mut self,
        importer: &mut ConfigDataImporter,
        context: &ConfigDataResolverContext<'_>,
    ) -> Result<(), CoreError> {
        let mut index = 0;
        while index < self.contributors.len() {
            let imports = match self.contributors[index].imports() {
                Some(imports) if !imports.is_empty() => imports.to_vec(),
                _ => {
                    index += 1;
                    continue;
                }
            };
            index += 1;

            tracing::debug!("Processing imports {:?}", imports);
            let imported = match importer.resolve_and_load(context, &imports) {
                Ok(imported) => imported,
                Err(e) => {
                    tracing::error!("Failed to import config data: {}", e);
                    continue;
                }
            };
            for config in imported {
                self.contributors
                    .push(ConfigDataContributor::unbound(config.resource, config.source));
            }
        }
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigDataContributor> {
        self.contributors.iter()
    }

    pub fn len(&self) -> usize {
        self.contributors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapPropertySource, Profile};
    use crate::config_data::{
        JsonPropertySourceLoader, PropertySourceLoader, StandardConfigDataResolver,
        YamlPropertySourceLoader,
    };
    use tempfile::TempDir;

    fn importer() -> ConfigDataImporter {
        let loaders: Vec<Arc<dyn PropertySourceLoader>> = vec![
            Arc::new(YamlPropertySourceLoader),
            Arc::new(JsonPropertySourceLoader),
        ];
        ConfigDataImporter::new(vec![Arc::new(StandardConfigDataResolver::new())], loaders)
    }

    #[test]
    fn test_imports_are_followed_to_a_fixed_point() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("application.yaml"),
            "config:\n  import: [first.yaml]\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("first.yaml"), "config:\n  import: second.json\n").unwrap();
        // imports back to the start, which is already loaded
        std::fs::write(
            dir.path().join("second.json"),
            r#"{"config": {"import": ["application.yaml"]}, "depth": 2}"#,
        )
        .unwrap();

        let binder = ObjectConfigPropertyBinder::from_sources(Vec::new());
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: &Profile::Production,
        };
        let mut importer = importer();
        let mut contributors = ConfigDataContributors::new(vec![ConfigDataContributor::existing(
            Arc::new(MapPropertySource::new("systemProperties", 1)),
        )]);
        contributors.add_all([ConfigDataContributor::initial(vec![ConfigLocation::new(
            "application.yaml",
        )])]);

        contributors
            .with_processed_imports(&mut importer, &context)
            .unwrap();

        let kinds: Vec<_> = contributors.iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ConfigDataContributorKind::Existing,
                ConfigDataContributorKind::Initial,
                ConfigDataContributorKind::Unbound,
                ConfigDataContributorKind::Unbound,
                ConfigDataContributorKind::Unbound,
            ]
        );
        assert_eq!(importer.loaded_count(), 3);

        let first = contributors.iter().nth(3).unwrap();
        let origin = first.imports().unwrap()[0].origin.clone().unwrap();
        assert!(origin.ends_with("first.yaml"));
    }

    #[test]
    fn test_failed_resolution_imports_nothing() {
        let dir = TempDir::new().unwrap();
        let binder = ObjectConfigPropertyBinder::from_sources(Vec::new());
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: &Profile::Production,
        };
        let mut importer = importer();
        let mut contributors = ConfigDataContributors::new(vec![ConfigDataContributor::initial(
            vec![ConfigLocation::new("does-not-exist.yaml")],
        )]);

        contributors
            .with_processed_imports(&mut importer, &context)
            .unwrap();
        assert_eq!(contributors.len(), 1);
        assert_eq!(importer.loaded_count(), 0);
    }

    #[test]
    fn test_malformed_import_value_keeps_file_properties() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.yaml"), "config:\n  import: 5\nk: v\n")
            .unwrap();

        let binder = ObjectConfigPropertyBinder::from_sources(Vec::new());
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: &Profile::Production,
        };
        let mut importer = importer();
        let mut contributors = ConfigDataContributors::new(vec![ConfigDataContributor::initial(
            vec![ConfigLocation::new("application.yaml")],
        )]);

        contributors
            .with_processed_imports(&mut importer, &context)
            .unwrap();

        assert_eq!(contributors.len(), 2);
        let loaded = contributors.iter().nth(1).unwrap();
        assert_eq!(loaded.kind(), ConfigDataContributorKind::Unbound);
        assert!(loaded.imports().is_none());
        let source = loaded.property_source().unwrap();
        assert!(source.contains_property(&crate::config::ConfigProperty::parse("k")));
    }
}
