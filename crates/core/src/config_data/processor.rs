use crate::binder::{Bindable, ObjectConfigPropertyBinder, ObjectType};
use crate::config::ApplicationEnvironment;
use crate::config_data::{
    ConfigDataContributor, ConfigDataContributors, ConfigDataImporter, ConfigDataResolver,
    ConfigDataResolverContext, ConfigLocation, JsonPropertySourceLoader, PropertySourceLoader,
    StandardConfigDataResolver, YamlPropertySourceLoader,
};
use crate::context::ApplicationContext;
use crate::errors::CoreError;
use crate::foundation::sort_by_order;
use crate::loader::kinds::{CONFIG_DATA_RESOLVER, PROPERTY_SOURCE_LOADER};
use async_trait::async_trait;
use std::sync::Arc;

/// Property holding the initial config locations
pub const CONFIG_LOCATION_PROPERTY: &str = "default.config.location";
pub const DEFAULT_CONFIG_LOCATION: &str = "src/resources";

/// Customizes the environment after its sources are attached and before the
/// context is refreshed
#[async_trait]
pub trait EnvironmentPostProcessor: Send + Sync {
    async fn post_process_environment(
        &self,
        context: &ApplicationContext,
        environment: &Arc<ApplicationEnvironment>,
    ) -> Result<(), CoreError>;
}

/// Loads configuration files into the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigDataEnvironmentPostProcessor;

impl ConfigDataEnvironmentPostProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Every registered resolver, falling back to the standard one
    async fn create_resolvers(
        &self,
        context: &ApplicationContext,
    ) -> Result<Vec<Arc<dyn ConfigDataResolver>>, CoreError> {
        let factory = context.object_factory();
        let mut exports = context
            .resource_loader()?
            .get_resources(CONFIG_DATA_RESOLVER)
            .await?;
        sort_by_order(&mut exports);

        let resolvers = exports
            .iter()
            .map(|export| export.instantiate_as::<dyn ConfigDataResolver>(factory.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if resolvers.is_empty() {
            tracing::debug!("No config data resolvers registered, using the standard resolver");
            return Ok(vec![Arc::new(StandardConfigDataResolver::new())]);
        }
        Ok(resolvers)
    }

    async fn create_loaders(
        &self,
        context: &ApplicationContext,
    ) -> Result<Vec<Arc<dyn PropertySourceLoader>>, CoreError> {
        let factory = context.object_factory();
        let mut exports = context
            .resource_loader()?
            .get_resources(PROPERTY_SOURCE_LOADER)
            .await?;
        sort_by_order(&mut exports);

        let loaders = exports
            .iter()
            .map(|export| export.instantiate_as::<dyn PropertySourceLoader>(factory.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if loaders.is_empty() {
            tracing::debug!("No property source loaders registered, using yaml and json");
            let defaults: Vec<Arc<dyn PropertySourceLoader>> = vec![
                Arc::new(YamlPropertySourceLoader),
                Arc::new(JsonPropertySourceLoader),
            ];
            return Ok(defaults);
        }
        Ok(loaders)
    }

    /// Existing sources followed by one contributor for the initial locations
    pub fn initial_contributors(
        environment: &ApplicationEnvironment,
        binder: &ObjectConfigPropertyBinder,
    ) -> Result<ConfigDataContributors, CoreError> {
        let mut contributors = ConfigDataContributors::new(
            environment
                .property_sources()
                .to_list()
                .into_iter()
                .map(ConfigDataContributor::existing)
                .collect(),
        );

        let locations = binder
            .bind::<Vec<ConfigLocation>>(
                CONFIG_LOCATION_PROPERTY,
                &Bindable::of(ObjectType::config_locations()),
            )?
            .or_else(vec![ConfigLocation::new(DEFAULT_CONFIG_LOCATION)]);
        contributors.add_all([ConfigDataContributor::initial(locations)]);
        Ok(contributors)
    }

    /// Publish every loaded source; a name already in the chain is kept
    pub fn apply_to_environment(
        environment: &ApplicationEnvironment,
        contributors: &ConfigDataContributors,
        importer: &ConfigDataImporter,
    ) -> Result<usize, CoreError> {
        let mut applied = 0;
        for contributor in contributors.iter().filter(|c| c.resource().is_some()) {
            if let Some(source) = contributor.property_source() {
                if environment
                    .property_sources()
                    .put_if_absent(Arc::clone(source))?
                {
                    applied += 1;
                }
            }
        }
        tracing::info!(
            "Applied {} config sources from {} locations",
            applied,
            importer.loaded_locations().len()
        );
        Ok(applied)
    }
}

#[async_trait]
impl EnvironmentPostProcessor for ConfigDataEnvironmentPostProcessor {
    async fn post_process_environment(
        &self,
        context: &ApplicationContext,
        environment: &Arc<ApplicationEnvironment>,
    ) -> Result<(), CoreError> {
        let resolvers = self.create_resolvers(context).await?;
        let loaders = self.create_loaders(context).await?;
        let resource_loader = context.resource_loader()?;

        let binder = ObjectConfigPropertyBinder::new(environment);
        let mut contributors = Self::initial_contributors(environment, &binder)?;
        let resolver_context = ConfigDataResolverContext {
            binder: &binder,
            root: resource_loader.root(),
            profile: environment.active_profile(),
        };

        let mut importer = ConfigDataImporter::new(resolvers, loaders);
        contributors.with_processed_imports(&mut importer, &resolver_context)?;
        Self::apply_to_environment(environment, &contributors, &importer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::DEFAULT_APP_PROP_SOURCE;
    use crate::config::{MapPropertySource, Profile, PropertyResolver};
    use crate::config_data::ConfigDataContributorKind;
    use tempfile::TempDir;

    #[test]
    fn test_initial_contributors_default_location() {
        let environment = ApplicationEnvironment::with_system_properties(Default::default());
        let binder = ObjectConfigPropertyBinder::new(&environment);
        let contributors =
            ConfigDataEnvironmentPostProcessor::initial_contributors(&environment, &binder)
                .unwrap();

        let kinds: Vec<_> = contributors.iter().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ConfigDataContributorKind::Existing,
                ConfigDataContributorKind::Initial
            ]
        );
        let initial = contributors.iter().last().unwrap();
        assert_eq!(initial.imports().unwrap()[0].value, DEFAULT_CONFIG_LOCATION);
    }

    #[test]
    fn test_apply_keeps_first_source_of_a_name() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("application.yaml"), "server:\n  name: files\n").unwrap();

        let environment = ApplicationEnvironment::empty().with_profile(Profile::Production);
        environment
            .add_property_source(Arc::new(
                MapPropertySource::new("overrides", 5)
                    .with_property(CONFIG_LOCATION_PROPERTY, "./"),
            ))
            .unwrap();
        environment.attach_property_sources().unwrap();

        let binder = ObjectConfigPropertyBinder::new(&environment);
        let mut contributors =
            ConfigDataEnvironmentPostProcessor::initial_contributors(&environment, &binder)
                .unwrap();
        let context = ConfigDataResolverContext {
            binder: &binder,
            root: dir.path(),
            profile: environment.active_profile(),
        };
        let mut importer = ConfigDataImporter::new(
            vec![Arc::new(StandardConfigDataResolver::new())],
            vec![Arc::new(YamlPropertySourceLoader)],
        );
        contributors
            .with_processed_imports(&mut importer, &context)
            .unwrap();

        let applied =
            ConfigDataEnvironmentPostProcessor::apply_to_environment(&environment, &contributors, &importer)
                .unwrap();
        assert_eq!(applied, 1);
        assert!(environment.property_sources().contains(DEFAULT_APP_PROP_SOURCE));
        assert_eq!(environment.get_string("server.name").as_deref(), Some("files"));

        let again =
            ConfigDataEnvironmentPostProcessor::apply_to_environment(&environment, &contributors, &importer)
                .unwrap();
        assert_eq!(again, 0);
    }
}
