use crate::binder::{Bindable, ObjectConfigPropertyBinder, ObjectType};
use crate::config::Profile;
use crate::config_data::{ConfigDataResource, ConfigLocation};
use crate::errors::CoreError;
use crate::resources::FileResource;
use std::path::{Path, PathBuf};

/// Property listing the config file stems searched in a directory
pub const CONFIG_NAME_PROPERTY: &str = "application.config.name";
pub const DEFAULT_CONFIG_NAME: &str = "application";
/// File extensions searched in a directory, in priority order
pub const CONFIG_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// What a resolver may consult while resolving
pub struct ConfigDataResolverContext<'a> {
    pub binder: &'a ObjectConfigPropertyBinder,
    pub root: &'a Path,
    pub profile: &'a Profile,
}

/// Turns a location into zero or more loadable resources
pub trait ConfigDataResolver: Send + Sync {
    fn resolvable(&self, context: &ConfigDataResolverContext<'_>, location: &ConfigLocation) -> bool;

    fn resolve(
        &self,
        context: &ConfigDataResolverContext<'_>,
        location: &ConfigLocation,
    ) -> Result<Vec<ConfigDataResource>, CoreError>;
}

/// Resolves relative paths, absolute paths and `file:` URLs
#[derive(Debug, Clone, Default)]
pub struct StandardConfigDataResolver;

impl StandardConfigDataResolver {
    pub fn new() -> Self {
        Self
    }

    fn to_path(
        &self,
        context: &ConfigDataResolverContext<'_>,
        location: &ConfigLocation,
    ) -> Result<PathBuf, CoreError> {
        let value = location.path_value();
        match location.scheme() {
            Some("file") => {
                let url = url::Url::parse(value).map_err(|e| {
                    CoreError::configuration(format!("invalid config location '{}': {}", value, e))
                })?;
                url.to_file_path().map_err(|_| {
                    CoreError::configuration(format!("'{}' is not a local file URL", value))
                })
            }
            Some(other) => Err(CoreError::configuration(format!(
                "unsupported config location scheme '{}'",
                other
            ))),
            None if location.is_absolute() => Ok(PathBuf::from(value)),
            None => Ok(context.root.join(value)),
        }
    }

    fn config_names(&self, context: &ConfigDataResolverContext<'_>) -> Result<Vec<String>, CoreError> {
        Ok(context
            .binder
            .bind::<Vec<String>>(CONFIG_NAME_PROPERTY, &Bindable::of(ObjectType::list()))?
            .or_else(vec![DEFAULT_CONFIG_NAME.to_string()]))
    }

    fn resolve_directory(
        &self,
        context: &ConfigDataResolverContext<'_>,
        location: &ConfigLocation,
        dir: &Path,
    ) -> Result<Vec<ConfigDataResource>, CoreError> {
        if !dir.is_dir() {
            if location.is_optional() {
                return Ok(Vec::new());
            }
            return Err(CoreError::resource_not_found(dir.display().to_string()));
        }

        let profile = context.profile.as_str();
        let mut resolved = Vec::new();
        for name in self.config_names(context)? {
            for ext in CONFIG_EXTENSIONS {
                // profile-specific files come first so they take precedence
                let candidates = [
                    (dir.join(format!("{}-{}.{}", name, profile, ext)), Some(profile.to_string())),
                    (dir.join(format!("{}.{}", name, ext)), None),
                ];
                for (path, file_profile) in candidates {
                    if path.is_file() {
                        resolved.push(ConfigDataResource::new(
                            location.clone(),
                            FileResource::new(path),
                            file_profile,
                        ));
                    }
                }
            }
        }
        Ok(resolved)
    }
}

impl ConfigDataResolver for StandardConfigDataResolver {
    fn resolvable(&self, _context: &ConfigDataResolverContext<'_>, location: &ConfigLocation) -> bool {
        !location.is_empty() && matches!(location.scheme(), None | Some("file"))
    }

    fn resolve(
        &self,
        context: &ConfigDataResolverContext<'_>,
        location: &ConfigLocation,
    ) -> Result<Vec<ConfigDataResource>, CoreError> {
        tracing::debug!("Resolving config location {}", location);
        let path = self.to_path(context, location)?;

        if location.is_directory() || path.is_dir() {
            return self.resolve_directory(context, location, &path);
        }
        if path.is_file() {
            return Ok(vec![ConfigDataResource::new(
                location.clone(),
                FileResource::new(path),
                None,
            )]);
        }
        if location.is_optional() {
            tracing::debug!("Skipping missing optional config location {}", location);
            return Ok(Vec::new());
        }
        Err(CoreError::resource_not_found(path.display().to_string()))
    }
}
