use crate::config_data::ConfigLocation;
use crate::resources::{FileResource, Resource};
use std::path::Path;

/// A resolved configuration file and the location it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDataResource {
    location: ConfigLocation,
    resource: FileResource,
    profile: Option<String>,
}

impl ConfigDataResource {
    pub fn new(location: ConfigLocation, resource: FileResource, profile: Option<String>) -> Self {
        Self {
            location,
            resource,
            profile,
        }
    }

    pub fn location(&self) -> &ConfigLocation {
        &self.location
    }

    pub fn file(&self) -> &FileResource {
        &self.resource
    }

    pub fn path(&self) -> &Path {
        self.resource.path()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }
}

impl Resource for ConfigDataResource {
    fn exists(&self) -> bool {
        self.resource.exists()
    }

    fn is_file(&self) -> bool {
        self.resource.is_file()
    }

    fn uri(&self) -> &str {
        self.resource.uri()
    }
}
