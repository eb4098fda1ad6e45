use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const OPTIONAL_PREFIX: &str = "optional:";
const URL_SCHEME_PATTERN: &str = r"^[a-zA-Z][a-zA-Z0-9+.\-]*:";

fn url_scheme() -> Option<&'static Regex> {
    static SCHEME: OnceLock<Option<Regex>> = OnceLock::new();
    SCHEME
        .get_or_init(|| Regex::new(URL_SCHEME_PATTERN).ok())
        .as_ref()
}

/// A pointer to a configuration resource awaiting resolution
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigLocation {
    pub value: String,
    #[serde(default)]
    pub origin: Option<String>,
}

impl ConfigLocation {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Locations prefixed with `optional:` may be missing
    pub fn is_optional(&self) -> bool {
        self.value.starts_with(OPTIONAL_PREFIX)
    }

    /// The location without its `optional:` prefix
    pub fn path_value(&self) -> &str {
        self.value
            .strip_prefix(OPTIONAL_PREFIX)
            .unwrap_or(&self.value)
            .trim()
    }

    /// Starts with `/` or with a URL scheme such as `file:`
    pub fn is_absolute(&self) -> bool {
        let value = self.path_value();
        value.starts_with('/') || self.scheme().is_some()
    }

    pub fn scheme(&self) -> Option<&str> {
        let value = self.path_value();
        let found = url_scheme()?.find(value)?;
        Some(&value[..found.end() - 1])
    }

    /// Ends with a path separator
    pub fn is_directory(&self) -> bool {
        let value = self.path_value();
        value.ends_with('/') || value.ends_with(std::path::MAIN_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.path_value().is_empty()
    }
}

impl std::fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<&str> for ConfigLocation {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
