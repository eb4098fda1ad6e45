use crate::config::{ApplicationEnvironment, PropertyResolver};
use crate::errors::CoreError;
use serde_json::Value;
use std::str::FromStr;

/// Property holding the HTTP server port
pub const APP_SERVER_PORT: &str = "application.server.port";
/// Environment variable consulted when the port property is unset
pub const PORT_ENV_VAR: &str = "PORT";
/// Property enabling the bootstrap listener
pub const APP_BOOTSTRAP_ENABLED: &str = "application.bootstrap.enabled";
/// Environment variable naming the active profile
pub const PROFILE_ENV_VAR: &str = "APP_ENV";

pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Active deployment profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Development,
    Testing,
    Production,
}

impl FromStr for Profile {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "testing" | "test" => Ok(Profile::Testing),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(CoreError::configuration(format!(
                "invalid profile '{}', expected development, testing, or production",
                s
            ))),
        }
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Profile {
    /// Read the profile from `APP_ENV`, defaulting to production
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV_VAR)
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(Profile::Production)
    }

    /// Short name used in profile-specific config file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "dev",
            Profile::Testing => "test",
            Profile::Production => "prod",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Profile::Production)
    }
}

/// Typed view over the well-known application keys of an environment
pub struct ApplicationSettings<'a> {
    environment: &'a ApplicationEnvironment,
}

impl<'a> ApplicationSettings<'a> {
    pub fn new(environment: &'a ApplicationEnvironment) -> Self {
        Self { environment }
    }

    /// The server port property, then `PORT`, then the default
    pub fn server_port(&self) -> Result<u16, CoreError> {
        let raw = self
            .environment
            .get_string(APP_SERVER_PORT)
            .or_else(|| std::env::var(PORT_ENV_VAR).ok());

        match raw {
            Some(port) => port.trim().parse().map_err(|_| {
                CoreError::configuration(format!(
                    "invalid value for '{}': '{}', expected a port between 0 and 65535",
                    APP_SERVER_PORT, port
                ))
            }),
            None => Ok(DEFAULT_SERVER_PORT),
        }
    }

    pub fn bootstrap_enabled(&self) -> bool {
        self.environment
            .get_property(APP_BOOTSTRAP_ENABLED)
            .map(|value| is_truthy(&value))
            .unwrap_or(false)
    }

    pub fn profile(&self) -> &Profile {
        self.environment.active_profile()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !matches!(s.trim().to_lowercase().as_str(), "" | "false" | "0" | "no" | "off"),
        Value::Null => false,
        _ => true,
    }
}
