//! Tracing setup driven by the application environment

use crate::config::{ApplicationEnvironment, Profile, PropertyResolver};
use crate::errors::CoreError;
use std::io;
use tracing_subscriber::{fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directive, e.g. `mystic_core=debug,warn`
pub const LOGGING_LEVEL_PROPERTY: &str = "logging.level";
/// One of `json`, `pretty`, `plain`
pub const LOGGING_FORMAT_PROPERTY: &str = "logging.format";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
    Plain,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "plain" | "text" => Some(Self::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub directive: String,
    pub format: LogFormat,
    /// Emit file and line of each event
    pub with_location: bool,
}

impl LoggingConfig {
    pub fn for_profile(profile: &Profile) -> Self {
        let (directive, format, with_location) = match profile {
            Profile::Development => ("mystic_core=debug,info", LogFormat::Pretty, true),
            Profile::Testing => ("mystic_core=error", LogFormat::Plain, false),
            Profile::Production => ("mystic_core=info,warn", LogFormat::Json, false),
        };
        Self {
            directive: directive.to_string(),
            format,
            with_location,
        }
    }

    /// Profile defaults overridden by `logging.level` and `logging.format`
    pub fn from_environment(environment: &ApplicationEnvironment) -> Self {
        let mut config = Self::for_profile(environment.active_profile());
        if let Some(directive) = environment.get_string(LOGGING_LEVEL_PROPERTY) {
            config.directive = directive;
        }
        if let Some(value) = environment.get_string(LOGGING_FORMAT_PROPERTY) {
            match LogFormat::parse(&value) {
                Some(format) => config.format = format,
                None => tracing::warn!("Unknown log format '{}', keeping {:?}", value, config.format),
            }
        }
        config
    }

    /// `RUST_LOG` wins over the configured directive
    pub fn filter(&self) -> Result<EnvFilter, CoreError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.directive))
            .map_err(|e| {
                CoreError::configuration(format!("invalid log filter '{}': {}", self.directive, e))
            })
    }
}

/// Install the global subscriber; fails when one is already installed
pub fn init_logging(config: LoggingConfig) -> Result<(), CoreError> {
    let filter = config.filter()?;
    let layer = Layer::new()
        .with_writer(io::stdout)
        .with_file(config.with_location)
        .with_line_number(config.with_location);

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry.with(layer.json()).try_init(),
        LogFormat::Pretty => registry.with(layer.pretty()).try_init(),
        LogFormat::Plain => registry.with(layer).try_init(),
    };
    installed.map_err(|e| CoreError::configuration(format!("logging is already initialized: {}", e)))?;

    tracing::debug!("Logging initialized with '{}' as {:?}", config.directive, config.format);
    Ok(())
}
