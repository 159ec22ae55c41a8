//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::endpoints::HandlerMap;
use crate::config::schema::RoutingConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::error::RoutingError;
use crate::routing::InlineConstraintResolver;

/// Error type for configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Routing(#[from] RoutingError),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration text.
pub fn parse_config(
    content: &str,
    resolver: &InlineConstraintResolver,
    handlers: &HandlerMap,
) -> Result<RoutingConfig, ConfigError> {
    let config: RoutingConfig = toml::from_str(content)?;
    validate_config(&config, resolver, handlers).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(
    path: &Path,
    resolver: &InlineConstraintResolver,
    handlers: &HandlerMap,
) -> Result<RoutingConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content, resolver, handlers)
}
