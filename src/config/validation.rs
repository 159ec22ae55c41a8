//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (endpoints reference registered handlers)
//! - Resolve every inline constraint against the live constraint map
//! - Detect duplicate endpoint names
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function of the config, the resolver and the handler map
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::endpoints::HandlerMap;
use crate::config::schema::RoutingConfig;
use crate::error::RoutingError;
use crate::routing::InlineConstraintResolver;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("endpoint #{index} has an empty name")]
    EmptyName { index: usize },

    #[error("endpoint name '{name}' is declared more than once")]
    DuplicateName { name: String },

    #[error("endpoint '{name}': invalid pattern: {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("endpoint '{name}': invalid HTTP method '{method}'")]
    InvalidMethod { name: String, method: String },

    #[error("endpoint '{name}': {reason}")]
    Constraint { name: String, reason: String },

    #[error("endpoint '{name}': unknown handler '{handler}'")]
    UnknownHandler { name: String, handler: String },

    #[error("invalid log level directive '{level}': {reason}")]
    InvalidLogLevel { level: String, reason: String },

    #[error("invalid metrics address '{address}'")]
    InvalidMetricsAddress { address: String },
}

/// Check everything serde cannot.
pub fn validate_config(
    config: &RoutingConfig,
    resolver: &InlineConstraintResolver,
    handlers: &HandlerMap,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = EnvFilter::try_new(&config.logging.level) {
        errors.push(ValidationError::InvalidLogLevel {
            level: config.logging.level.clone(),
            reason: e.to_string(),
        });
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress {
            address: config.metrics.address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for (index, endpoint) in config.endpoints.iter().enumerate() {
        let name = endpoint.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::EmptyName { index });
        } else if !seen.insert(name.to_string()) {
            errors.push(ValidationError::DuplicateName {
                name: name.to_string(),
            });
        }

        if !endpoint.pattern.starts_with('/') {
            errors.push(ValidationError::InvalidPattern {
                name: endpoint.name.clone(),
                reason: "must start with '/'".to_string(),
            });
        } else if let Err(e) = resolver.resolve_pattern(&endpoint.pattern) {
            errors.push(match e {
                RoutingError::InvalidRoutePattern { reason, .. } => ValidationError::InvalidPattern {
                    name: endpoint.name.clone(),
                    reason,
                },
                other => ValidationError::Constraint {
                    name: endpoint.name.clone(),
                    reason: other.to_string(),
                },
            });
        }

        for method in &endpoint.methods {
            if !is_method_token(method) {
                errors.push(ValidationError::InvalidMethod {
                    name: endpoint.name.clone(),
                    method: method.clone(),
                });
            }
        }

        if !handlers.contains(&endpoint.handler) {
            errors.push(ValidationError::UnknownHandler {
                name: endpoint.name.clone(),
                handler: endpoint.handler.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// RFC 9110 token characters.
fn is_method_token(method: &str) -> bool {
    !method.is_empty()
        && method
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
