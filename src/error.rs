//! Error types for the routing core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RoutingError>;

/// Errors raised while configuring routing or reading the endpoint table.
#[derive(Error, Debug)]
pub enum RoutingError {
    /// No factory is registered under the token.
    #[error("unknown route constraint: '{token}'")]
    UnknownConstraint { token: String },

    /// The registered factory refused the inline arguments.
    #[error("could not construct constraint '{token}' ({type_name}): {reason}")]
    ConstraintConstruction {
        token: String,
        type_name: String,
        reason: String,
    },

    /// Inline constraint text such as `range(1,100` that cannot be split into token and arguments.
    #[error("invalid inline constraint '{text}': {reason}")]
    InvalidConstraintSyntax { text: String, reason: String },

    /// A route template whose parameter declarations cannot be read.
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidRoutePattern { pattern: String, reason: String },

    /// A data source failed to produce its endpoints.
    #[error("endpoint data source '{source_name}' failed: {message}")]
    DataSource {
        source_name: String,
        message: String,
    },
}

impl RoutingError {
    pub fn data_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        RoutingError::DataSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
