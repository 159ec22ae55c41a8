//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks against constraint map and handlers)
//!     → RoutingConfig (validated, immutable)
//!     → endpoints.rs (EndpointConfig → Arc<Endpoint>)
//!     → DynamicEndpointDataSource::replace
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads and validates
//!     → host replaces the config data source
//!     → composite fires, matcher observes new endpoints
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A rejected reload keeps the previous endpoints

pub mod endpoints;
pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use endpoints::{build_endpoints, HandlerMap};
pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{EndpointConfig, LogFormat, LoggingConfig, MetricsConfig, RoutingConfig};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
