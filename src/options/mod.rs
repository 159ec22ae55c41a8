//! Routing options and service registration.
//!
//! # Data Flow
//! ```text
//! add_routing(|options| { ... })
//!     → RouteOptions::new() (built-in constraints, empty composite)
//!     → configure callback (constraints, data sources, URL flags)
//!     → RoutingServices { Arc<RouteOptions>, InlineConstraintResolver }
//!
//! Feature modules:
//!     services.endpoint_data_source().add_source(..)
//!
//! Matcher:
//!     services.endpoint_view() → current_endpoints() / wait_for_change()
//! ```
//!
//! # Design Decisions
//! - One composite per registration; every handle observes the same instance
//! - Options are mutable only inside the configure callback; the constraint map
//!   and composite stay internally synchronized afterwards

pub mod route_options;
pub mod services;

pub use route_options::RouteOptions;
pub use services::{add_routing, EndpointView, RoutingServices};
