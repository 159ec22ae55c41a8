//! Endpoint routing core: endpoint data sources, change propagation and route constraints.

pub mod change;
pub mod config;
pub mod datasource;
pub mod endpoint;
pub mod error;
pub mod observability;
pub mod options;
pub mod routing;

pub use change::{on_change, ChangeToken, ChangeTokenSource};
pub use datasource::{
    CompositeEndpointDataSource, DefaultEndpointDataSource, DynamicEndpointDataSource, EndpointDataSource,
    EndpointSnapshot,
};
pub use endpoint::{Endpoint, EndpointMetadataCollection, RequestContext};
pub use error::{Result, RoutingError};
pub use options::{add_routing, EndpointView, RouteOptions, RoutingServices};
pub use routing::{ConstraintMap, RouteConstraint, RouteDirection, RouteValue, RouteValueDictionary};
