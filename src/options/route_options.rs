//! The routing configuration aggregate.

use std::sync::Arc;

use crate::datasource::{CompositeEndpointDataSource, EndpointDataSource};
use crate::routing::{ConstraintMap, ConstructConstraint};

/// Constraint registrations, data source registrations and URL shaping flags.
///
/// Built once per process by [`add_routing`](crate::options::add_routing), or directly
/// when no service wiring is wanted.
#[derive(Debug)]
pub struct RouteOptions {
    constraint_map: Arc<ConstraintMap>,
    endpoint_data_sources: CompositeEndpointDataSource,

    /// Generated URLs are lowercased.
    pub lowercase_urls: bool,
    /// Query strings of generated URLs are lowercased too. Only honoured with `lowercase_urls`.
    pub lowercase_query_strings: bool,
    /// Generated URLs end with `/`.
    pub append_trailing_slash: bool,
}

impl RouteOptions {
    /// Options with the built-in constraints and no data sources.
    pub fn new() -> Self {
        Self {
            constraint_map: Arc::new(ConstraintMap::with_defaults()),
            endpoint_data_sources: CompositeEndpointDataSource::new(),
            lowercase_urls: false,
            lowercase_query_strings: false,
            append_trailing_slash: false,
        }
    }

    pub fn constraint_map(&self) -> &Arc<ConstraintMap> {
        &self.constraint_map
    }

    /// Register a constraint type under `token`, replacing any earlier registration.
    pub fn add_constraint<C: ConstructConstraint>(&mut self, token: &str) -> &mut Self {
        self.constraint_map.add::<C>(token);
        self
    }

    /// The ordered collection of data sources. Adding to it is visible to every
    /// holder of the routing services.
    pub fn endpoint_data_sources(&self) -> &CompositeEndpointDataSource {
        &self.endpoint_data_sources
    }

    pub fn add_data_source(&mut self, source: Arc<dyn EndpointDataSource>) -> &mut Self {
        self.endpoint_data_sources.add_source(source);
        self
    }
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self::new()
    }
}
