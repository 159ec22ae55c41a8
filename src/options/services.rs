//! Routing service wiring.

use std::sync::Arc;

use crate::change::ChangeToken;
use crate::datasource::{CompositeEndpointDataSource, EndpointDataSource, EndpointSnapshot};
use crate::error::Result;
use crate::options::RouteOptions;
use crate::routing::InlineConstraintResolver;

/// Register routing: build [`RouteOptions`], let `configure` adjust them, then freeze.
///
/// Nothing can observe the options before `configure` returns. The returned services
/// share one composite data source; cloning them is cheap.
pub fn add_routing<F>(configure: F) -> RoutingServices
where
    F: FnOnce(&mut RouteOptions),
{
    let mut options = RouteOptions::new();
    configure(&mut options);

    tracing::info!(
        constraints = options.constraint_map().len(),
        data_sources = options.endpoint_data_sources().len(),
        lowercase_urls = options.lowercase_urls,
        append_trailing_slash = options.append_trailing_slash,
        "Routing registered"
    );

    let resolver = InlineConstraintResolver::new(options.constraint_map().clone());
    RoutingServices {
        options: Arc::new(options),
        resolver: Arc::new(resolver),
    }
}

/// The process-wide routing services.
#[derive(Debug, Clone)]
pub struct RoutingServices {
    options: Arc<RouteOptions>,
    resolver: Arc<InlineConstraintResolver>,
}

impl RoutingServices {
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    /// The composite over every registered data source.
    pub fn endpoint_data_source(&self) -> &CompositeEndpointDataSource {
        self.options.endpoint_data_sources()
    }

    pub fn constraint_resolver(&self) -> &Arc<InlineConstraintResolver> {
        &self.resolver
    }

    pub fn endpoint_view(&self) -> EndpointView {
        EndpointView {
            source: self.options.endpoint_data_sources().clone(),
        }
    }
}

/// Read side handed to the matcher: the current endpoints plus a way to wait for the
/// next generation.
#[derive(Debug, Clone)]
pub struct EndpointView {
    source: CompositeEndpointDataSource,
}

impl EndpointView {
    pub fn current_endpoints(&self) -> Result<EndpointSnapshot> {
        self.source.endpoints()
    }

    pub fn change_token(&self) -> ChangeToken {
        self.source.change_token()
    }

    /// The current snapshot together with a token that fires once it is stale.
    ///
    /// The token is taken before the snapshot is read, so a change landing in
    /// between fires the returned token instead of going unnoticed.
    pub fn current_with_token(&self) -> Result<(EndpointSnapshot, ChangeToken)> {
        let token = self.source.change_token();
        let snapshot = self.source.endpoints()?;
        Ok((snapshot, token))
    }

    /// Resolve once the endpoints change after this call, then return the new snapshot.
    pub async fn wait_for_change(&self) -> Result<EndpointSnapshot> {
        self.source.change_token().changed().await;
        self.source.endpoints()
    }
}
