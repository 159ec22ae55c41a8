//! Turning declared endpoints into [`Endpoint`] values.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::config::loader::ConfigError;
use crate::config::schema::EndpointConfig;
use crate::config::validation::ValidationError;
use crate::endpoint::{
    request_delegate, Endpoint, EndpointMetadataCollection, EndpointNameMetadata, HttpMethodMetadata,
    RequestDelegate, RouteConstraintsMetadata, RoutePatternMetadata,
};
use crate::routing::InlineConstraintResolver;

/// Named request delegates that configuration can refer to.
#[derive(Clone, Default)]
pub struct HandlerMap {
    handlers: HashMap<String, RequestDelegate>,
}

impl HandlerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// `noop` does nothing; `log` records the request at info level.
    pub fn with_builtins() -> Self {
        let mut map = Self::new();
        map.insert("noop", request_delegate(|_| async {}));
        map.insert(
            "log",
            request_delegate(|ctx| async move {
                tracing::info!(method = %ctx.method, path = %ctx.path, "Request dispatched");
            }),
        );
        map
    }

    pub fn insert(&mut self, name: impl Into<String>, handler: RequestDelegate) -> Option<RequestDelegate> {
        self.handlers.insert(name.into(), handler)
    }

    pub fn get(&self, name: &str) -> Option<&RequestDelegate> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}

impl fmt::Debug for HandlerMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("HandlerMap").field("handlers", &names).finish()
    }
}

/// Build one endpoint per declaration, in declaration order.
///
/// Metadata order: pattern, name, methods, constraints.
pub fn build_endpoints(
    configs: &[EndpointConfig],
    handlers: &HandlerMap,
    resolver: &InlineConstraintResolver,
) -> Result<Vec<Arc<Endpoint>>, ConfigError> {
    configs
        .iter()
        .map(|config| {
            let handler = handlers.get(&config.handler).ok_or_else(|| {
                ConfigError::Validation(vec![ValidationError::UnknownHandler {
                    name: config.name.clone(),
                    handler: config.handler.clone(),
                }])
            })?;
            let constraints = resolver.resolve_pattern(&config.pattern)?;

            let metadata = EndpointMetadataCollection::single(RoutePatternMetadata(config.pattern.clone()))
                .with(EndpointNameMetadata(config.name.clone()))
                .with(HttpMethodMetadata::new(config.methods.iter().cloned()))
                .with(RouteConstraintsMetadata { constraints });

            Ok(Arc::new(Endpoint::new(handler.clone(), metadata, config.name.clone())))
        })
        .collect()
}
