//! Endpoints: the units a request is dispatched to.
//!
//! # Responsibilities
//! - Hold the request delegate, metadata and display name of one dispatch target
//! - Provide typed metadata lookup for the matcher and for middleware
//!
//! # Design Decisions
//! - Immutable after construction; shared as `Arc<Endpoint>` so snapshots keep identity
//! - Display names are diagnostic only and may repeat
//! - Metadata order is preserved; later entries take precedence

pub mod metadata;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::routing::RouteValueDictionary;

pub use metadata::{
    EndpointMetadataCollection, EndpointNameMetadata, HttpMethodMetadata, RouteConstraintsMetadata,
    RoutePatternMetadata,
};

/// Future returned by a request delegate.
pub type HandlerFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared request handler.
pub type RequestDelegate = Arc<dyn Fn(RequestContext) -> HandlerFuture + Send + Sync>;

/// Wrap an async function as a [`RequestDelegate`].
pub fn request_delegate<F, Fut>(handler: F) -> RequestDelegate
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |ctx| Box::pin(handler(ctx)))
}

/// The request facts visible to delegates and constraints.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub method: String,
    pub path: String,
    pub route_values: RouteValueDictionary,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            route_values: RouteValueDictionary::new(),
        }
    }
}

/// A dispatch target.
pub struct Endpoint {
    handler: RequestDelegate,
    metadata: EndpointMetadataCollection,
    display_name: String,
}

impl Endpoint {
    pub fn new(
        handler: RequestDelegate,
        metadata: EndpointMetadataCollection,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            handler,
            metadata,
            display_name: display_name.into(),
        }
    }

    /// Build an endpoint directly from an async function.
    pub fn from_fn<F, Fut>(
        handler: F,
        metadata: EndpointMetadataCollection,
        display_name: impl Into<String>,
    ) -> Self
    where
        F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::new(request_delegate(handler), metadata, display_name)
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn metadata(&self) -> &EndpointMetadataCollection {
        &self.metadata
    }

    pub fn request_delegate(&self) -> &RequestDelegate {
        &self.handler
    }

    /// Run the request delegate.
    pub fn invoke(&self, ctx: RequestContext) -> HandlerFuture {
        (self.handler)(ctx)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("display_name", &self.display_name)
            .field("metadata", &self.metadata.len())
            .finish()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name.is_empty() {
            f.write_str("(unnamed endpoint)")
        } else {
            f.write_str(&self.display_name)
        }
    }
}
