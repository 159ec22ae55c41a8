//! Endpoint metadata.
//!
//! Metadata entries are arbitrary typed values. Lookup is by type; when several
//! entries share a type the last one is the most significant.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::routing::RouteConstraint;

type MetadataItem = Arc<dyn Any + Send + Sync>;

/// Ordered, immutable metadata attached to an endpoint.
#[derive(Clone, Default)]
pub struct EndpointMetadataCollection {
    items: Arc<Vec<MetadataItem>>,
}

impl EndpointMetadataCollection {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(items: Vec<MetadataItem>) -> Self {
        Self {
            items: Arc::new(items),
        }
    }

    /// Start a collection from a single entry.
    pub fn single<T: Any + Send + Sync>(item: T) -> Self {
        Self::new(vec![Arc::new(item)])
    }

    /// Return a new collection with `item` appended (highest precedence).
    pub fn with<T: Any + Send + Sync>(&self, item: T) -> Self {
        let mut items = Vec::with_capacity(self.items.len() + 1);
        items.extend(self.items.iter().cloned());
        items.push(Arc::new(item) as MetadataItem);
        Self::new(items)
    }

    /// Most significant entry of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.items.iter().rev().find_map(|item| item.downcast_ref::<T>())
    }

    /// Earliest entry of type `T`.
    pub fn first<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.items.iter().find_map(|item| item.downcast_ref::<T>())
    }

    /// Every entry of type `T`, in registration order.
    pub fn get_ordered<T: Any + Send + Sync>(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().filter_map(|item| item.downcast_ref::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Any + Send + Sync)> + '_ {
        self.items.iter().map(|item| item.as_ref())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Debug for EndpointMetadataCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointMetadataCollection")
            .field("len", &self.items.len())
            .finish()
    }
}

/// The route template an endpoint was declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePatternMetadata(pub String);

/// Stable endpoint name used for link generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointNameMetadata(pub String);

/// HTTP methods an endpoint accepts. Empty means any method.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpMethodMetadata {
    methods: Vec<String>,
}

impl HttpMethodMetadata {
    pub fn new<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            methods: methods
                .into_iter()
                .map(|m| m.into().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    pub fn accepts(&self, method: &str) -> bool {
        self.methods.is_empty() || self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }
}

/// Constraints resolved for each route parameter at table build time.
#[derive(Debug, Clone, Default)]
pub struct RouteConstraintsMetadata {
    pub constraints: Vec<(String, Arc<dyn RouteConstraint>)>,
}

impl RouteConstraintsMetadata {
    pub fn for_parameter<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Arc<dyn RouteConstraint>> + 'a {
        self.constraints
            .iter()
            .filter(move |(parameter, _)| parameter.eq_ignore_ascii_case(name))
            .map(|(_, constraint)| constraint)
    }
}
