//! Route constraint evaluation.
//!
//! # Responsibilities
//! - Define the capability every route constraint implements
//! - Combine constraints on one parameter with AND semantics
//! - Treat optional parameters as satisfied when absent
//!
//! # Design Decisions
//! - Missing or empty values never satisfy a value constraint
//! - Values are compared through their invariant text rendering
//! - Constraints must be total over well-formed input; a test double that
//!   leaves `matches` unimplemented panics instead of guessing

use std::fmt;
use std::sync::Arc;

use crate::endpoint::RequestContext;
use crate::routing::values::RouteValueDictionary;

/// Why a constraint is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDirection {
    /// Matching an incoming request URL.
    IncomingRequest,
    /// Generating a URL from route values.
    UrlGeneration,
}

/// Trait for accepting or rejecting a candidate route value.
pub trait RouteConstraint: Send + Sync + fmt::Debug {
    /// Returns true if `values[route_key]` satisfies this constraint.
    fn matches(
        &self,
        request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        direction: RouteDirection,
    ) -> bool;

    /// Fully qualified implementation type, for diagnostics.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Text of a route value, if present.
pub(crate) fn value_text(values: &RouteValueDictionary, route_key: &str) -> Option<String> {
    values.get(route_key).map(|value| value.to_string())
}

/// Combines multiple constraints with AND semantics.
#[derive(Debug, Clone)]
pub struct CompositeRouteConstraint {
    constraints: Vec<Arc<dyn RouteConstraint>>,
}

impl CompositeRouteConstraint {
    pub fn new(constraints: Vec<Arc<dyn RouteConstraint>>) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &[Arc<dyn RouteConstraint>] {
        &self.constraints
    }
}

impl RouteConstraint for CompositeRouteConstraint {
    fn matches(
        &self,
        request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        direction: RouteDirection,
    ) -> bool {
        self.constraints
            .iter()
            .all(|c| c.matches(request, route_key, values, direction))
    }
}

/// Applies the inner constraint only when the parameter has a value.
#[derive(Debug, Clone)]
pub struct OptionalRouteConstraint {
    inner: Arc<dyn RouteConstraint>,
}

impl OptionalRouteConstraint {
    pub fn new(inner: Arc<dyn RouteConstraint>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &Arc<dyn RouteConstraint> {
        &self.inner
    }
}

impl RouteConstraint for OptionalRouteConstraint {
    fn matches(
        &self,
        request: Option<&RequestContext>,
        route_key: &str,
        values: &RouteValueDictionary,
        direction: RouteDirection,
    ) -> bool {
        if !values.contains_key(route_key) {
            return true;
        }
        self.inner.matches(request, route_key, values, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::constraints::{IntRouteConstraint, MinRouteConstraint};

    fn values(id: &str) -> RouteValueDictionary {
        [("id", id)].into_iter().collect()
    }

    #[test]
    fn test_composite_requires_all() {
        let constraint = CompositeRouteConstraint::new(vec![
            Arc::new(IntRouteConstraint),
            Arc::new(MinRouteConstraint::new(10)),
        ]);
        let dir = RouteDirection::IncomingRequest;

        assert!(constraint.matches(None, "id", &values("12"), dir));
        assert!(!constraint.matches(None, "id", &values("9"), dir));
        assert!(!constraint.matches(None, "id", &values("ten"), dir));
    }

    #[test]
    fn test_optional_passes_when_absent() {
        let constraint = OptionalRouteConstraint::new(Arc::new(IntRouteConstraint));
        let dir = RouteDirection::IncomingRequest;

        assert!(constraint.matches(None, "id", &RouteValueDictionary::new(), dir));
        assert!(constraint.matches(None, "id", &values("4"), dir));
        assert!(!constraint.matches(None, "id", &values("x"), dir));
    }

    #[test]
    fn test_type_name_reports_implementation() {
        let constraint: Arc<dyn RouteConstraint> = Arc::new(IntRouteConstraint);
        assert!(constraint.type_name().ends_with("IntRouteConstraint"));
    }
}
