//! Routing subsystem: route values and pluggable constraints.
//!
//! # Data Flow
//! ```text
//! Configuration phase:
//!     ConstraintMap::add(token, type) / add_factory(token, closure)
//!     → constraint_map.rs (token → factory, last registration wins)
//!
//! Route table build:
//!     "/users/{id:int:range(1,100)}"
//!     → resolver.rs (parameter declarations, inline text → token + args)
//!     → constraint_map.rs (factory lookup, instance construction)
//!     → matcher.rs (composite / optional wrapping)
//!
//! Request path:
//!     RouteValueDictionary (values.rs)
//!     → RouteConstraint::matches (constraints.rs built-ins or user types)
//! ```
//!
//! # Design Decisions
//! - Unknown tokens and bad arguments fail at table build time, never per request
//! - Constraint instances are immutable and shared via Arc
//! - Route value keys are case-insensitive

pub mod constraint_map;
pub mod constraints;
pub mod matcher;
pub mod resolver;
pub mod values;

pub use constraint_map::{ConstraintArgs, ConstraintFactory, ConstraintMap, ConstructConstraint};
pub use matcher::{CompositeRouteConstraint, OptionalRouteConstraint, RouteConstraint, RouteDirection};
pub use resolver::{parse_inline_constraint, parse_route_parameters, InlineConstraintResolver, RouteParameter};
pub use values::{RouteValue, RouteValueDictionary};
