//! Endpoint data sources.
//!
//! # Data Flow
//! ```text
//! Providers (one per module):
//!     default.rs   fixed list, never changes
//!     dynamic.rs   mutable list (feature modules, config reloads)
//!         → endpoints(): immutable snapshot of the current generation
//!         → change_token(): fires once when that snapshot goes stale
//!
//! composite.rs:
//!     [S1, S2, ...] in registration order
//!     → concatenated snapshot, cached until any constituent fires
//!     → one outward change token per generation
//! ```
//!
//! # Design Decisions
//! - Capability trait, not a hierarchy: new provider kinds never touch the composite
//! - Snapshots are `Arc<Vec<Arc<Endpoint>>>`; readers never see a list being built
//! - A provider publishes its new snapshot before firing its token

pub mod composite;
pub mod default;
pub mod dynamic;

use std::sync::Arc;

use crate::change::ChangeToken;
use crate::endpoint::Endpoint;
use crate::error::Result;

pub use composite::CompositeEndpointDataSource;
pub use default::DefaultEndpointDataSource;
pub use dynamic::DynamicEndpointDataSource;

/// One immutable generation of endpoints.
pub type EndpointSnapshot = Arc<Vec<Arc<Endpoint>>>;

/// Trait for anything that contributes endpoints.
pub trait EndpointDataSource: Send + Sync {
    /// The current snapshot. Never a mix of two generations.
    fn endpoints(&self) -> Result<EndpointSnapshot>;

    /// Token that fires when the snapshot returned by `endpoints` is stale.
    fn change_token(&self) -> ChangeToken;

    /// Label for logs and metrics.
    fn name(&self) -> &str {
        "anonymous"
    }
}
