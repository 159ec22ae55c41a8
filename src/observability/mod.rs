//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing core produces:
//!     → tracing events (source added/removed, snapshot rebuilt, change fired)
//!     → metrics.rs (rebuild counters, endpoint and source gauges)
//!
//! Host binary consumes:
//!     → logging.rs (subscriber: pretty or JSON, EnvFilter)
//!     → metrics.rs (optional Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Structured fields over formatted strings
//! - Metrics are cheap facade calls on the change path, never on the read fast path

pub mod logging;
pub mod metrics;
