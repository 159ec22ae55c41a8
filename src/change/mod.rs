//! Change notification subsystem.
//!
//! # Data Flow
//! ```text
//! Producer (data source) owns a ChangeTokenSource per generation:
//!     token() → ChangeToken handed to observers
//!     mutation → swap in a new source → trigger() the old one
//!
//! Observer:
//!     register_callback(f)  (one shot)
//!     or on_change(producer, consumer)  (re-registers after every fire)
//!     or changed().await
//! ```
//!
//! # Design Decisions
//! - Tokens fire at most once; re-subscription is explicit
//! - Callbacks are dropped after firing, so listeners never accumulate across generations
//! - Observers must tolerate at-least-once delivery per generation

pub mod subscription;
pub mod token;

pub use subscription::{on_change, ChangeSubscription};
pub use token::{ChangeRegistration, ChangeToken, ChangeTokenSource};
