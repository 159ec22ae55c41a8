//! Composite endpoint data source.
//!
//! # Responsibilities
//! - Present an ordered set of data sources as one source
//! - Cache the concatenated snapshot until any constituent changes
//! - Fan constituent change tokens into one outward token per generation
//! - Accept constituents added or removed after startup
//!
//! # Data Flow
//! ```text
//! constituent token fires
//!     → on_change consumer: cache := Stale, swap outward token, fire old one
//!     → on_change re-arms on the constituent's next token
//!
//! endpoints()
//!     → cache Ready?  return it
//!     → Stale: concatenate under the members read lock
//!     → compare_and_swap(Stale → Ready); lost the race? try again
//! ```
//!
//! # Design Decisions
//! - Recomputation happens on read, never inside a notification; a burst of
//!   fires collapses into one rebuild
//! - A rebuild only publishes if no invalidation landed while it was running,
//!   so a snapshot computed mid-burst is never cached
//! - Constituent errors propagate to the caller and nothing is cached

use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use arc_swap::ArcSwap;

use crate::change::{on_change, ChangeSubscription, ChangeToken, ChangeTokenSource};
use crate::datasource::{EndpointDataSource, EndpointSnapshot};
use crate::error::Result;
use crate::observability::metrics;

/// Rebuild attempts before returning an uncached snapshot.
const MAX_REBUILD_ATTEMPTS: usize = 8;

enum Cached {
    Stale,
    Ready(EndpointSnapshot),
}

struct Member {
    source: Arc<dyn EndpointDataSource>,
    _subscription: ChangeSubscription,
}

struct Shared {
    name: String,
    members: RwLock<Vec<Member>>,
    cache: ArcSwap<Cached>,
    token: Mutex<ChangeTokenSource>,
}

impl Shared {
    /// Mark the cached snapshot stale and fire the current outward token.
    fn invalidate(&self, reason: &str) {
        self.cache.store(Arc::new(Cached::Stale));
        let previous = {
            let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *token)
        };
        tracing::debug!(composite = %self.name, reason = %reason, "Endpoint snapshot invalidated");
        previous.trigger();
    }

    fn collect(&self) -> Result<EndpointSnapshot> {
        let members = self.members.read().unwrap_or_else(PoisonError::into_inner);
        let mut endpoints = Vec::new();
        for member in members.iter() {
            endpoints.extend(member.source.endpoints()?.iter().cloned());
        }
        Ok(Arc::new(endpoints))
    }
}

/// Aggregates data sources in registration order.
///
/// Clones share the same constituents, cache and change token.
#[derive(Clone)]
pub struct CompositeEndpointDataSource {
    shared: Arc<Shared>,
}

impl CompositeEndpointDataSource {
    pub fn new() -> Self {
        Self::named("composite")
    }

    /// An empty composite labelled `name` in logs and metrics. Nested composites
    /// should carry distinct names.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.into(),
                members: RwLock::new(Vec::new()),
                cache: ArcSwap::from_pointee(Cached::Stale),
                token: Mutex::new(ChangeTokenSource::new()),
            }),
        }
    }

    pub fn with_sources<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn EndpointDataSource>>,
    {
        let composite = Self::new();
        for source in sources {
            composite.add_source(source);
        }
        composite
    }

    /// Append a constituent. Its endpoints follow those of every earlier constituent.
    pub fn add_source(&self, source: Arc<dyn EndpointDataSource>) {
        let subscription = subscribe(&self.shared, &source);
        let count = {
            let mut members = self.shared.members.write().unwrap_or_else(PoisonError::into_inner);
            members.push(Member {
                source: source.clone(),
                _subscription: subscription,
            });
            members.len()
        };
        tracing::info!(
            composite = %self.shared.name,
            source = %source.name(),
            sources = count,
            "Endpoint data source added"
        );
        metrics::record_data_sources(&self.shared.name, count);
        self.shared.invalidate("source added");
    }

    /// Remove a constituent by identity. Returns false if it was never added.
    pub fn remove_source<S>(&self, source: &Arc<S>) -> bool
    where
        S: EndpointDataSource + ?Sized,
    {
        let target = Arc::as_ptr(source).cast::<()>();
        let (removed, count) = {
            let mut members = self.shared.members.write().unwrap_or_else(PoisonError::into_inner);
            let position = members
                .iter()
                .position(|m| Arc::as_ptr(&m.source).cast::<()>() == target);
            (position.map(|i| members.remove(i)), members.len())
        };

        let Some(member) = removed else {
            return false;
        };
        tracing::info!(
            composite = %self.shared.name,
            source = %member.source.name(),
            sources = count,
            "Endpoint data source removed"
        );
        drop(member);
        metrics::record_data_sources(&self.shared.name, count);
        self.shared.invalidate("source removed");
        true
    }

    pub fn contains_source<S>(&self, source: &Arc<S>) -> bool
    where
        S: EndpointDataSource + ?Sized,
    {
        let target = Arc::as_ptr(source).cast::<()>();
        self.shared
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|m| Arc::as_ptr(&m.source).cast::<()>() == target)
    }

    /// Constituents in registration order.
    pub fn sources(&self) -> Vec<Arc<dyn EndpointDataSource>> {
        self.shared
            .members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|m| m.source.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.shared.members.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CompositeEndpointDataSource {
    fn default() -> Self {
        Self::new()
    }
}

fn subscribe(shared: &Arc<Shared>, source: &Arc<dyn EndpointDataSource>) -> ChangeSubscription {
    let producer_source = Arc::clone(source);
    let weak: Weak<Shared> = Arc::downgrade(shared);
    let source_name = source.name().to_string();
    on_change(
        move || producer_source.change_token(),
        move || {
            if let Some(shared) = weak.upgrade() {
                metrics::record_change_notification(&shared.name, &source_name);
                shared.invalidate(&source_name);
            }
        },
    )
}

impl EndpointDataSource for CompositeEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointSnapshot> {
        let shared = &self.shared;
        for _ in 0..MAX_REBUILD_ATTEMPTS {
            let current = shared.cache.load_full();
            if let Cached::Ready(snapshot) = &*current {
                return Ok(snapshot.clone());
            }

            let snapshot = shared.collect()?;
            let previous = shared
                .cache
                .compare_and_swap(&current, Arc::new(Cached::Ready(snapshot.clone())));
            if Arc::ptr_eq(&*previous, &current) {
                tracing::debug!(
                    composite = %shared.name,
                    endpoints = snapshot.len(),
                    "Endpoint snapshot rebuilt"
                );
                metrics::record_snapshot_rebuild(&shared.name, snapshot.len());
                return Ok(snapshot);
            }
        }

        tracing::warn!(
            composite = %shared.name,
            attempts = MAX_REBUILD_ATTEMPTS,
            "Endpoint snapshot kept changing during rebuild, returning uncached result"
        );
        shared.collect()
    }

    fn change_token(&self) -> ChangeToken {
        self.shared.token.lock().unwrap_or_else(PoisonError::into_inner).token()
    }

    fn name(&self) -> &str {
        &self.shared.name
    }
}

impl std::fmt::Debug for CompositeEndpointDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.sources().iter().map(|s| s.name().to_string()).collect();
        f.debug_struct("CompositeEndpointDataSource")
            .field("sources", &names)
            .finish()
    }
}
