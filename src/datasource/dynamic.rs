//! Mutable endpoint list for modules that change their endpoints at runtime.

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;

use crate::change::{ChangeToken, ChangeTokenSource};
use crate::datasource::{EndpointDataSource, EndpointSnapshot};
use crate::endpoint::Endpoint;
use crate::error::Result;

/// A data source whose endpoint list can be replaced or edited after startup.
///
/// Reads are lock-free. Writers are serialized; each write publishes a new
/// snapshot and then fires the generation's token.
pub struct DynamicEndpointDataSource {
    name: String,
    snapshot: ArcSwap<Vec<Arc<Endpoint>>>,
    /// Also serializes writers.
    token: Mutex<ChangeTokenSource>,
}

impl DynamicEndpointDataSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_endpoints(name, Vec::new())
    }

    pub fn with_endpoints(name: impl Into<String>, endpoints: Vec<Arc<Endpoint>>) -> Self {
        Self {
            name: name.into(),
            snapshot: ArcSwap::from_pointee(endpoints),
            token: Mutex::new(ChangeTokenSource::new()),
        }
    }

    /// Apply `edit` to a copy of the current list. Publishes and fires only when
    /// `edit` returns true.
    pub fn update<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut Vec<Arc<Endpoint>>) -> bool,
    {
        let previous = {
            let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
            let mut endpoints = Vec::clone(&self.snapshot.load());
            if !edit(&mut endpoints) {
                return false;
            }
            let count = endpoints.len();
            self.snapshot.store(Arc::new(endpoints));
            tracing::debug!(source = %self.name, endpoints = count, "Endpoint data source updated");
            std::mem::take(&mut *token)
        };
        previous.trigger();
        true
    }

    /// Replace every endpoint.
    pub fn replace(&self, endpoints: Vec<Arc<Endpoint>>) {
        self.update(|current| {
            *current = endpoints;
            true
        });
    }

    pub fn push(&self, endpoint: Arc<Endpoint>) {
        self.update(|current| {
            current.push(endpoint);
            true
        });
    }

    /// Remove endpoints with the given display name. Returns how many were removed.
    pub fn remove_by_name(&self, display_name: &str) -> usize {
        let mut removed = 0;
        self.update(|current| {
            let before = current.len();
            current.retain(|e| e.display_name() != display_name);
            removed = before - current.len();
            removed > 0
        });
        removed
    }

    pub fn clear(&self) {
        self.update(|current| {
            let changed = !current.is_empty();
            current.clear();
            changed
        });
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.load().is_empty()
    }
}

impl EndpointDataSource for DynamicEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointSnapshot> {
        Ok(self.snapshot.load_full())
    }

    fn change_token(&self) -> ChangeToken {
        self.token.lock().unwrap_or_else(PoisonError::into_inner).token()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for DynamicEndpointDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicEndpointDataSource")
            .field("name", &self.name)
            .field("endpoints", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointMetadataCollection;

    fn endpoint(name: &str) -> Arc<Endpoint> {
        Arc::new(Endpoint::from_fn(|_| async {}, EndpointMetadataCollection::empty(), name))
    }

    #[test]
    fn test_mutation_fires_token_after_publishing() {
        let source = Arc::new(DynamicEndpointDataSource::new("module"));
        let token = source.change_token();

        let observed = Arc::new(Mutex::new(None));
        let (s, o) = (source.clone(), observed.clone());
        let _registration = token.register_callback(move || {
            *o.lock().unwrap() = Some(s.endpoints().unwrap().len());
        });

        source.push(endpoint("a"));
        assert!(token.has_changed());
        assert_eq!(*observed.lock().unwrap(), Some(1));
        assert!(!source.change_token().has_changed());
    }

    #[test]
    fn test_old_snapshot_is_unchanged() {
        let a = endpoint("a");
        let source = DynamicEndpointDataSource::with_endpoints("module", vec![a.clone()]);
        let before = source.endpoints().unwrap();

        source.push(endpoint("b"));
        assert_eq!(before.len(), 1);
        let after = source.endpoints().unwrap();
        assert_eq!(after.len(), 2);
        assert!(Arc::ptr_eq(&after[0], &a));
    }

    #[test]
    fn test_remove_by_name() {
        let source = DynamicEndpointDataSource::with_endpoints(
            "module",
            vec![endpoint("a"), endpoint("b"), endpoint("a")],
        );
        let token = source.change_token();

        assert_eq!(source.remove_by_name("missing"), 0);
        assert!(!token.has_changed());

        assert_eq!(source.remove_by_name("a"), 2);
        assert!(token.has_changed());
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn test_clear_empty_does_not_fire() {
        let source = DynamicEndpointDataSource::new("module");
        let token = source.change_token();
        source.clear();
        assert!(!token.has_changed());
        assert!(source.is_empty());
    }
}
