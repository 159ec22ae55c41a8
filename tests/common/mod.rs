//! Shared utilities for integration testing.

use std::sync::{Arc, Mutex};

use endpoint_routing::endpoint::{Endpoint, EndpointMetadataCollection};
use endpoint_routing::{ChangeToken, ChangeTokenSource, EndpointDataSource, EndpointSnapshot, Result};

/// An endpoint with a no-op handler.
pub fn endpoint(name: &str) -> Arc<Endpoint> {
    Arc::new(Endpoint::from_fn(
        |_| async {},
        EndpointMetadataCollection::empty(),
        name,
    ))
}

/// Display names of a snapshot, in order.
#[allow(dead_code)]
pub fn names(snapshot: &EndpointSnapshot) -> Vec<String> {
    snapshot.iter().map(|e| e.display_name().to_string()).collect()
}

/// A data source whose list and token are driven separately, so tests can
/// observe the window between a mutation and its notification.
#[allow(dead_code)]
pub struct ManualSource {
    name: String,
    endpoints: Mutex<EndpointSnapshot>,
    token: Mutex<ChangeTokenSource>,
}

#[allow(dead_code)]
impl ManualSource {
    pub fn new(name: &str, endpoints: Vec<Arc<Endpoint>>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            endpoints: Mutex::new(Arc::new(endpoints)),
            token: Mutex::new(ChangeTokenSource::new()),
        })
    }

    /// Replace the list without notifying anyone.
    pub fn set_endpoints(&self, endpoints: Vec<Arc<Endpoint>>) {
        *self.endpoints.lock().unwrap() = Arc::new(endpoints);
    }

    /// Fire the current token and start a new generation.
    pub fn fire(&self) {
        let previous = std::mem::take(&mut *self.token.lock().unwrap());
        previous.trigger();
    }
}

impl EndpointDataSource for ManualSource {
    fn endpoints(&self) -> Result<EndpointSnapshot> {
        Ok(self.endpoints.lock().unwrap().clone())
    }

    fn change_token(&self) -> ChangeToken {
        self.token.lock().unwrap().token()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
