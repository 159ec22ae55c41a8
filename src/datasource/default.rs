//! Static endpoint list.

use std::sync::Arc;

use crate::change::ChangeToken;
use crate::datasource::{EndpointDataSource, EndpointSnapshot};
use crate::endpoint::Endpoint;
use crate::error::Result;

/// A data source whose endpoints are fixed at construction.
#[derive(Debug, Clone)]
pub struct DefaultEndpointDataSource {
    name: String,
    endpoints: EndpointSnapshot,
}

impl DefaultEndpointDataSource {
    pub fn new<I>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = Arc<Endpoint>>,
    {
        Self {
            name: "default".to_string(),
            endpoints: Arc::new(endpoints.into_iter().collect()),
        }
    }

    pub fn empty() -> Self {
        Self::new(std::iter::empty())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl EndpointDataSource for DefaultEndpointDataSource {
    fn endpoints(&self) -> Result<EndpointSnapshot> {
        Ok(self.endpoints.clone())
    }

    fn change_token(&self) -> ChangeToken {
        ChangeToken::never()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
