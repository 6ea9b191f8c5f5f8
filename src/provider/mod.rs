//! Provider
//!
//! Registry of every resource kind this crate implements, keyed by
//! resource type and built once per process.
//!
//! # Resource kinds
//!
//! - [`compute_group`] - elastic compute groups
//! - [`node_pool`] - worker pools attached to a controller cluster

pub mod compute_group;
pub mod node_pool;

use crate::client::ApiClient;
use crate::error::RegistryError;
use crate::field::ResourceSchema;
use crate::resource::{HttpResourceApi, ResourceHandler};
use std::collections::BTreeMap;
use std::sync::Arc;

/// All resource kinds backed by one API client
pub struct Provider {
    resources: BTreeMap<&'static str, Arc<dyn ResourceHandler>>,
}

impl Provider {
    /// Build every resource kind over the REST API
    pub fn new(client: ApiClient) -> Result<Self, RegistryError> {
        let mut provider = Self {
            resources: BTreeMap::new(),
        };

        provider.register(Arc::new(compute_group::resource(Arc::new(
            HttpResourceApi::new(client.clone(), compute_group::ENDPOINT),
        ))?))?;
        provider.register(Arc::new(node_pool::resource(Arc::new(
            HttpResourceApi::new(client, node_pool::ENDPOINT),
        ))?))?;

        tracing::debug!("provider ready with {} resource kinds", provider.resources.len());
        Ok(provider)
    }

    /// Empty provider; kinds are added with [`Provider::register`]
    pub fn empty() -> Self {
        Self {
            resources: BTreeMap::new(),
        }
    }

    pub fn register(&mut self, resource: Arc<dyn ResourceHandler>) -> Result<(), RegistryError> {
        let kind = resource.resource_type();
        if self.resources.contains_key(kind) {
            return Err(RegistryError::DuplicateResource(kind));
        }
        self.resources.insert(kind, resource);
        Ok(())
    }

    pub fn resource(&self, kind: &str) -> Option<Arc<dyn ResourceHandler>> {
        self.resources.get(kind).cloned()
    }

    /// Resource kinds in sorted order
    pub fn kinds(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    /// Schema of every resource kind
    pub fn schema(&self) -> Vec<ResourceSchema> {
        self.resources.values().map(|r| r.schema()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ApiSettings;
    use std::time::Duration;

    fn client() -> ApiClient {
        ApiClient::new(&ApiSettings {
            base_url: "http://localhost:1".to_string(),
            token: None,
            account: None,
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn test_provider_lists_kinds() {
        let provider = Provider::new(client()).unwrap();
        assert_eq!(provider.kinds(), vec!["compute_group", "node_pool"]);
        assert!(provider.resource("compute_group").is_some());
        assert!(provider.resource("unknown").is_none());
        assert_eq!(provider.schema().len(), 2);
    }

    #[test]
    fn test_duplicate_kind_rejected() {
        let mut provider = Provider::empty();
        let api = Arc::new(HttpResourceApi::new(client(), node_pool::ENDPOINT));
        provider
            .register(Arc::new(node_pool::resource(api.clone()).unwrap()))
            .unwrap();
        let err = provider
            .register(Arc::new(node_pool::resource(api).unwrap()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateResource("node_pool")));
    }
}
