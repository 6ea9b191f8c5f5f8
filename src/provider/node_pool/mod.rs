//! Node Pool
//!
//! A pool of worker nodes attached to an existing controller cluster.
//! Most sizing and compute attributes are optional and computed: when left
//! out, the pool inherits them from the cluster.

pub mod autoscaler;
pub mod cluster;
pub mod compute;
pub mod domain;

pub use domain::{NodePool, NodePoolWrapper};

use crate::error::RegistryError;
use crate::field::{Contributor, FieldsMap};
use crate::resource::{Endpoint, GenericResource, RemoteApi};
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "node_pool";

pub const ENDPOINT: Endpoint = Endpoint {
    collection: "ocean/pool",
    envelope: "pool",
    response_path: "response.items",
};

pub const CONTRIBUTORS: &[Contributor<NodePool>] = &[
    Contributor::new("cluster", cluster::setup),
    Contributor::new("compute", compute::setup),
    Contributor::new("autoscaler", autoscaler::setup),
];

pub fn fields() -> Result<FieldsMap<NodePool>, RegistryError> {
    FieldsMap::build(CONTRIBUTORS)
}

pub fn resource(api: Arc<dyn RemoteApi<NodePool>>) -> Result<GenericResource<NodePool>, RegistryError> {
    Ok(GenericResource::new(RESOURCE_TYPE, fields()?, api))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Context;
    use crate::state::ResourceState;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Fills in cluster-inherited attributes the way the remote side does
    #[derive(Default)]
    struct Inheriting {
        stored: Mutex<Option<NodePool>>,
        updates: Mutex<usize>,
    }

    #[async_trait]
    impl RemoteApi<NodePool> for Inheriting {
        async fn create(&self, object: &NodePool, _ctx: &Context) -> Result<NodePool> {
            let mut created = object.clone();
            created.id = Some("pool-1".to_string());
            created.compute_mut().subnet_ids.get_or_insert_with(|| vec!["subnet-a".to_string()]);
            created.launch_spec_mut().image_id.get_or_insert_with(|| "ami-cluster".to_string());
            *self.stored.lock().unwrap() = Some(created.clone());
            Ok(created)
        }

        async fn read(&self, _id: &str, _ctx: &Context) -> Result<Option<NodePool>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn update(&self, _id: &str, object: &NodePool, _ctx: &Context) -> Result<NodePool> {
            *self.updates.lock().unwrap() += 1;
            let mut stored = self.stored.lock().unwrap();
            let current = stored.get_or_insert_with(NodePool::default);
            if object.auto_scaler.is_some() {
                current.auto_scaler = object.auto_scaler.clone();
            }
            Ok(current.clone())
        }

        async fn delete(&self, _id: &str, _ctx: &Context) -> Result<()> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    #[test]
    fn test_fields_compose() {
        let fields = fields().unwrap();
        assert!(fields.get("whitelist").is_some());
        assert!(fields.get("autoscaler").is_some());
    }

    #[test]
    fn test_inherited_attributes_are_not_drift() {
        let api = Arc::new(Inheriting::default());
        let resource = resource(api.clone()).unwrap();
        let config = json!({"controller_id": "o-123", "region": "us-west-2"});
        let mut state = ResourceState::from_values(config.as_object().cloned().unwrap());

        tokio_test::block_on(resource.create(&mut state)).unwrap();
        assert_eq!(state.get_str(compute::IMAGE_ID), Some("ami-cluster"));

        let mut next = ResourceState::existing(
            "pool-1",
            config.as_object().cloned().unwrap(),
            state.prior().clone(),
        );
        tokio_test::block_on(resource.update(&mut next)).unwrap();
        let stored = api.stored.lock().unwrap().clone().unwrap();
        assert_eq!(
            stored.launch_spec().and_then(|s| s.image_id.as_deref()),
            Some("ami-cluster")
        );
        assert!(stored.auto_scaler.is_none());
    }

    #[tokio::test]
    async fn test_removing_autoscaler_disables_it() {
        let api = Arc::new(Inheriting::default());
        let resource = resource(api.clone()).unwrap();
        let config = json!({
            "controller_id": "o-123",
            "region": "us-west-2",
            "autoscaler": [{"is_enabled": true, "cooldown": 60}],
        });
        let mut state = ResourceState::from_values(config.as_object().cloned().unwrap());
        resource.create(&mut state).await.unwrap();

        let trimmed = json!({"controller_id": "o-123", "region": "us-west-2"});
        let mut next = ResourceState::existing(
            "pool-1",
            trimmed.as_object().cloned().unwrap(),
            state.prior().clone(),
        );
        resource.update(&mut next).await.unwrap();

        let stored = api.stored.lock().unwrap().clone().unwrap();
        assert_eq!(stored.auto_scaler.and_then(|a| a.is_enabled), Some(false));
        assert!(next.get(autoscaler::AUTOSCALER).is_none());

        // Applying the trimmed configuration again is a no-op
        let mut again = ResourceState::existing(
            "pool-1",
            trimmed.as_object().cloned().unwrap(),
            next.prior().clone(),
        );
        resource.update(&mut again).await.unwrap();
        assert_eq!(*api.updates.lock().unwrap(), 1);
    }
}
