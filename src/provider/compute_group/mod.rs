//! Compute Group
//!
//! An elastic group of compute instances. Each sub-resource module
//! contributes its attributes; [`CONTRIBUTORS`] fixes their order.
//!
//! # Sub-resources
//!
//! - [`group`] - name, description, region, product, timestamps
//! - [`capacity`] - min/max/desired sizes
//! - [`strategy`] - spot/on-demand mix and draining
//! - [`instance_types`] - on-demand, spot and sizing lists
//! - [`launch_configuration`] - image, security groups, tags
//! - [`load_balancers`] - balancer attachments
//! - [`scheduling`] - scheduled tasks

pub mod capacity;
pub mod domain;
pub mod group;
pub mod instance_types;
pub mod launch_configuration;
pub mod load_balancers;
pub mod scheduling;
pub mod strategy;

pub use domain::{ComputeGroup, ComputeGroupWrapper};

use crate::error::RegistryError;
use crate::field::{Contributor, FieldsMap};
use crate::resource::{Endpoint, GenericResource, RemoteApi};
use std::sync::Arc;

pub const RESOURCE_TYPE: &str = "compute_group";

pub const ENDPOINT: Endpoint = Endpoint {
    collection: "compute/group",
    envelope: "group",
    response_path: "response.items",
};

pub const CONTRIBUTORS: &[Contributor<ComputeGroup>] = &[
    Contributor::new("group", group::setup),
    Contributor::new("capacity", capacity::setup),
    Contributor::new("strategy", strategy::setup),
    Contributor::new("instance_types", instance_types::setup),
    Contributor::new("launch_configuration", launch_configuration::setup),
    Contributor::new("load_balancers", load_balancers::setup),
    Contributor::new("scheduling", scheduling::setup),
];

pub fn fields() -> Result<FieldsMap<ComputeGroup>, RegistryError> {
    FieldsMap::build(CONTRIBUTORS)
}

/// Build the resource over any remote implementation
pub fn resource(
    api: Arc<dyn RemoteApi<ComputeGroup>>,
) -> Result<GenericResource<ComputeGroup>, RegistryError> {
    Ok(GenericResource::new(RESOURCE_TYPE, fields()?, api))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceError;
    use crate::field::Context;
    use crate::state::ResourceState;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    /// Records what the dispatcher sends and echoes it back with an id
    #[derive(Default)]
    struct Recorder {
        stored: Mutex<Option<ComputeGroup>>,
        sent: Mutex<Vec<ComputeGroup>>,
    }

    #[async_trait]
    impl RemoteApi<ComputeGroup> for Recorder {
        async fn create(&self, object: &ComputeGroup, _ctx: &Context) -> Result<ComputeGroup> {
            self.sent.lock().unwrap().push(object.clone());
            let mut created = object.clone();
            created.id = Some("sig-1".to_string());
            created.created_at = Some("2026-01-01T00:00:00Z".to_string());
            *self.stored.lock().unwrap() = Some(created.clone());
            Ok(created)
        }

        async fn read(&self, _id: &str, _ctx: &Context) -> Result<Option<ComputeGroup>> {
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn update(
            &self,
            _id: &str,
            object: &ComputeGroup,
            _ctx: &Context,
        ) -> Result<ComputeGroup> {
            self.sent.lock().unwrap().push(object.clone());
            let mut stored = self.stored.lock().unwrap();
            let current = stored.get_or_insert_with(ComputeGroup::default);
            if let Some(capacity) = &object.capacity {
                let target = current.capacity_mut();
                if capacity.target.is_some() {
                    target.target = capacity.target;
                }
            }
            if let Some(config) = object.launch_spec().and_then(|s| s.load_balancers_config.clone()) {
                current.launch_spec_mut().load_balancers_config = Some(config);
            }
            Ok(current.clone())
        }

        async fn delete(&self, _id: &str, _ctx: &Context) -> Result<()> {
            *self.stored.lock().unwrap() = None;
            Ok(())
        }
    }

    fn config() -> Map<String, Value> {
        match json!({
            "name": "web",
            "region": "US-East-1",
            "product": "Linux/UNIX",
            "min_size": 1,
            "max_size": 5,
            "desired_capacity": 2,
            "spot_percentage": 100,
            "instance_types_ondemand": "m5.large",
            "instance_types_spot": ["m5.large", "c5.large"],
            "image_id": "ami-123",
            "security_groups": ["sg-1"],
            "load_balancers": [{"type": "CLASSIC", "balancer_id": "lb-1", "auto_weight": true}],
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_contributors_compose_without_clashes() {
        let fields = fields().unwrap();
        assert_eq!(fields.names()[0].as_str(), "name");
        assert!(fields.get("load_balancers").is_some());
        assert!(fields.get("scheduled_task").is_some());
    }

    #[test]
    fn test_schema_lists_every_field() {
        let fields = fields().unwrap();
        let schema = fields.schema(RESOURCE_TYPE);
        assert_eq!(schema.attributes.len(), fields.len());
        assert!(schema.attributes.get("region").unwrap().force_new);
    }

    #[tokio::test]
    async fn test_create_populates_nested_domain() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());

        resource.create(&mut state).await.unwrap();

        assert_eq!(state.id(), Some("sig-1"));
        let sent = api.sent.lock().unwrap()[0].clone();
        assert_eq!(sent.region.as_deref(), Some("us-east-1"));
        assert_eq!(sent.capacity.as_ref().and_then(|c| c.unit.as_deref()), Some("instance"));
        assert_eq!(sent.strategy.as_ref().and_then(|s| s.fallback_to_od), Some(true));
        assert!(sent.scheduling.is_none());
        assert_eq!(
            sent.instance_types().and_then(|t| t.on_demand_sizes.as_ref()),
            None
        );
        assert_eq!(state.get_str(group::CREATED_AT), Some("2026-01-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_unchanged_read_is_not_a_change() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        // Re-apply the original configuration on top of observed state
        let mut next = ResourceState::existing("sig-1", config(), state.prior().clone());
        resource.update(&mut next).await.unwrap();
        assert_eq!(api.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_sends_only_changed_capacity() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        let mut values = config();
        values.insert("desired_capacity".to_string(), json!(4));
        let mut next = ResourceState::existing("sig-1", values, state.prior().clone());
        resource.update(&mut next).await.unwrap();

        let sent = api.sent.lock().unwrap()[1].clone();
        assert_eq!(sent.capacity.as_ref().and_then(|c| c.target), Some(4));
        assert!(sent.name.is_none());
        assert!(sent.compute.is_none());
        assert_eq!(next.get_i64(capacity::DESIRED_CAPACITY), Some(4));
    }

    #[tokio::test]
    async fn test_region_change_is_rejected() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        let mut values = config();
        values.insert("region".to_string(), json!("eu-west-1"));
        let mut next = ResourceState::existing("sig-1", values, state.prior().clone());
        let err = resource.update(&mut next).await.unwrap_err();
        assert!(err.is_immutable());
        assert_eq!(err.field(), Some("region"));
    }

    #[tokio::test]
    async fn test_update_checks_capacity_bounds() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        // Only min_size changes; the bound lives with max_size
        let mut values = config();
        values.insert("min_size".to_string(), json!(10));
        let mut next = ResourceState::existing("sig-1", values, state.prior().clone());
        let err = resource.update(&mut next).await.unwrap_err();

        assert!(matches!(err, ResourceError::Validation { .. }));
        assert_eq!(err.field(), Some("max_size"));
        assert!(err.to_string().contains("max_size (5) is lower than min_size (10)"));
        assert_eq!(api.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_rejects_conflict_from_either_side() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        // spot_percentage is unchanged, ondemand_count is new
        let mut values = config();
        values.insert("ondemand_count".to_string(), json!(1));
        let mut next = ResourceState::existing("sig-1", values, state.prior().clone());
        let err = resource.update(&mut next).await.unwrap_err();

        assert_eq!(err.field(), Some("spot_percentage"));
        assert!(err.to_string().contains("conflicts with ondemand_count"));
        assert_eq!(api.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_removed_balancers_settle_after_one_update() {
        let api = Arc::new(Recorder::default());
        let resource = resource(api.clone()).unwrap();
        let mut state = ResourceState::from_values(config());
        resource.create(&mut state).await.unwrap();

        let mut values = config();
        values.remove("load_balancers");
        let mut next = ResourceState::existing("sig-1", values.clone(), state.prior().clone());
        resource.update(&mut next).await.unwrap();
        assert_eq!(api.sent.lock().unwrap().len(), 2);
        assert!(next.get(load_balancers::LOAD_BALANCERS).is_none());

        let mut again = ResourceState::existing("sig-1", values, next.prior().clone());
        resource.update(&mut again).await.unwrap();
        assert_eq!(api.sent.lock().unwrap().len(), 2);
    }
}
