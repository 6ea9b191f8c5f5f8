//! Node pool domain model

use crate::field::GenericField;
use crate::wrapper::{DomainObject, ResourceWrapper};
use serde::{Deserialize, Serialize};

pub type NodePoolWrapper = ResourceWrapper<NodePool>;
pub type NodePoolField = GenericField<NodePool>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_cluster_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<PoolCapacity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute: Option<PoolCompute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_scaler: Option<AutoScaler>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl DomainObject for NodePool {
    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl NodePool {
    pub fn capacity_mut(&mut self) -> &mut PoolCapacity {
        self.capacity.get_or_insert_with(PoolCapacity::default)
    }

    pub fn compute_mut(&mut self) -> &mut PoolCompute {
        self.compute.get_or_insert_with(PoolCompute::default)
    }

    pub fn instance_types_mut(&mut self) -> &mut PoolInstanceTypes {
        self.compute_mut()
            .instance_types
            .get_or_insert_with(PoolInstanceTypes::default)
    }

    pub fn launch_spec_mut(&mut self) -> &mut PoolLaunchSpecification {
        self.compute_mut()
            .launch_specification
            .get_or_insert_with(PoolLaunchSpecification::default)
    }

    pub fn instance_types(&self) -> Option<&PoolInstanceTypes> {
        self.compute.as_ref()?.instance_types.as_ref()
    }

    pub fn launch_spec(&self) -> Option<&PoolLaunchSpecification> {
        self.compute.as_ref()?.launch_specification.as_ref()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCapacity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolCompute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_types: Option<PoolInstanceTypes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_specification: Option<PoolLaunchSpecification>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInstanceTypes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blacklist: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolLaunchSpecification {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_group_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScaler {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headroom: Option<Headroom>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub down: Option<ScaleDown>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Headroom {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_per_unit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_per_unit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_of_units: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScaleDown {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_periods: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_scale_down_percentage: Option<i64>,
}
