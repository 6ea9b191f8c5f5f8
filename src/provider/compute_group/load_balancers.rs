//! Load balancer attachments
//!
//! A set of `{type, balancer_id, target_set_id, auto_weight}` blocks stored
//! under `compute.launchSpecification.loadBalancersConfig`.

use super::domain::{ComputeGroup, ComputeGroupField, LoadBalancer, LoadBalancersConfig};
use crate::error::{HookError, RegistryError};
use crate::field::nested::{expand_set, flatten_set, normalize_set, Attrs, NestedBlock};
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use serde_json::{Map, Value};

pub const CATEGORY: Category = Category::new("load_balancers");

pub const LOAD_BALANCERS: FieldName = FieldName::new("load_balancers");

pub const TYPE: FieldName = FieldName::new("type");
pub const BALANCER_ID: FieldName = FieldName::new("balancer_id");
pub const TARGET_SET_ID: FieldName = FieldName::new("target_set_id");
pub const AUTO_WEIGHT: FieldName = FieldName::new("auto_weight");

const BALANCER_TYPES: [&str; 3] = ["CLASSIC", "TARGET_GROUP", "MULTAI_TARGET_SET"];

impl NestedBlock for LoadBalancer {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        let kind = attrs.required_str(TYPE)?;
        if !BALANCER_TYPES.contains(&kind) {
            return Err(HookError::invalid(format!(
                "unsupported load balancer type {}",
                kind
            )));
        }

        let balancer = LoadBalancer {
            kind: kind.to_string(),
            balancer_id: attrs.optional_str(BALANCER_ID)?.unwrap_or_default().to_string(),
            target_set_id: attrs
                .optional_str(TARGET_SET_ID)?
                .unwrap_or_default()
                .to_string(),
            auto_weight: attrs.optional_bool(AUTO_WEIGHT)?.unwrap_or(false),
        };

        if balancer.balancer_id.is_empty() {
            return Err(HookError::MissingSubField(BALANCER_ID));
        }
        if balancer.kind == "MULTAI_TARGET_SET" && balancer.target_set_id.is_empty() {
            return Err(HookError::MissingSubField(TARGET_SET_ID));
        }
        Ok(balancer)
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(TYPE.to_string(), Value::from(self.kind.as_str()));
        m.insert(BALANCER_ID.to_string(), Value::from(self.balancer_id.as_str()));
        m.insert(TARGET_SET_ID.to_string(), Value::from(self.target_set_id.as_str()));
        m.insert(AUTO_WEIGHT.to_string(), Value::Bool(self.auto_weight));
        m
    }
}

/// Fill omitted sub-fields so configured and observed sets hash alike
fn fill_defaults(value: &Value) -> Value {
    let Some(items) = value.as_array() else {
        return value.clone();
    };
    let filled = items
        .iter()
        .map(|item| match item {
            Value::Object(map) => {
                let mut map = map.clone();
                for (name, default) in [
                    (BALANCER_ID, Value::from("")),
                    (TARGET_SET_ID, Value::from("")),
                    (AUTO_WEIGHT, Value::Bool(false)),
                ] {
                    let entry = map.entry(name.to_string()).or_insert(Value::Null);
                    if entry.is_null() {
                        *entry = default;
                    }
                }
                Value::Object(map)
            },
            other => other.clone(),
        })
        .collect();
    Value::Array(normalize_set(filled))
}

fn validate_balancer_type(value: &Value) -> Result<(), String> {
    match value.as_str() {
        Some(kind) if BALANCER_TYPES.contains(&kind) => Ok(()),
        _ => Err(format!(
            "expected one of {}, got {}",
            BALANCER_TYPES.join(", "),
            value
        )),
    }
}

fn balancer_schema() -> Schema {
    Schema::set(Elem::block(vec![
        (TYPE, Schema::string().required().validate(validate_balancer_type)),
        (BALANCER_ID, Schema::string().optional()),
        (TARGET_SET_ID, Schema::string().optional()),
        (AUTO_WEIGHT, Schema::bool().optional()),
    ]))
    .optional()
    .normalize(fill_defaults)
}

fn store(group: &mut ComputeGroup, balancers: Vec<LoadBalancer>) {
    group.launch_spec_mut().load_balancers_config = Some(LoadBalancersConfig {
        load_balancers: Some(balancers),
    });
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(CATEGORY, LOAD_BALANCERS, balancer_schema())
            .materialize(|group| {
                group.launch_spec_mut();
            })
            .on_read(|w, state, _| {
                let balancers = w
                    .view()
                    .and_then(|g| g.launch_spec())
                    .and_then(|spec| spec.load_balancers_config.as_ref())
                    .and_then(|config| config.load_balancers.as_deref())
                    .filter(|balancers| !balancers.is_empty());
                match balancers {
                    Some(balancers) => state.set(LOAD_BALANCERS, &flatten_set(balancers)),
                    None => state.set(LOAD_BALANCERS, &Value::Null),
                }
            })
            .on_create(|w, state, _| {
                if let Some(value) = state.get(LOAD_BALANCERS) {
                    store(w.get(), expand_set(value)?);
                }
                Ok(())
            })
            .on_update(|w, state, _| {
                // Removing the attribute detaches every balancer
                let balancers = match state.get(LOAD_BALANCERS) {
                    Some(value) => expand_set(value)?,
                    None => Vec::new(),
                };
                store(w.get(), balancers);
                Ok(())
            }),
    )?;

    Ok(())
}
