//! Pool autoscaler
//!
//! A single `autoscaler` block holding nested `headroom` and `down` blocks.

use super::domain::{AutoScaler, Headroom, NodePool, NodePoolField, ScaleDown};
use crate::error::{HookError, RegistryError};
use crate::field::nested::{expand_single, flatten_single, Attrs, NestedBlock};
use crate::field::schema::{validate_non_negative, validate_percentage};
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use serde_json::{Map, Value};

pub const CATEGORY: Category = Category::new("autoscaler");

pub const AUTOSCALER: FieldName = FieldName::new("autoscaler");

pub const IS_ENABLED: FieldName = FieldName::new("is_enabled");
pub const COOLDOWN: FieldName = FieldName::new("cooldown");
pub const HEADROOM: FieldName = FieldName::new("headroom");
pub const DOWN: FieldName = FieldName::new("down");

pub const CPU_PER_UNIT: FieldName = FieldName::new("cpu_per_unit");
pub const MEMORY_PER_UNIT: FieldName = FieldName::new("memory_per_unit");
pub const NUM_OF_UNITS: FieldName = FieldName::new("num_of_units");

pub const EVALUATION_PERIODS: FieldName = FieldName::new("evaluation_periods");
pub const MAX_SCALE_DOWN_PERCENTAGE: FieldName = FieldName::new("max_scale_down_percentage");

fn insert_opt<V: Into<Value>>(map: &mut Map<String, Value>, name: FieldName, value: Option<V>) {
    if let Some(value) = value {
        map.insert(name.to_string(), value.into());
    }
}

impl NestedBlock for Headroom {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        Ok(Headroom {
            cpu_per_unit: attrs.optional_i64(CPU_PER_UNIT)?,
            memory_per_unit: attrs.optional_i64(MEMORY_PER_UNIT)?,
            num_of_units: attrs.optional_i64(NUM_OF_UNITS)?,
        })
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        insert_opt(&mut m, CPU_PER_UNIT, self.cpu_per_unit);
        insert_opt(&mut m, MEMORY_PER_UNIT, self.memory_per_unit);
        insert_opt(&mut m, NUM_OF_UNITS, self.num_of_units);
        m
    }
}

impl NestedBlock for ScaleDown {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        Ok(ScaleDown {
            evaluation_periods: attrs.optional_i64(EVALUATION_PERIODS)?,
            max_scale_down_percentage: attrs.optional_i64(MAX_SCALE_DOWN_PERCENTAGE)?,
        })
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        insert_opt(&mut m, EVALUATION_PERIODS, self.evaluation_periods);
        insert_opt(&mut m, MAX_SCALE_DOWN_PERCENTAGE, self.max_scale_down_percentage);
        m
    }
}

impl NestedBlock for AutoScaler {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        Ok(AutoScaler {
            is_enabled: attrs.optional_bool(IS_ENABLED)?,
            cooldown: attrs.optional_i64(COOLDOWN)?,
            headroom: attrs.optional_block(HEADROOM)?,
            down: attrs.optional_block(DOWN)?,
        })
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        insert_opt(&mut m, IS_ENABLED, self.is_enabled);
        insert_opt(&mut m, COOLDOWN, self.cooldown);
        if self.headroom.is_some() {
            m.insert(HEADROOM.to_string(), flatten_single(self.headroom.as_ref()));
        }
        if self.down.is_some() {
            m.insert(DOWN.to_string(), flatten_single(self.down.as_ref()));
        }
        m
    }
}

/// What update sends when the block is removed
fn disabled() -> AutoScaler {
    AutoScaler {
        is_enabled: Some(false),
        ..AutoScaler::default()
    }
}

fn single_block(attributes: Vec<(FieldName, Schema)>) -> Schema {
    Schema::list(Elem::block(attributes)).optional().max_items(1)
}

fn autoscaler_schema() -> Schema {
    let non_negative = || Schema::int().optional().validate(validate_non_negative);
    single_block(vec![
        (IS_ENABLED, Schema::bool().optional()),
        (COOLDOWN, non_negative()),
        (
            HEADROOM,
            single_block(vec![
                (CPU_PER_UNIT, non_negative()),
                (MEMORY_PER_UNIT, non_negative()),
                (NUM_OF_UNITS, non_negative()),
            ]),
        ),
        (
            DOWN,
            single_block(vec![
                (EVALUATION_PERIODS, non_negative()),
                (
                    MAX_SCALE_DOWN_PERCENTAGE,
                    Schema::int().optional().validate(validate_percentage),
                ),
            ]),
        ),
    ])
}

pub fn setup(fields: &mut FieldsMapBuilder<NodePool>) -> Result<(), RegistryError> {
    fields.register(
        NodePoolField::new(CATEGORY, AUTOSCALER, autoscaler_schema())
            .on_read(|w, state, _| {
                // A bare disabled scaler reads back as no block
                let scaler = w
                    .view()
                    .and_then(|p| p.auto_scaler.as_ref())
                    .filter(|scaler| **scaler != disabled());
                match scaler {
                    Some(scaler) => state.set(AUTOSCALER, &flatten_single(Some(scaler))),
                    None => state.set(AUTOSCALER, &Value::Null),
                }
            })
            .on_create(|w, state, _| {
                if let Some(value) = state.get(AUTOSCALER) {
                    w.get().auto_scaler = expand_single(value)?;
                }
                Ok(())
            })
            .on_update(|w, state, _| {
                // Removing the block disables scaling
                let scaler = match state.get(AUTOSCALER) {
                    Some(value) => expand_single(value)?,
                    None => None,
                };
                w.get().auto_scaler = Some(scaler.unwrap_or_else(disabled));
                Ok(())
            }),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_blocks_expand() {
        let value = json!([{
            "is_enabled": true,
            "cooldown": 300,
            "headroom": [{"cpu_per_unit": 1024, "num_of_units": 2}],
            "down": [{"max_scale_down_percentage": 20}],
        }]);
        let scaler: AutoScaler = expand_single(&value).unwrap().unwrap();
        assert_eq!(scaler.cooldown, Some(300));
        assert_eq!(scaler.headroom.as_ref().and_then(|h| h.cpu_per_unit), Some(1024));
        assert_eq!(scaler.down.as_ref().and_then(|d| d.evaluation_periods), None);
        assert_eq!(flatten_single(Some(&scaler)), value);
    }

    #[test]
    fn test_schema_limits_single_block() {
        let schema = autoscaler_schema();
        assert!(schema
            .check("autoscaler", Some(&json!([{"cooldown": 1}, {"cooldown": 2}])))
            .is_err());
        let violation = schema
            .check(
                "autoscaler",
                Some(&json!([{"down": [{"max_scale_down_percentage": 150}]}])),
            )
            .unwrap_err();
        assert_eq!(violation.path, "autoscaler.0.down.0.max_scale_down_percentage");
    }
}
