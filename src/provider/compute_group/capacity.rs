//! Capacity attributes

use super::domain::{ComputeGroup, ComputeGroupField};
use crate::error::{HookError, RegistryError};
use crate::field::schema::validate_non_negative;
use crate::field::{Category, FieldName, FieldsMapBuilder, Schema};
use crate::state::ResourceState;
use serde_json::json;

pub const CATEGORY: Category = Category::new("capacity");

pub const MIN_SIZE: FieldName = FieldName::new("min_size");
pub const MAX_SIZE: FieldName = FieldName::new("max_size");
pub const DESIRED_CAPACITY: FieldName = FieldName::new("desired_capacity");
pub const CAPACITY_UNIT: FieldName = FieldName::new("capacity_unit");

fn materialize(group: &mut ComputeGroup) {
    group.capacity_mut();
}

fn check_bounds(state: &ResourceState) -> Result<(), HookError> {
    if let (Some(min), Some(max)) = (state.get_i64(MIN_SIZE), state.get_i64(MAX_SIZE)) {
        if max < min {
            return Err(HookError::invalid(format!(
                "max_size ({}) is lower than min_size ({})",
                max, min
            )));
        }
    }
    Ok(())
}

fn check_desired(state: &ResourceState) -> Result<(), HookError> {
    if let (Some(target), Some(min), Some(max)) = (
        state.get_i64(DESIRED_CAPACITY),
        state.get_i64(MIN_SIZE),
        state.get_i64(MAX_SIZE),
    ) {
        if target < min || target > max {
            return Err(HookError::invalid(format!(
                "desired_capacity ({}) must be between {} and {}",
                target, min, max
            )));
        }
    }
    Ok(())
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            MIN_SIZE,
            Schema::int().required().validate(validate_non_negative),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.capacity.as_ref()).and_then(|c| c.minimum);
            state.set(MIN_SIZE, &v)
        })
        .on_write(|w, state, _| {
            w.get().capacity_mut().minimum = state.get_i64(MIN_SIZE);
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            MAX_SIZE,
            Schema::int().required().validate(validate_non_negative),
        )
        .materialize(materialize)
        .check(check_bounds)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.capacity.as_ref()).and_then(|c| c.maximum);
            state.set(MAX_SIZE, &v)
        })
        .on_write(|w, state, _| {
            w.get().capacity_mut().maximum = state.get_i64(MAX_SIZE);
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            DESIRED_CAPACITY,
            Schema::int().required().validate(validate_non_negative),
        )
        .materialize(materialize)
        .check(check_desired)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.capacity.as_ref()).and_then(|c| c.target);
            state.set(DESIRED_CAPACITY, &v)
        })
        .on_write(|w, state, _| {
            w.get().capacity_mut().target = state.get_i64(DESIRED_CAPACITY);
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            CAPACITY_UNIT,
            Schema::string()
                .optional()
                .force_new()
                .default(json!("instance"))
                .validate(|v| match v.as_str() {
                    Some("instance" | "weight") => Ok(()),
                    _ => Err(format!("expected \"instance\" or \"weight\", got {}", v)),
                }),
        )
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.capacity.as_ref()).and_then(|c| c.unit.as_ref());
            state.set(CAPACITY_UNIT, &v)
        })
        .on_create(|w, state, _| {
            if let Some(unit) = state.get_str(CAPACITY_UNIT) {
                w.get().capacity_mut().unit = Some(unit.to_string());
            }
            Ok(())
        })
        .immutable(),
    )?;

    Ok(())
}
