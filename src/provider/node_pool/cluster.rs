//! Pool identity and sizing

use super::domain::{NodePool, NodePoolField};
use crate::error::{HookError, RegistryError};
use crate::field::schema::{suppress_case_diff, validate_non_negative};
use crate::field::{Category, FieldName, FieldsMapBuilder, Schema};
use crate::state::ResourceState;

pub const CATEGORY: Category = Category::new("node_pool");

pub const NAME: FieldName = FieldName::new("name");
pub const CONTROLLER_ID: FieldName = FieldName::new("controller_id");
pub const REGION: FieldName = FieldName::new("region");
pub const MIN_SIZE: FieldName = FieldName::new("min_size");
pub const MAX_SIZE: FieldName = FieldName::new("max_size");
pub const DESIRED_CAPACITY: FieldName = FieldName::new("desired_capacity");
pub const CREATED_AT: FieldName = FieldName::new("created_at");

fn materialize_capacity(pool: &mut NodePool) {
    pool.capacity_mut();
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

pub fn setup(fields: &mut FieldsMapBuilder<NodePool>) -> Result<(), RegistryError> {
    fields.register(
        NodePoolField::new(CATEGORY, NAME, Schema::string().optional())
            .on_read(|w, state, _| match w.view() {
                Some(pool) => state.set(NAME, &pool.name),
                None => Ok(()),
            })
            .on_write(|w, state, _| {
                w.get().name = state.get_str(NAME).map(String::from);
                Ok(())
            }),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            CONTROLLER_ID,
            Schema::string().required().force_new(),
        )
        .on_read(|w, state, _| match w.view() {
            Some(pool) => state.set(CONTROLLER_ID, &pool.controller_cluster_id),
            None => Ok(()),
        })
        .on_create(|w, state, _| {
            w.get().controller_cluster_id = state.get_str(CONTROLLER_ID).map(String::from);
            Ok(())
        })
        .immutable(),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            REGION,
            Schema::string()
                .required()
                .force_new()
                .suppress_diff(suppress_case_diff),
        )
        .on_read(|w, state, _| match w.view() {
            Some(pool) => state.set(REGION, &pool.region),
            None => Ok(()),
        })
        .on_create(|w, state, _| {
            w.get().region = state.get_str(REGION).map(str::to_lowercase);
            Ok(())
        })
        .immutable(),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            MIN_SIZE,
            Schema::int().optional().computed().validate(validate_non_negative),
        )
        .materialize(materialize_capacity)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|p| p.capacity.as_ref()).and_then(|c| c.minimum);
            state.set(MIN_SIZE, &v)
        })
        .on_write(|w, state, _| {
            if let Some(min) = state.get_i64(MIN_SIZE) {
                w.get().capacity_mut().minimum = Some(min);
            }
            Ok(())
        }),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            MAX_SIZE,
            Schema::int().optional().computed().validate(validate_non_negative),
        )
        .materialize(materialize_capacity)
        .check(check_bounds)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|p| p.capacity.as_ref()).and_then(|c| c.maximum);
            state.set(MAX_SIZE, &v)
        })
        .on_write(|w, state, _| {
            if let Some(max) = state.get_i64(MAX_SIZE) {
                w.get().capacity_mut().maximum = Some(max);
            }
            Ok(())
        }),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            DESIRED_CAPACITY,
            Schema::int().optional().computed().validate(validate_non_negative),
        )
        .materialize(materialize_capacity)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|p| p.capacity.as_ref()).and_then(|c| c.target);
            state.set(DESIRED_CAPACITY, &v)
        })
        .on_write(|w, state, _| {
            if let Some(target) = state.get_i64(DESIRED_CAPACITY) {
                w.get().capacity_mut().target = Some(target);
            }
            Ok(())
        }),
    )?;

    fields.register(
        NodePoolField::new(CATEGORY, CREATED_AT, Schema::string().computed()).on_read(
            |w, state, _| match w.view() {
                Some(pool) => state.set(CREATED_AT, &pool.created_at),
                None => Ok(()),
            },
        ),
    )?;

    Ok(())
}
