//! Strategy attributes

use super::domain::{ComputeGroup, ComputeGroupField};
use crate::error::{HookError, RegistryError};
use crate::field::schema::{suppress_numeric_diff, validate_non_negative, validate_percentage};
use crate::field::{Category, FieldName, FieldsMapBuilder, Schema};
use crate::state::ResourceState;
use serde_json::json;

pub const CATEGORY: Category = Category::new("strategy");

pub const SPOT_PERCENTAGE: FieldName = FieldName::new("spot_percentage");
pub const ONDEMAND_COUNT: FieldName = FieldName::new("ondemand_count");
pub const DRAINING_TIMEOUT: FieldName = FieldName::new("draining_timeout");
pub const FALLBACK_TO_ONDEMAND: FieldName = FieldName::new("fallback_to_ondemand");
pub const UTILIZE_RESERVED_INSTANCES: FieldName = FieldName::new("utilize_reserved_instances");

fn materialize(group: &mut ComputeGroup) {
    group.strategy_mut();
}

fn check_exclusive(state: &ResourceState) -> Result<(), HookError> {
    if state.get(SPOT_PERCENTAGE).is_some() && state.get(ONDEMAND_COUNT).is_some() {
        return Err(HookError::invalid(
            "spot_percentage conflicts with ondemand_count",
        ));
    }
    Ok(())
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            SPOT_PERCENTAGE,
            Schema::float()
                .optional()
                .validate(validate_percentage)
                .suppress_diff(suppress_numeric_diff),
        )
        .materialize(materialize)
        .check(check_exclusive)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.strategy.as_ref()).and_then(|s| s.risk);
            state.set(SPOT_PERCENTAGE, &v)
        })
        .on_write(|w, state, _| {
            if let Some(risk) = state.get_f64(SPOT_PERCENTAGE) {
                w.get().strategy_mut().risk = Some(risk);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            ONDEMAND_COUNT,
            Schema::int().optional().validate(validate_non_negative),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.strategy.as_ref()).and_then(|s| s.on_demand_count);
            state.set(ONDEMAND_COUNT, &v)
        })
        .on_write(|w, state, _| {
            if let Some(count) = state.get_i64(ONDEMAND_COUNT) {
                w.get().strategy_mut().on_demand_count = Some(count);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            DRAINING_TIMEOUT,
            Schema::int()
                .optional()
                .computed()
                .validate(validate_non_negative),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.strategy.as_ref()).and_then(|s| s.draining_timeout);
            state.set(DRAINING_TIMEOUT, &v)
        })
        .on_write(|w, state, _| {
            if let Some(timeout) = state.get_i64(DRAINING_TIMEOUT) {
                w.get().strategy_mut().draining_timeout = Some(timeout);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            FALLBACK_TO_ONDEMAND,
            Schema::bool().optional().default(json!(true)),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.strategy.as_ref()).and_then(|s| s.fallback_to_od);
            state.set(FALLBACK_TO_ONDEMAND, &v)
        })
        .on_write(|w, state, _| {
            if let Some(fallback) = state.get_bool(FALLBACK_TO_ONDEMAND) {
                w.get().strategy_mut().fallback_to_od = Some(fallback);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(CATEGORY, UTILIZE_RESERVED_INSTANCES, Schema::bool().optional())
            .materialize(materialize)
            .on_read(|w, state, _| {
                let v = w
                    .view()
                    .and_then(|g| g.strategy.as_ref())
                    .and_then(|s| s.utilize_reserved_instances);
                state.set(UTILIZE_RESERVED_INSTANCES, &v)
            })
            .on_write(|w, state, _| {
                if let Some(utilize) = state.get_bool(UTILIZE_RESERVED_INSTANCES) {
                    w.get().strategy_mut().utilize_reserved_instances = Some(utilize);
                }
                Ok(())
            }),
    )?;

    Ok(())
}
