//! Instance type attributes
//!
//! The remote API reports the on-demand type either as `ondemand` or, on
//! groups created through the sizing flow, only as the first entry of
//! `onDemandSizes`. Import merges the two.

use super::domain::{ComputeGroup, ComputeGroupField};
use crate::error::{HookError, RegistryError};
use crate::field::nested::string_list;
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use crate::state::ResourceState;

pub const CATEGORY: Category = Category::new("instance_types");

pub const INSTANCE_TYPES_ONDEMAND: FieldName = FieldName::new("instance_types_ondemand");
pub const INSTANCE_TYPES_SPOT: FieldName = FieldName::new("instance_types_spot");
pub const INSTANCE_TYPES_PREFERRED_SPOT: FieldName =
    FieldName::new("instance_types_preferred_spot");
pub const ONDEMAND_SIZES: FieldName = FieldName::new("ondemand_sizes");

fn materialize(group: &mut ComputeGroup) {
    group.instance_types_mut();
}

/// Strings of a configured list, or None when the list is absent
fn configured_list(
    state: &ResourceState,
    name: FieldName,
) -> Result<Option<Vec<String>>, HookError> {
    state.get(name).map(string_list).transpose()
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(CATEGORY, INSTANCE_TYPES_ONDEMAND, Schema::string().optional())
            .materialize(materialize)
            .on_read(|w, state, _| {
                let v = w
                    .view()
                    .and_then(|g| g.instance_types())
                    .and_then(|t| t.ondemand.as_ref());
                state.set(INSTANCE_TYPES_ONDEMAND, &v)
            })
            .on_write(|w, state, _| {
                if let Some(ondemand) = state.get_str(INSTANCE_TYPES_ONDEMAND) {
                    w.get().instance_types_mut().ondemand = Some(ondemand.to_string());
                }
                Ok(())
            })
            .on_extra(|w, state, _| {
                let group = w.get();
                let types = group.instance_types_mut();
                if types.ondemand.is_none() {
                    types.ondemand = types
                        .on_demand_sizes
                        .as_ref()
                        .and_then(|sizes| sizes.first().cloned());
                }
                let merged = types.ondemand.clone();
                if state.get(INSTANCE_TYPES_ONDEMAND).is_none() {
                    state.set(INSTANCE_TYPES_ONDEMAND, &merged)?;
                }
                Ok(())
            }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            INSTANCE_TYPES_SPOT,
            Schema::list(Elem::string()).optional(),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.instance_types())
                .and_then(|t| t.spot.as_ref());
            state.set(INSTANCE_TYPES_SPOT, &v)
        })
        .on_write(|w, state, _| {
            if let Some(spot) = configured_list(state, INSTANCE_TYPES_SPOT)? {
                w.get().instance_types_mut().spot = Some(spot);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            INSTANCE_TYPES_PREFERRED_SPOT,
            Schema::list(Elem::string()).optional(),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.instance_types())
                .and_then(|t| t.preferred_spot.as_ref());
            state.set(INSTANCE_TYPES_PREFERRED_SPOT, &v)
        })
        .check(|state| {
            if let (Some(preferred), Some(spot)) = (
                configured_list(state, INSTANCE_TYPES_PREFERRED_SPOT)?,
                configured_list(state, INSTANCE_TYPES_SPOT)?,
            ) {
                if let Some(missing) = preferred.iter().find(|t| !spot.contains(t)) {
                    return Err(HookError::invalid(format!(
                        "preferred spot type {} is not listed in instance_types_spot",
                        missing
                    )));
                }
            }
            Ok(())
        })
        .on_write(|w, state, _| {
            if let Some(preferred) = configured_list(state, INSTANCE_TYPES_PREFERRED_SPOT)? {
                w.get().instance_types_mut().preferred_spot = Some(preferred);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            ONDEMAND_SIZES,
            Schema::list(Elem::string()).optional(),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.instance_types())
                .and_then(|t| t.on_demand_sizes.as_ref());
            state.set(ONDEMAND_SIZES, &v)
        })
        .on_write(|w, state, _| {
            // Absent leaves the remote value untouched
            if let Some(sizes) = configured_list(state, ONDEMAND_SIZES)? {
                w.get().instance_types_mut().on_demand_sizes = Some(sizes);
            }
            Ok(())
        }),
    )?;

    Ok(())
}
