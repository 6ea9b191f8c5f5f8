//! Pool compute attributes
//!
//! Instance types are constrained by either an allow list or a deny list,
//! never both.

use super::domain::{NodePool, NodePoolField, PoolInstanceTypes};
use crate::error::{HookError, RegistryError};
use crate::field::nested::string_list;
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use crate::state::ResourceState;

pub const CATEGORY: Category = Category::new("compute");

pub const SUBNET_IDS: FieldName = FieldName::new("subnet_ids");
pub const WHITELIST: FieldName = FieldName::new("whitelist");
pub const BLACKLIST: FieldName = FieldName::new("blacklist");
pub const IMAGE_ID: FieldName = FieldName::new("image_id");
pub const SECURITY_GROUPS: FieldName = FieldName::new("security_groups");

fn strings(state: &ResourceState, name: FieldName) -> Result<Option<Vec<String>>, HookError> {
    state.get(name).map(string_list).transpose()
}

fn slot(types: &PoolInstanceTypes, name: FieldName) -> Option<&Vec<String>> {
    if name == WHITELIST {
        types.whitelist.as_ref()
    } else {
        types.blacklist.as_ref()
    }
}

fn slot_mut(types: &mut PoolInstanceTypes, name: FieldName) -> &mut Option<Vec<String>> {
    if name == WHITELIST {
        &mut types.whitelist
    } else {
        &mut types.blacklist
    }
}

fn check_exclusive(state: &ResourceState) -> Result<(), HookError> {
    if state.get(WHITELIST).is_some() && state.get(BLACKLIST).is_some() {
        return Err(HookError::invalid("whitelist conflicts with blacklist"));
    }
    Ok(())
}

pub fn setup(fields: &mut FieldsMapBuilder<NodePool>) -> Result<(), RegistryError> {
    fields.register(
        NodePoolField::new(
            CATEGORY,
            SUBNET_IDS,
            Schema::list(Elem::string()).optional().computed(),
        )
        .materialize(|pool| {
            pool.compute_mut();
        })
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|p| p.compute.as_ref())
                .and_then(|c| c.subnet_ids.as_ref());
            state.set(SUBNET_IDS, &v)
        })
        .on_write(|w, state, _| {
            if let Some(subnets) = strings(state, SUBNET_IDS)? {
                w.get().compute_mut().subnet_ids = Some(subnets);
            }
            Ok(())
        }),
    )?;

    for name in [WHITELIST, BLACKLIST] {
        fields.register(
            NodePoolField::new(CATEGORY, name, Schema::list(Elem::string()).optional())
                .materialize(|pool| {
                    pool.instance_types_mut();
                })
                .on_read(move |w, state, _| {
                    let v = w
                        .view()
                        .and_then(|p| p.instance_types())
                        .and_then(|t| slot(t, name))
                        .filter(|list| !list.is_empty());
                    state.set(name, &v)
                })
                .check(check_exclusive)
                .on_create(move |w, state, _| {
                    if let Some(list) = strings(state, name)? {
                        *slot_mut(w.get().instance_types_mut(), name) = Some(list);
                    }
                    Ok(())
                })
                .on_update(move |w, state, _| {
                    // Removing a list clears it remotely
                    let list = strings(state, name)?.unwrap_or_default();
                    *slot_mut(w.get().instance_types_mut(), name) = Some(list);
                    Ok(())
                }),
        )?;
    }

    fields.register(
        NodePoolField::new(CATEGORY, IMAGE_ID, Schema::string().optional().computed())
            .materialize(|pool| {
                pool.launch_spec_mut();
            })
            .on_read(|w, state, _| {
                let v = w.view().and_then(|p| p.launch_spec()).and_then(|s| s.image_id.as_ref());
                state.set(IMAGE_ID, &v)
            })
            .on_write(|w, state, _| {
                if let Some(image) = state.get_str(IMAGE_ID) {
                    w.get().launch_spec_mut().image_id = Some(image.to_string());
                }
                Ok(())
            }),
    )?;

    fields.register(
        NodePoolField::new(
            CATEGORY,
            SECURITY_GROUPS,
            Schema::list(Elem::string()).optional().computed(),
        )
        .materialize(|pool| {
            pool.launch_spec_mut();
        })
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|p| p.launch_spec())
                .and_then(|s| s.security_group_ids.as_ref());
            state.set(SECURITY_GROUPS, &v)
        })
        .on_write(|w, state, _| {
            if let Some(groups) = strings(state, SECURITY_GROUPS)? {
                w.get().launch_spec_mut().security_group_ids = Some(groups);
            }
            Ok(())
        }),
    )?;

    Ok(())
}
