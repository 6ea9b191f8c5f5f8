//! Top-level group attributes

use super::domain::{ComputeGroup, ComputeGroupField};
use crate::error::RegistryError;
use crate::field::schema::suppress_case_diff;
use crate::field::{Category, FieldName, FieldsMapBuilder, Schema};

pub const CATEGORY: Category = Category::new("compute_group");

pub const NAME: FieldName = FieldName::new("name");
pub const DESCRIPTION: FieldName = FieldName::new("description");
pub const REGION: FieldName = FieldName::new("region");
pub const PRODUCT: FieldName = FieldName::new("product");
pub const CREATED_AT: FieldName = FieldName::new("created_at");
pub const UPDATED_AT: FieldName = FieldName::new("updated_at");

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(CATEGORY, NAME, Schema::string().required())
            .on_read(|w, state, _| match w.view() {
                Some(group) => state.set(NAME, &group.name),
                None => Ok(()),
            })
            .on_write(|w, state, _| {
                w.get().name = state.get_str(NAME).map(String::from);
                Ok(())
            }),
    )?;

    fields.register(
        ComputeGroupField::new(CATEGORY, DESCRIPTION, Schema::string().optional())
            .on_read(|w, state, _| match w.view() {
                Some(group) => state.set(DESCRIPTION, &group.description),
                None => Ok(()),
            })
            .on_create(|w, state, _| {
                w.get().description = state.get_str(DESCRIPTION).map(String::from);
                Ok(())
            })
            .on_update(|w, state, _| {
                // Clearing the description sends an empty string
                w.get().description = Some(state.get_str(DESCRIPTION).unwrap_or_default().to_string());
                Ok(())
            }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            REGION,
            Schema::string()
                .required()
                .force_new()
                .suppress_diff(suppress_case_diff),
        )
        .on_read(|w, state, _| match w.view() {
            Some(group) => state.set(REGION, &group.region),
            None => Ok(()),
        })
        .on_create(|w, state, _| {
            w.get().region = state.get_str(REGION).map(str::to_lowercase);
            Ok(())
        })
        .immutable(),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            PRODUCT,
            Schema::string()
                .required()
                .force_new()
                .validate(|v| match v.as_str() {
                    Some("Linux/UNIX" | "Windows" | "SUSE Linux" | "Red Hat Enterprise Linux") => {
                        Ok(())
                    },
                    _ => Err(format!("unsupported product {}", v)),
                }),
        )
        .materialize(|group| {
            group.compute_mut();
        })
        .on_read(|w, state, _| {
            let product = w.view().and_then(|g| g.compute.as_ref()).and_then(|c| c.product.as_ref());
            state.set(PRODUCT, &product)
        })
        .on_create(|w, state, _| {
            w.get().compute_mut().product = state.get_str(PRODUCT).map(String::from);
            Ok(())
        })
        .immutable(),
    )?;

    fields.register(
        ComputeGroupField::new(CATEGORY, CREATED_AT, Schema::string().computed()).on_read(|w, state, _| {
            match w.view() {
                Some(group) => state.set(CREATED_AT, &group.created_at),
                None => Ok(()),
            }
        }),
    )?;

    fields.register(
        ComputeGroupField::new(CATEGORY, UPDATED_AT, Schema::string().computed()).on_read(|w, state, _| {
            match w.view() {
                Some(group) => state.set(UPDATED_AT, &group.updated_at),
                None => Ok(()),
            }
        }),
    )?;

    Ok(())
}
