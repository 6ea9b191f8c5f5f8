//! Launch specification attributes

use super::domain::{ComputeGroup, ComputeGroupField, Tag};
use crate::error::{HookError, RegistryError};
use crate::field::nested::{expand_set, flatten_set, string_list, Attrs, NestedBlock};
use crate::field::schema::validate_non_negative;
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use serde_json::{Map, Value};

pub const CATEGORY: Category = Category::new("launch_configuration");

pub const IMAGE_ID: FieldName = FieldName::new("image_id");
pub const SECURITY_GROUPS: FieldName = FieldName::new("security_groups");
pub const KEY_NAME: FieldName = FieldName::new("key_name");
pub const USER_DATA: FieldName = FieldName::new("user_data");
pub const HEALTH_CHECK_TYPE: FieldName = FieldName::new("health_check_type");
pub const HEALTH_CHECK_GRACE_PERIOD: FieldName = FieldName::new("health_check_grace_period");
pub const TAGS: FieldName = FieldName::new("tags");

pub const TAG_KEY: FieldName = FieldName::new("key");
pub const TAG_VALUE: FieldName = FieldName::new("value");

impl NestedBlock for Tag {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        Ok(Tag {
            key: attrs.required_str(TAG_KEY)?.to_string(),
            value: attrs.optional_str(TAG_VALUE)?.map(String::from),
        })
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(TAG_KEY.to_string(), Value::from(self.key.as_str()));
        if let Some(value) = &self.value {
            m.insert(TAG_VALUE.to_string(), Value::from(value.as_str()));
        }
        m
    }
}

fn materialize(group: &mut ComputeGroup) {
    group.launch_spec_mut();
}

fn trim_user_data(value: &Value) -> Value {
    match value.as_str() {
        Some(s) => Value::from(s.trim()),
        None => value.clone(),
    }
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(CATEGORY, IMAGE_ID, Schema::string().required())
            .materialize(materialize)
            .on_read(|w, state, _| {
                let v = w.view().and_then(|g| g.launch_spec()).and_then(|s| s.image_id.as_ref());
                state.set(IMAGE_ID, &v)
            })
            .on_write(|w, state, _| {
                w.get().launch_spec_mut().image_id = state.get_str(IMAGE_ID).map(String::from);
                Ok(())
            }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            SECURITY_GROUPS,
            Schema::list(Elem::string()).required().min_items(1),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.launch_spec())
                .and_then(|s| s.security_group_ids.as_ref());
            state.set(SECURITY_GROUPS, &v)
        })
        .on_write(|w, state, _| {
            if let Some(value) = state.get(SECURITY_GROUPS) {
                w.get().launch_spec_mut().security_group_ids = Some(string_list(value)?);
            }
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(CATEGORY, KEY_NAME, Schema::string().optional())
            .materialize(materialize)
            .on_read(|w, state, _| {
                let v = w.view().and_then(|g| g.launch_spec()).and_then(|s| s.key_pair.as_ref());
                state.set(KEY_NAME, &v)
            })
            .on_create(|w, state, _| {
                if let Some(key) = state.get_str(KEY_NAME) {
                    w.get().launch_spec_mut().key_pair = Some(key.to_string());
                }
                Ok(())
            })
            .on_update(|w, state, _| {
                w.get().launch_spec_mut().key_pair =
                    Some(state.get_str(KEY_NAME).unwrap_or_default().to_string());
                Ok(())
            }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            USER_DATA,
            Schema::string().optional().sensitive().normalize(trim_user_data),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w.view().and_then(|g| g.launch_spec()).and_then(|s| s.user_data.as_ref());
            state.set(USER_DATA, &v)
        })
        .on_write(|w, state, _| {
            w.get().launch_spec_mut().user_data =
                state.get_str(USER_DATA).map(|s| s.trim().to_string());
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            HEALTH_CHECK_TYPE,
            Schema::string().optional().validate(|v| match v.as_str() {
                Some("ELB" | "TARGET_GROUP" | "HCS" | "K8S_NODE") => Ok(()),
                _ => Err(format!("unsupported health check type {}", v)),
            }),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.launch_spec())
                .and_then(|s| s.health_check_type.as_ref());
            state.set(HEALTH_CHECK_TYPE, &v)
        })
        .on_write(|w, state, _| {
            w.get().launch_spec_mut().health_check_type =
                state.get_str(HEALTH_CHECK_TYPE).map(String::from);
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            HEALTH_CHECK_GRACE_PERIOD,
            Schema::int().optional().validate(validate_non_negative),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let v = w
                .view()
                .and_then(|g| g.launch_spec())
                .and_then(|s| s.health_check_grace_period);
            state.set(HEALTH_CHECK_GRACE_PERIOD, &v)
        })
        .check(|state| {
            if state.get(HEALTH_CHECK_GRACE_PERIOD).is_some()
                && state.get(HEALTH_CHECK_TYPE).is_none()
            {
                return Err(HookError::invalid(
                    "health_check_grace_period requires health_check_type",
                ));
            }
            Ok(())
        })
        .on_write(|w, state, _| {
            w.get().launch_spec_mut().health_check_grace_period =
                state.get_i64(HEALTH_CHECK_GRACE_PERIOD);
            Ok(())
        }),
    )?;

    fields.register(
        ComputeGroupField::new(
            CATEGORY,
            TAGS,
            Schema::set(Elem::block(vec![
                (TAG_KEY, Schema::string().required()),
                (TAG_VALUE, Schema::string().optional()),
            ]))
            .optional(),
        )
        .materialize(materialize)
        .on_read(|w, state, _| {
            let tags = w
                .view()
                .and_then(|g| g.launch_spec())
                .and_then(|s| s.tags.as_deref())
                .filter(|tags| !tags.is_empty());
            match tags {
                Some(tags) => state.set(TAGS, &flatten_set(tags)),
                None => state.set(TAGS, &Value::Null),
            }
        })
        .on_create(|w, state, _| {
            if let Some(value) = state.get(TAGS) {
                w.get().launch_spec_mut().tags = Some(expand_set(value)?);
            }
            Ok(())
        })
        .on_update(|w, state, _| {
            let tags = match state.get(TAGS) {
                Some(value) => expand_set(value)?,
                None => Vec::new(),
            };
            w.get().launch_spec_mut().tags = Some(tags);
            Ok(())
        }),
    )?;

    Ok(())
}
