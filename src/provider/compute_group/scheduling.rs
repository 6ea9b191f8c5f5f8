//! Scheduled tasks

use super::domain::{ComputeGroup, ComputeGroupField, ScheduledTask};
use crate::error::{HookError, RegistryError};
use crate::field::nested::{expand_list, flatten_list, Attrs, NestedBlock};
use crate::field::schema::validate_non_negative;
use crate::field::{Category, Elem, FieldName, FieldsMapBuilder, Schema};
use serde_json::{Map, Value};

pub const CATEGORY: Category = Category::new("scheduling");

pub const SCHEDULED_TASK: FieldName = FieldName::new("scheduled_task");

pub const TASK_TYPE: FieldName = FieldName::new("task_type");
pub const CRON_EXPRESSION: FieldName = FieldName::new("cron_expression");
pub const FREQUENCY: FieldName = FieldName::new("frequency");
pub const IS_ENABLED: FieldName = FieldName::new("is_enabled");
pub const SCALE_TARGET_CAPACITY: FieldName = FieldName::new("scale_target_capacity");
pub const SCALE_MIN_CAPACITY: FieldName = FieldName::new("scale_min_capacity");
pub const SCALE_MAX_CAPACITY: FieldName = FieldName::new("scale_max_capacity");

impl NestedBlock for ScheduledTask {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError> {
        let task = ScheduledTask {
            task_type: attrs.required_str(TASK_TYPE)?.to_string(),
            cron_expression: attrs.optional_str(CRON_EXPRESSION)?.map(String::from),
            frequency: attrs.optional_str(FREQUENCY)?.map(String::from),
            is_enabled: attrs.optional_bool(IS_ENABLED)?,
            scale_target_capacity: attrs.optional_i64(SCALE_TARGET_CAPACITY)?,
            scale_min_capacity: attrs.optional_i64(SCALE_MIN_CAPACITY)?,
            scale_max_capacity: attrs.optional_i64(SCALE_MAX_CAPACITY)?,
        };

        match (&task.cron_expression, &task.frequency) {
            (Some(_), Some(_)) => Err(HookError::invalid(
                "cron_expression and frequency are mutually exclusive",
            )),
            (None, None) => Err(HookError::invalid(
                "one of cron_expression or frequency is required",
            )),
            _ => Ok(task),
        }
    }

    fn flatten(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert(TASK_TYPE.to_string(), Value::from(self.task_type.as_str()));
        if let Some(cron) = &self.cron_expression {
            m.insert(CRON_EXPRESSION.to_string(), Value::from(cron.as_str()));
        }
        if let Some(frequency) = &self.frequency {
            m.insert(FREQUENCY.to_string(), Value::from(frequency.as_str()));
        }
        if let Some(enabled) = self.is_enabled {
            m.insert(IS_ENABLED.to_string(), Value::Bool(enabled));
        }
        for (name, capacity) in [
            (SCALE_TARGET_CAPACITY, self.scale_target_capacity),
            (SCALE_MIN_CAPACITY, self.scale_min_capacity),
            (SCALE_MAX_CAPACITY, self.scale_max_capacity),
        ] {
            if let Some(capacity) = capacity {
                m.insert(name.to_string(), Value::from(capacity));
            }
        }
        m
    }
}

fn task_schema() -> Schema {
    Schema::list(Elem::block(vec![
        (
            TASK_TYPE,
            Schema::string().required().validate(|v| match v.as_str() {
                Some("scale" | "roll" | "backup_ami" | "statefulUpdateCapacity") => Ok(()),
                _ => Err(format!("unsupported task type {}", v)),
            }),
        ),
        (CRON_EXPRESSION, Schema::string().optional()),
        (
            FREQUENCY,
            Schema::string().optional().validate(|v| match v.as_str() {
                Some("hourly" | "daily" | "weekly") => Ok(()),
                _ => Err(format!("unsupported frequency {}", v)),
            }),
        ),
        (IS_ENABLED, Schema::bool().optional()),
        (SCALE_TARGET_CAPACITY, Schema::int().optional().validate(validate_non_negative)),
        (SCALE_MIN_CAPACITY, Schema::int().optional().validate(validate_non_negative)),
        (SCALE_MAX_CAPACITY, Schema::int().optional().validate(validate_non_negative)),
    ]))
    .optional()
}

pub fn setup(fields: &mut FieldsMapBuilder<ComputeGroup>) -> Result<(), RegistryError> {
    fields.register(
        ComputeGroupField::new(CATEGORY, SCHEDULED_TASK, task_schema())
            .materialize(|group| {
                group.scheduling_mut();
            })
            .on_read(|w, state, _| {
                match w.view().and_then(|g| g.scheduling.as_ref()).and_then(|s| s.tasks.as_deref()) {
                    Some(tasks) if !tasks.is_empty() => {
                        state.set(SCHEDULED_TASK, &flatten_list(tasks))
                    },
                    _ => state.set(SCHEDULED_TASK, &Value::Null),
                }
            })
            .on_create(|w, state, _| {
                if let Some(value) = state.get(SCHEDULED_TASK) {
                    w.get().scheduling_mut().tasks = Some(expand_list(value)?);
                }
                Ok(())
            })
            .on_update(|w, state, _| {
                let tasks = match state.get(SCHEDULED_TASK) {
                    Some(value) => expand_list(value)?,
                    None => Vec::new(),
                };
                w.get().scheduling_mut().tasks = Some(tasks);
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
    fn test_tasks_keep_order() {
        let value = json!([
            {"task_type": "scale", "cron_expression": "0 8 * * *", "scale_target_capacity": 4},
            {"task_type": "roll", "frequency": "weekly", "is_enabled": false},
        ]);
        let tasks: Vec<ScheduledTask> = expand_list(&value).unwrap();
        assert_eq!(tasks[0].task_type, "scale");
        assert_eq!(tasks[1].frequency.as_deref(), Some("weekly"));
        assert_eq!(flatten_list(&tasks), value);
    }

    #[test]
    fn test_schedule_must_be_exclusive() {
        let both = json!([{"task_type": "scale", "cron_expression": "* * * * *", "frequency": "daily"}]);
        assert!(expand_list::<ScheduledTask>(&both).is_err());
        let neither = json!([{"task_type": "scale"}]);
        assert!(expand_list::<ScheduledTask>(&neither).is_err());
    }

    #[test]
    fn test_schema_rejects_unknown_frequency() {
        let violation = task_schema()
            .check(
                "scheduled_task",
                Some(&json!([{"task_type": "scale", "frequency": "monthly"}])),
            )
            .unwrap_err();
        assert_eq!(violation.path, "scheduled_task.0.frequency");
    }
}
