//! Configuration state
//!
//! The host-supplied key/value document for one resource instance: the
//! resource id, the current attribute values (desired state going into
//! Create/Update, observed state coming out of Read) and the prior values
//! used for change detection.

use crate::error::HookError;
use crate::field::FieldName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    values: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    prior: Map<String, Value>,
}

impl ResourceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State for a resource that does not exist yet
    pub fn from_values(values: Map<String, Value>) -> Self {
        Self {
            id: None,
            values,
            prior: Map::new(),
        }
    }

    /// State for an existing resource with its last applied values
    pub fn existing(id: impl Into<String>, values: Map<String, Value>, prior: Map<String, Value>) -> Self {
        Self {
            id: Some(id.into()),
            values,
            prior,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_new(&self) -> bool {
        self.id().is_none()
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.values
    }

    pub fn prior(&self) -> &Map<String, Value> {
        &self.prior
    }

    /// Current value; null counts as absent
    pub fn get(&self, name: FieldName) -> Option<&Value> {
        self.values.get(name.as_str()).filter(|v| !v.is_null())
    }

    /// Current value unless it is absent, null or an empty string/collection
    pub fn get_ok(&self, name: FieldName) -> Option<&Value> {
        self.get(name).filter(|v| match v {
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
            _ => true,
        })
    }

    /// Decode the current value into a typed value
    pub fn get_as<V: DeserializeOwned>(&self, name: FieldName) -> Result<Option<V>, HookError> {
        match self.get(name) {
            Some(v) => Ok(Some(serde_json::from_value(v.clone())?)),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, name: FieldName) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_bool(&self, name: FieldName) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, name: FieldName) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, name: FieldName) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    /// Write an observed value; `None`/null removes the attribute
    pub fn set<V: Serialize + ?Sized>(&mut self, name: FieldName, value: &V) -> Result<(), HookError> {
        match serde_json::to_value(value)? {
            Value::Null => {
                self.values.remove(name.as_str());
            },
            v => {
                self.values.insert(name.to_string(), v);
            },
        }
        Ok(())
    }

    pub fn remove(&mut self, name: FieldName) -> Option<Value> {
        self.values.remove(name.as_str())
    }

    /// Raw comparison against the prior value (no schema awareness)
    pub fn has_change(&self, name: FieldName) -> bool {
        let current = self.get(name);
        let prior = self.prior.get(name.as_str()).filter(|v| !v.is_null());
        current != prior
    }

    /// Make the current values the baseline for the next change detection
    pub fn commit(&mut self) {
        self.prior = self.values.clone();
    }

    /// Forget everything (resource gone or deleted)
    pub fn reset(&mut self) {
        self.id = None;
        self.values.clear();
        self.prior.clear();
    }
}
