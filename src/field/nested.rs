//! Flatten / expand helpers
//!
//! List, set and block attributes convert between typed domain values and
//! loosely typed configuration values through a [`NestedBlock`] pair:
//! `flatten` (domain to state) and `expand` (state to domain). Lists keep
//! element order; sets are keyed by a deterministic hash of each element.

use super::FieldName;
use crate::error::HookError;
use serde_json::{Map, Value};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A nested configuration block backed by a typed domain struct
pub trait NestedBlock: Sized {
    fn expand(attrs: &Attrs<'_>) -> Result<Self, HookError>;

    fn flatten(&self) -> Map<String, Value>;
}

/// Typed accessors over one block's attribute map
#[derive(Debug, Clone, Copy)]
pub struct Attrs<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Attrs<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// Value of a sub-field; null counts as absent
    pub fn get(&self, name: FieldName) -> Option<&'a Value> {
        self.map.get(name.as_str()).filter(|v| !v.is_null())
    }

    /// Required string sub-field; empty strings count as missing
    pub fn required_str(&self, name: FieldName) -> Result<&'a str, HookError> {
        match self.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s),
            Some(Value::String(_)) | None => Err(HookError::MissingSubField(name)),
            Some(other) => Err(HookError::type_mismatch("string", other)),
        }
    }

    pub fn optional_str(&self, name: FieldName) -> Result<Option<&'a str>, HookError> {
        match self.get(name) {
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            None => Ok(None),
            Some(other) => Err(HookError::type_mismatch("string", other)),
        }
    }

    pub fn optional_bool(&self, name: FieldName) -> Result<Option<bool>, HookError> {
        match self.get(name) {
            Some(Value::Bool(b)) => Ok(Some(*b)),
            None => Ok(None),
            Some(other) => Err(HookError::type_mismatch("bool", other)),
        }
    }

    pub fn optional_i64(&self, name: FieldName) -> Result<Option<i64>, HookError> {
        match self.get(name) {
            Some(v) => v
                .as_i64()
                .map(Some)
                .ok_or_else(|| HookError::type_mismatch("int", v)),
            None => Ok(None),
        }
    }

    pub fn optional_f64(&self, name: FieldName) -> Result<Option<f64>, HookError> {
        match self.get(name) {
            Some(v) => v
                .as_f64()
                .map(Some)
                .ok_or_else(|| HookError::type_mismatch("number", v)),
            None => Ok(None),
        }
    }

    /// Nested single block (a list attribute with at most one element)
    pub fn optional_block<B: NestedBlock>(&self, name: FieldName) -> Result<Option<B>, HookError> {
        match self.get(name) {
            Some(v) => expand_single(v),
            None => Ok(None),
        }
    }

    pub fn optional_strings(&self, name: FieldName) -> Result<Option<Vec<String>>, HookError> {
        match self.get(name) {
            Some(v) => string_list(v).map(Some),
            None => Ok(None),
        }
    }
}

/// Expand an ordered list of blocks
pub fn expand_list<B: NestedBlock>(value: &Value) -> Result<Vec<B>, HookError> {
    let items = value
        .as_array()
        .ok_or_else(|| HookError::type_mismatch("list", value))?;
    items.iter().map(expand_item).collect()
}

pub fn flatten_list<B: NestedBlock>(items: &[B]) -> Value {
    Value::Array(items.iter().map(|b| Value::Object(b.flatten())).collect())
}

/// Expand a set of blocks; duplicate elements collapse into one
pub fn expand_set<B: NestedBlock>(value: &Value) -> Result<Vec<B>, HookError> {
    let items = value
        .as_array()
        .ok_or_else(|| HookError::type_mismatch("list", value))?;
    normalize_set(items.clone())
        .iter()
        .map(expand_item)
        .collect()
}

/// Flatten a set of blocks in canonical (hash) order
pub fn flatten_set<B: NestedBlock>(items: &[B]) -> Value {
    Value::Array(normalize_set(
        items.iter().map(|b| Value::Object(b.flatten())).collect(),
    ))
}

/// Expand a single-element block list
pub fn expand_single<B: NestedBlock>(value: &Value) -> Result<Option<B>, HookError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => match items.as_slice() {
            [] => Ok(None),
            [item] => expand_item(item).map(Some),
            _ => Err(HookError::invalid(format!(
                "expected at most one block, got {}",
                items.len()
            ))),
        },
        Value::Object(_) => expand_item(value).map(Some),
        other => Err(HookError::type_mismatch("block", other)),
    }
}

pub fn flatten_single<B: NestedBlock>(item: Option<&B>) -> Value {
    match item {
        Some(b) => Value::Array(vec![Value::Object(b.flatten())]),
        None => Value::Array(Vec::new()),
    }
}

fn expand_item<B: NestedBlock>(item: &Value) -> Result<B, HookError> {
    match item.as_object() {
        Some(map) => B::expand(&Attrs::new(map)),
        None => Err(HookError::type_mismatch("block", item)),
    }
}

/// Expand a list of strings
pub fn string_list(value: &Value) -> Result<Vec<String>, HookError> {
    let items = value
        .as_array()
        .ok_or_else(|| HookError::type_mismatch("list", value))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| HookError::type_mismatch("string", item))
        })
        .collect()
}

/// Deterministic identity of a set element
///
/// Nulls inside blocks are dropped before hashing so an omitted optional
/// sub-field and an explicit null hash the same.
pub fn hash_element(value: &Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    hash_value(&strip_nulls(value), &mut hasher);
    hasher.finish()
}

fn hash_value<H: Hasher>(value: &Value, hasher: &mut H) {
    match value {
        Value::Null => 0u8.hash(hasher),
        Value::Bool(b) => {
            1u8.hash(hasher);
            b.hash(hasher);
        },
        Value::Number(n) => {
            2u8.hash(hasher);
            n.to_string().hash(hasher);
        },
        Value::String(s) => {
            3u8.hash(hasher);
            s.hash(hasher);
        },
        Value::Array(items) => {
            4u8.hash(hasher);
            items.len().hash(hasher);
            for item in items {
                hash_value(item, hasher);
            }
        },
        Value::Object(map) => {
            // serde_json maps iterate in key order
            5u8.hash(hasher);
            for (k, v) in map {
                k.hash(hasher);
                hash_value(v, hasher);
            }
        },
    }
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}

/// Sort by element hash and drop duplicates
pub fn normalize_set(items: Vec<Value>) -> Vec<Value> {
    let mut keyed: Vec<(u64, Value)> = items.into_iter().map(|v| (hash_element(&v), v)).collect();
    keyed.sort_by_key(|(h, _)| *h);
    keyed.dedup_by_key(|(h, _)| *h);
    keyed.into_iter().map(|(_, v)| v).collect()
}

/// Set equality irrespective of order
pub fn set_eq(a: &[Value], b: &[Value]) -> bool {
    let mut left: Vec<u64> = a.iter().map(hash_element).collect();
    let mut right: Vec<u64> = b.iter().map(hash_element).collect();
    left.sort_unstable();
    left.dedup();
    right.sort_unstable();
    right.dedup();
    left == right
}
