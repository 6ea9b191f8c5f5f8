//! Schema fragments
//!
//! Describes the shape and constraints of one configuration attribute. The
//! aggregated fragments of a resource form the declarative schema the host
//! parses user configuration against.

use super::nested::set_eq;
use super::FieldName;
use crate::error::json_type_name;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Custom validation for a single value
pub type ValidateFn = fn(&Value) -> Result<(), String>;

/// Returns true when the change from `old` to `new` should be ignored
pub type DiffSuppressFn = fn(key: &str, old: &Value, new: &Value) -> bool;

/// Normalizes a value before it is stored in state
pub type StateFn = fn(&Value) -> Value;

/// Attribute value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Int,
    Float,
    String,
    List,
    Set,
    Map,
}

impl ValueType {
    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List | Self::Set | Self::Map)
    }
}

/// Element shape of a list, set or map attribute
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Elem {
    Scalar(Box<Schema>),
    Block(Block),
}

impl Elem {
    pub fn string() -> Self {
        Self::Scalar(Box::new(Schema::string()))
    }

    pub fn int() -> Self {
        Self::Scalar(Box::new(Schema::int()))
    }

    pub fn block(attributes: Vec<(FieldName, Schema)>) -> Self {
        Self::Block(Block::new(attributes))
    }
}

/// Ordered set of named attributes (a resource body or a nested block)
#[derive(Debug, Clone, Default)]
pub struct Block {
    attributes: Vec<(FieldName, Schema)>,
}

impl Block {
    pub fn new(attributes: Vec<(FieldName, Schema)>) -> Self {
        Self { attributes }
    }

    pub fn push(&mut self, name: FieldName, schema: Schema) {
        self.attributes.push((name, schema));
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.attributes
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FieldName, Schema)> {
        self.attributes.iter()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Check an object value against every attribute of this block
    pub fn check(&self, path: &str, object: &Map<String, Value>) -> Result<(), SchemaViolation> {
        for key in object.keys() {
            if self.get(key).is_none() {
                return Err(SchemaViolation::new(
                    join_path(path, key),
                    "unsupported attribute",
                ));
            }
        }
        for (name, schema) in &self.attributes {
            schema.check(&join_path(path, name.as_str()), object.get(name.as_str()))?;
        }
        Ok(())
    }

    /// Fill absent attributes that declare a default
    pub fn apply_defaults(&self, object: &mut Map<String, Value>) {
        for (name, schema) in &self.attributes {
            let absent = object.get(name.as_str()).map_or(true, Value::is_null);
            if absent {
                if let Some(default) = &schema.default {
                    object.insert(name.to_string(), default.clone());
                }
            }
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for (name, schema) in &self.attributes {
            map.serialize_entry(name.as_str(), schema)?;
        }
        map.end()
    }
}

/// Path-attributed schema violation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    pub path: String,
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

fn join_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Shape and constraints of one attribute
#[derive(Clone, Serialize)]
pub struct Schema {
    #[serde(rename = "type")]
    pub kind: ValueType,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub computed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elem: Option<Elem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    #[serde(skip)]
    pub validate: Option<ValidateFn>,
    #[serde(skip)]
    pub diff_suppress: Option<DiffSuppressFn>,
    #[serde(skip)]
    pub state_func: Option<StateFn>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("kind", &self.kind)
            .field("required", &self.required)
            .field("optional", &self.optional)
            .field("computed", &self.computed)
            .field("default", &self.default)
            .field("elem", &self.elem)
            .finish_non_exhaustive()
    }
}

impl Schema {
    fn of(kind: ValueType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            elem: None,
            min_items: None,
            max_items: None,
            description: None,
            validate: None,
            diff_suppress: None,
            state_func: None,
        }
    }

    pub fn bool() -> Self {
        Self::of(ValueType::Bool)
    }

    pub fn int() -> Self {
        Self::of(ValueType::Int)
    }

    pub fn float() -> Self {
        Self::of(ValueType::Float)
    }

    pub fn string() -> Self {
        Self::of(ValueType::String)
    }

    pub fn list(elem: Elem) -> Self {
        Self {
            elem: Some(elem),
            ..Self::of(ValueType::List)
        }
    }

    pub fn set(elem: Elem) -> Self {
        Self {
            elem: Some(elem),
            ..Self::of(ValueType::Set)
        }
    }

    pub fn map(elem: Schema) -> Self {
        Self {
            elem: Some(Elem::Scalar(Box::new(elem))),
            ..Self::of(ValueType::Map)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self.optional = false;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self.required = false;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn max_items(mut self, n: usize) -> Self {
        self.max_items = Some(n);
        self
    }

    pub fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn validate(mut self, validate: ValidateFn) -> Self {
        self.validate = Some(validate);
        self
    }

    pub fn suppress_diff(mut self, suppress: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }

    pub fn normalize(mut self, state_func: StateFn) -> Self {
        self.state_func = Some(state_func);
        self
    }

    /// Attributes only ever written by the remote side
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }

    /// Check one value (absent or null counts as unset)
    pub fn check(&self, path: &str, value: Option<&Value>) -> Result<(), SchemaViolation> {
        let value = match value {
            Some(v) if !v.is_null() => v,
            _ => {
                if self.required {
                    return Err(SchemaViolation::new(path, "required attribute is missing"));
                }
                return Ok(());
            },
        };

        if self.kind == ValueType::Int && value.is_u64() && !value.is_i64() {
            return Err(SchemaViolation::new(
                path,
                format!("integer {} is out of range", value),
            ));
        }

        let type_ok = match self.kind {
            ValueType::Bool => value.is_boolean(),
            ValueType::Int => value.is_i64(),
            ValueType::Float => value.is_number(),
            ValueType::String => value.is_string(),
            ValueType::List | ValueType::Set => value.is_array(),
            ValueType::Map => value.is_object(),
        };
        if !type_ok {
            return Err(SchemaViolation::new(
                path,
                format!(
                    "expected {}, got {}",
                    type_label(self.kind),
                    json_type_name(value)
                ),
            ));
        }

        match (value, &self.elem) {
            (Value::Array(items), elem) => {
                if let Some(min) = self.min_items {
                    if items.len() < min {
                        return Err(SchemaViolation::new(
                            path,
                            format!("requires at least {} item(s), got {}", min, items.len()),
                        ));
                    }
                }
                if let Some(max) = self.max_items {
                    if items.len() > max {
                        return Err(SchemaViolation::new(
                            path,
                            format!("allows at most {} item(s), got {}", max, items.len()),
                        ));
                    }
                }
                if let Some(elem) = elem {
                    for (i, item) in items.iter().enumerate() {
                        check_elem(elem, &join_path(path, &i.to_string()), item)?;
                    }
                }
            },
            (Value::Object(entries), Some(elem)) => {
                for (key, item) in entries {
                    check_elem(elem, &join_path(path, key), item)?;
                }
            },
            _ => {},
        }

        if let Some(validate) = self.validate {
            validate(value).map_err(|message| SchemaViolation::new(path, message))?;
        }
        Ok(())
    }

    /// Apply the state function, if any
    pub fn normalized(&self, value: &Value) -> Value {
        match self.state_func {
            Some(f) if !value.is_null() => f(value),
            _ => value.clone(),
        }
    }

    /// Whether moving from `old` to `new` is a real change for this attribute
    ///
    /// A computed attribute left out of the configuration keeps whatever the
    /// remote side reports. An empty collection and an unset one are the same.
    pub fn differs(&self, key: &str, old: Option<&Value>, new: Option<&Value>) -> bool {
        if self.computed && new.map_or(true, Value::is_null) {
            return false;
        }
        let old = self.normalized(old.unwrap_or(&Value::Null));
        let new = self.normalized(new.unwrap_or(&Value::Null));

        let equal = match (self.kind, &old, &new) {
            (ValueType::Set, Value::Array(a), Value::Array(b)) => set_eq(a, b),
            (kind, a, b) if kind.is_collection() && is_empty(a) && is_empty(b) => true,
            _ => old == new,
        };
        if equal {
            return false;
        }
        match self.diff_suppress {
            Some(suppress) => !suppress(key, &old, &new),
            None => true,
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn check_elem(elem: &Elem, path: &str, item: &Value) -> Result<(), SchemaViolation> {
    match elem {
        Elem::Scalar(schema) => {
            if item.is_null() {
                return Err(SchemaViolation::new(path, "null element"));
            }
            schema.check(path, Some(item))
        },
        Elem::Block(block) => match item.as_object() {
            Some(object) => block.check(path, object),
            None => Err(SchemaViolation::new(
                path,
                format!("expected block, got {}", json_type_name(item)),
            )),
        },
    }
}

fn type_label(kind: ValueType) -> &'static str {
    match kind {
        ValueType::Bool => "bool",
        ValueType::Int => "int",
        ValueType::Float => "number",
        ValueType::String => "string",
        ValueType::List | ValueType::Set => "list",
        ValueType::Map => "object",
    }
}

/// Aggregated schema of one resource type
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSchema {
    pub resource_type: &'static str,
    pub attributes: Block,
}

impl ResourceSchema {
    /// Check a full configuration document
    pub fn check(&self, values: &Map<String, Value>) -> Result<(), SchemaViolation> {
        self.attributes.check("", values)
    }
}

/// Diff suppression ignoring ASCII case
pub fn suppress_case_diff(_key: &str, old: &Value, new: &Value) -> bool {
    match (old.as_str(), new.as_str()) {
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Diff suppression treating `50` and `50.0` as equal
pub fn suppress_numeric_diff(_key: &str, old: &Value, new: &Value) -> bool {
    match (old.as_f64(), new.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Validation for percentages between 0 and 100
pub fn validate_percentage(value: &Value) -> Result<(), String> {
    match value.as_f64() {
        Some(v) if (0.0..=100.0).contains(&v) => Ok(()),
        _ => Err(format!("expected a percentage between 0 and 100, got {}", value)),
    }
}

/// Validation for non-negative integers
pub fn validate_non_negative(value: &Value) -> Result<(), String> {
    match value.as_i64() {
        Some(v) if v >= 0 => Ok(()),
        _ => Err(format!("expected a non-negative integer, got {}", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const TYPE: FieldName = FieldName::new("type");
    const BALANCER_ID: FieldName = FieldName::new("balancer_id");

    fn lb_schema() -> Schema {
        Schema::set(Elem::block(vec![
            (TYPE, Schema::string().required()),
            (BALANCER_ID, Schema::string().optional()),
        ]))
        .optional()
    }

    #[test]
    fn test_required_missing() {
        let schema = Schema::string().required();
        let err = schema.check("name", None).unwrap_err();
        assert_eq!(err.path, "name");
        assert!(err.message.contains("required"));
        assert!(schema.check("name", Some(&json!(null))).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        let err = Schema::int().check("min_size", Some(&json!("3"))).unwrap_err();
        assert_eq!(err.message, "expected int, got string");
        assert!(Schema::float().check("risk", Some(&json!(3))).is_ok());
    }

    #[test]
    fn test_int_out_of_range() {
        let schema = Schema::int().optional();
        let err = schema.check("cooldown", Some(&json!(u64::MAX))).unwrap_err();
        assert!(err.message.contains("out of range"));
        assert!(schema.check("cooldown", Some(&json!(i64::MAX))).is_ok());
        assert!(schema.check("cooldown", Some(&json!(-1))).is_ok());
    }

    #[test]
    fn test_nested_block_paths() {
        let value = json!([{"balancer_id": "lb-1"}]);
        let err = lb_schema().check("load_balancers", Some(&value)).unwrap_err();
        assert_eq!(err.path, "load_balancers.0.type");

        let value = json!([{"type": "CLASSIC", "bogus": 1}]);
        let err = lb_schema().check("load_balancers", Some(&value)).unwrap_err();
        assert_eq!(err.path, "load_balancers.0.bogus");
    }

    #[test]
    fn test_item_limits() {
        let schema = Schema::list(Elem::string()).max_items(1);
        assert!(schema.check("l", Some(&json!(["a"]))).is_ok());
        assert!(schema.check("l", Some(&json!(["a", "b"]))).is_err());
    }

    #[test]
    fn test_custom_validation() {
        let schema = Schema::float().validate(validate_percentage);
        assert!(schema.check("risk", Some(&json!(50))).is_ok());
        let err = schema.check("risk", Some(&json!(150))).unwrap_err();
        assert!(err.message.contains("percentage"));
    }

    #[test]
    fn test_set_differs_ignores_order() {
        let schema = lb_schema();
        let a = json!([{"type": "CLASSIC"}, {"type": "TARGET_GROUP"}]);
        let b = json!([{"type": "TARGET_GROUP"}, {"type": "CLASSIC"}]);
        assert!(!schema.differs("load_balancers", Some(&a), Some(&b)));

        let list = Schema::list(Elem::string());
        assert!(list.differs("l", Some(&json!(["a", "b"])), Some(&json!(["b", "a"]))));
    }

    #[test]
    fn test_diff_suppression_and_absent_values() {
        let schema = Schema::string().suppress_diff(suppress_case_diff);
        assert!(!schema.differs("region", Some(&json!("US-EAST-1")), Some(&json!("us-east-1"))));
        assert!(schema.differs("region", None, Some(&json!("us-east-1"))));
        assert!(!schema.differs("region", None, Some(&json!(null))));
    }

    #[test]
    fn test_empty_collection_is_unset() {
        let schema = lb_schema();
        assert!(!schema.differs("load_balancers", Some(&json!([])), None));
        assert!(!schema.differs("load_balancers", None, Some(&json!([]))));
        assert!(schema.differs("load_balancers", None, Some(&json!([{"type": "CLASSIC"}]))));

        // Scalars keep the distinction
        assert!(Schema::string().differs("key_name", Some(&json!("")), None));
    }

    #[test]
    fn test_numeric_diff_suppression() {
        let schema = Schema::float().suppress_diff(suppress_numeric_diff);
        assert!(!schema.differs("risk", Some(&json!(100.0)), Some(&json!(100))));
        assert!(schema.differs("risk", Some(&json!(100.0)), Some(&json!(50))));
    }

    #[test]
    fn test_schema_serializes_in_order() {
        let block = Block::new(vec![
            (FieldName::new("zeta"), Schema::string().required()),
            (FieldName::new("alpha"), Schema::int().optional().default(json!(1))),
        ]);
        let out = serde_json::to_string(&block).unwrap();
        assert!(out.find("zeta").unwrap() < out.find("alpha").unwrap());
        assert!(out.contains("\"default\":1"));
        assert!(!out.contains("validate"));
    }

    #[test]
    fn test_apply_defaults() {
        let block = Block::new(vec![
            (FieldName::new("unit"), Schema::string().optional().default(json!("instance"))),
            (FieldName::new("name"), Schema::string().required()),
        ]);
        let mut object = Map::new();
        block.apply_defaults(&mut object);
        assert_eq!(object.get("unit"), Some(&json!("instance")));
        assert!(object.get("name").is_none());
    }
}
