//! Error types
//!
//! Registration, hook and dispatch errors. Hooks report a [`HookError`];
//! the dispatcher attributes it to the offending field and surfaces a
//! [`ResourceError`] to the host.

use crate::field::{FieldName, Operation, Phase};
use thiserror::Error;

/// Failure while composing a [`FieldsMap`](crate::field::FieldsMap)
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("field {field} registered by {second} is already registered by {first}")]
    DuplicateField {
        field: FieldName,
        first: &'static str,
        second: &'static str,
    },

    #[error("resource type {0} is registered twice")]
    DuplicateResource(&'static str),
}

/// Failure reported by a single field hook
#[derive(Debug, Error)]
pub enum HookError {
    #[error("invalid value: {0}")]
    Invalid(String),

    #[error("missing required attribute {0}")]
    MissingSubField(FieldName),

    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("attribute cannot be changed once the resource has been created")]
    Immutable,

    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

impl HookError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn type_mismatch(expected: &'static str, found: &serde_json::Value) -> Self {
        Self::TypeMismatch {
            expected,
            found: json_type_name(found).to_string(),
        }
    }
}

/// Error surfaced to the host from a CRUD operation
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{operation} failed reading field {field} - {source:?}")]
    Read {
        operation: Operation,
        field: FieldName,
        source: HookError,
    },

    #[error("{operation} failed expanding field {field} - {source}")]
    Expand {
        operation: Operation,
        phase: Phase,
        field: FieldName,
        source: HookError,
    },

    #[error("{operation} failed merging field {field} - {source}")]
    Merge {
        operation: Operation,
        field: FieldName,
        source: HookError,
    },

    #[error("invalid configuration for field {path}: {message}")]
    Validation { path: String, message: String },

    #[error("{0} requires a resource id")]
    MissingId(Operation),

    #[error("{resource_type} {id} does not exist")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    #[error(transparent)]
    Remote(anyhow::Error),
}

impl ResourceError {
    /// External name of the field the error is attributed to, if any
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Read { field, .. } | Self::Expand { field, .. } | Self::Merge { field, .. } => {
                Some(field.as_str())
            },
            Self::Validation { path, .. } => path.split('.').next(),
            Self::MissingId(_) | Self::NotFound { .. } | Self::Remote(_) => None,
        }
    }

    /// Whether re-running the same operation could succeed
    ///
    /// Only remote failures qualify; field errors are deterministic for a
    /// given configuration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Remote(_))
    }

    /// Whether the error comes from changing an attribute fixed at creation
    pub fn is_immutable(&self) -> bool {
        matches!(
            self,
            Self::Expand {
                source: HookError::Immutable,
                ..
            }
        )
    }
}

/// JSON type name used in diagnostics
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "object",
    }
}
