//! Field framework
//!
//! A resource's configuration surface is composed of independent fields.
//! Each [`GenericField`] binds a [`FieldName`] to its [`Schema`] and to the
//! hooks that project values between the configuration state and the typed
//! domain object.
//!
//! # Module Structure
//!
//! - [`schema`] - Schema fragments describing the shape of each attribute
//! - [`registry`] - Ordered field registry built from sub-resource contributors
//! - [`nested`] - Flatten/expand helpers for list, set and block attributes
//!
//! # Example
//!
//! ```ignore
//! const NAME: FieldName = FieldName::new("name");
//!
//! fn setup(fields: &mut FieldsMapBuilder<Group>) -> Result<(), RegistryError> {
//!     fields.register(
//!         GenericField::<Group>::new(GROUP, NAME, Schema::string().required())
//!             .on_read(|w, state, _| match w.view() {
//!                 Some(group) => state.set(NAME, &group.name),
//!                 None => Ok(()),
//!             })
//!             .on_write(|w, state, _| {
//!                 w.get().name = state.get_str(NAME).map(String::from);
//!                 Ok(())
//!             }),
//!     )
//! }
//! ```

pub mod nested;
pub mod registry;
pub mod schema;

pub use registry::{Contributor, FieldsMap, FieldsMapBuilder, Setup};
pub use schema::{Block, Elem, ResourceSchema, Schema, ValueType};

use crate::error::HookError;
use crate::state::ResourceState;
use crate::wrapper::{DomainObject, ResourceWrapper};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// External name of one configuration attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldName(&'static str);

impl FieldName {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        self.0
    }
}

impl Serialize for FieldName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

/// Logical sub-resource a field belongs to (e.g. "strategy", "scheduling")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Category(&'static str);

impl Category {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// CRUD operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
    Import,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which hook of a field is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Create,
    Update,
    Extra,
}

/// Per-invocation execution context handed to every hook
#[derive(Debug, Clone)]
pub struct Context {
    pub operation: Operation,
    pub resource_type: &'static str,
    pub request_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl Context {
    pub fn new(operation: Operation, resource_type: &'static str) -> Self {
        Self {
            operation,
            resource_type,
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    /// Milliseconds since the invocation started
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }
}

/// Projects domain state into configuration state
pub type ReadHook<T> = Arc<
    dyn Fn(&ResourceWrapper<T>, &mut ResourceState, &Context) -> Result<(), HookError>
        + Send
        + Sync,
>;

/// Projects configuration state into the domain object
pub type WriteHook<T> = Arc<
    dyn Fn(&mut ResourceWrapper<T>, &ResourceState, &Context) -> Result<(), HookError>
        + Send
        + Sync,
>;

/// Import-time merge of two partial representations
pub type ExtraHook<T> = Arc<
    dyn Fn(&mut ResourceWrapper<T>, &mut ResourceState, &Context) -> Result<(), HookError>
        + Send
        + Sync,
>;

/// Allocates the nested path a field writes into
pub type Materializer<T> = fn(&mut T);

/// Cross-attribute constraint over the whole configuration
pub type Check = fn(&ResourceState) -> Result<(), HookError>;

fn skip_read<T>(
    _: &ResourceWrapper<T>,
    _: &mut ResourceState,
    _: &Context,
) -> Result<(), HookError> {
    Ok(())
}

fn skip_write<T>(
    _: &mut ResourceWrapper<T>,
    _: &ResourceState,
    _: &Context,
) -> Result<(), HookError> {
    Ok(())
}

fn reject_update<T>(
    _: &mut ResourceWrapper<T>,
    _: &ResourceState,
    _: &Context,
) -> Result<(), HookError> {
    Err(HookError::Immutable)
}

/// One configuration attribute: its schema plus lifecycle hooks
///
/// Hooks default to no-ops, so computed-only attributes only install a
/// read hook and config-only attributes only install write hooks.
pub struct GenericField<T> {
    category: Category,
    name: FieldName,
    schema: Schema,
    read: ReadHook<T>,
    create: WriteHook<T>,
    update: WriteHook<T>,
    extra: Option<ExtraHook<T>>,
    materialize: Option<Materializer<T>>,
    check: Option<Check>,
}

impl<T: DomainObject> GenericField<T> {
    pub fn new(category: Category, name: FieldName, schema: Schema) -> Self {
        Self {
            category,
            name,
            schema,
            read: Arc::new(skip_read::<T>),
            create: Arc::new(skip_write::<T>),
            update: Arc::new(skip_write::<T>),
            extra: None,
            materialize: None,
            check: None,
        }
    }

    pub fn on_read<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ResourceWrapper<T>, &mut ResourceState, &Context) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.read = Arc::new(hook);
        self
    }

    pub fn on_create<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ResourceWrapper<T>, &ResourceState, &Context) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.create = Arc::new(hook);
        self
    }

    pub fn on_update<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ResourceWrapper<T>, &ResourceState, &Context) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.update = Arc::new(hook);
        self
    }

    /// Install the same hook for create and update
    pub fn on_write<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ResourceWrapper<T>, &ResourceState, &Context) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        let hook: WriteHook<T> = Arc::new(hook);
        self.create = hook.clone();
        self.update = hook;
        self
    }

    pub fn on_extra<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut ResourceWrapper<T>, &mut ResourceState, &Context) -> Result<(), HookError>
            + Send
            + Sync
            + 'static,
    {
        self.extra = Some(Arc::new(hook));
        self
    }

    /// Declare the nested path allocated before a configured value is written
    pub fn materialize(mut self, materialize: Materializer<T>) -> Self {
        self.materialize = Some(materialize);
        self
    }

    /// Constraint validated on every create and update, whether or not
    /// this field changed
    pub fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Create/update reject any change once the resource exists
    pub fn immutable(mut self) -> Self {
        self.update = Arc::new(reject_update::<T>);
        self
    }

    pub fn name(&self) -> FieldName {
        self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn has_extra(&self) -> bool {
        self.extra.is_some()
    }

    pub(crate) fn run_check(&self, state: &ResourceState) -> Result<(), HookError> {
        match self.check {
            Some(check) => check(state),
            None => Ok(()),
        }
    }

    pub(crate) fn run_read(
        &self,
        wrapper: &ResourceWrapper<T>,
        state: &mut ResourceState,
        ctx: &Context,
    ) -> Result<(), HookError> {
        (self.read)(wrapper, state, ctx)
    }

    pub(crate) fn run_write(
        &self,
        phase: Phase,
        wrapper: &mut ResourceWrapper<T>,
        state: &ResourceState,
        ctx: &Context,
    ) -> Result<(), HookError> {
        if let Some(materialize) = self.materialize {
            if state.get(self.name).is_some() {
                materialize(wrapper.get());
            }
        }
        match phase {
            Phase::Update => (self.update)(wrapper, state, ctx),
            _ => (self.create)(wrapper, state, ctx),
        }
    }

    pub(crate) fn run_extra(
        &self,
        wrapper: &mut ResourceWrapper<T>,
        state: &mut ResourceState,
        ctx: &Context,
    ) -> Result<(), HookError> {
        match &self.extra {
            Some(hook) => hook(wrapper, state, ctx),
            None => Ok(()),
        }
    }
}

impl<T: DomainObject> fmt::Debug for GenericField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericField")
            .field("category", &self.category)
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("extra", &self.extra.is_some())
            .field("check", &self.check.is_some())
            .finish()
    }
}
