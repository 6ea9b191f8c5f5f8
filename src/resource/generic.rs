//! Generic Resource
//!
//! Assembles a resource type from its [`FieldsMap`] and runs each CRUD
//! operation as a single pass over the fields in registration order. The
//! first failing hook aborts the pass.

use super::remote::RemoteApi;
use crate::error::ResourceError;
use crate::field::{Context, FieldsMap, Operation, Phase, ResourceSchema};
use crate::state::ResourceState;
use crate::wrapper::{DomainObject, ResourceWrapper};
use async_trait::async_trait;
use std::sync::Arc;

/// Object-safe view of a resource type, used by the provider registry
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    fn resource_type(&self) -> &'static str;

    fn schema(&self) -> ResourceSchema;

    fn validate(&self, state: &ResourceState) -> Result<(), ResourceError>;

    async fn read(&self, state: &mut ResourceState) -> Result<(), ResourceError>;

    async fn create(&self, state: &mut ResourceState) -> Result<(), ResourceError>;

    async fn update(&self, state: &mut ResourceState) -> Result<(), ResourceError>;

    async fn delete(&self, state: &mut ResourceState) -> Result<(), ResourceError>;

    async fn import(&self, id: &str, state: &mut ResourceState) -> Result<(), ResourceError>;
}

/// A resource type built from composed fields
pub struct GenericResource<T> {
    resource_type: &'static str,
    fields: FieldsMap<T>,
    api: Arc<dyn RemoteApi<T>>,
}

impl<T: DomainObject> GenericResource<T> {
    pub fn new(resource_type: &'static str, fields: FieldsMap<T>, api: Arc<dyn RemoteApi<T>>) -> Self {
        Self {
            resource_type,
            fields,
            api,
        }
    }

    pub fn fields(&self) -> &FieldsMap<T> {
        &self.fields
    }

    fn context(&self, operation: Operation) -> Context {
        Context::new(operation, self.resource_type)
    }

    // =========================================================================
    // Field passes
    // =========================================================================

    /// Project the wrapped object into state, field by field
    pub fn read_fields(
        &self,
        wrapper: &ResourceWrapper<T>,
        state: &mut ResourceState,
        ctx: &Context,
    ) -> Result<(), ResourceError> {
        for field in self.fields.iter() {
            tracing::debug!("{} read hook: {}", self.resource_type, field.name());
            field
                .run_read(wrapper, state, ctx)
                .map_err(|source| ResourceError::Read {
                    operation: ctx.operation,
                    field: field.name(),
                    source,
                })?;

            if field.schema().state_func.is_some() {
                let normalized = state
                    .values()
                    .get(field.name().as_str())
                    .map(|v| field.schema().normalized(v));
                if let Some(normalized) = normalized {
                    state
                        .values_mut()
                        .insert(field.name().to_string(), normalized);
                }
            }
        }
        Ok(())
    }

    /// Project state into the wrapped object
    ///
    /// Create runs every field; update runs only fields whose value changed.
    /// Returns the number of hooks that ran.
    pub fn expand_fields(
        &self,
        phase: Phase,
        wrapper: &mut ResourceWrapper<T>,
        state: &ResourceState,
        ctx: &Context,
    ) -> Result<usize, ResourceError> {
        let mut ran = 0;
        for field in self.fields.iter() {
            let name = field.name();
            let schema = field.schema();
            if schema.is_computed_only() {
                continue;
            }
            if phase == Phase::Update
                && !schema.differs(
                    name.as_str(),
                    state.prior().get(name.as_str()),
                    state.values().get(name.as_str()),
                )
            {
                continue;
            }

            tracing::debug!("{} {:?} hook: {}", self.resource_type, phase, name);
            field
                .run_write(phase, wrapper, state, ctx)
                .map_err(|source| ResourceError::Expand {
                    operation: ctx.operation,
                    phase,
                    field: name,
                    source,
                })?;
            ran += 1;
        }
        Ok(ran)
    }

    /// Run every extra hook (import-time merge)
    pub fn merge_fields(
        &self,
        wrapper: &mut ResourceWrapper<T>,
        state: &mut ResourceState,
        ctx: &Context,
    ) -> Result<(), ResourceError> {
        for field in self.fields.iter().filter(|f| f.has_extra()) {
            tracing::debug!("{} extra hook: {}", self.resource_type, field.name());
            field
                .run_extra(wrapper, state, ctx)
                .map_err(|source| ResourceError::Merge {
                    operation: ctx.operation,
                    field: field.name(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Store a fresh remote object into state
    fn apply_remote(
        &self,
        object: T,
        state: &mut ResourceState,
        ctx: &Context,
    ) -> Result<(), ResourceError> {
        if let Some(id) = object.id() {
            state.set_id(id);
        }
        let wrapper = ResourceWrapper::from_object(object);
        self.read_fields(&wrapper, state, ctx)?;
        state.commit();
        Ok(())
    }

    // =========================================================================
    // Operations
    // =========================================================================

    pub async fn read(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        let ctx = self.context(Operation::Read);
        let id = state
            .id()
            .map(String::from)
            .ok_or(ResourceError::MissingId(Operation::Read))?;
        tracing::info!("{} read {} (request {})", self.resource_type, id, ctx.request_id);

        match self.api.read(&id, &ctx).await.map_err(ResourceError::Remote)? {
            Some(object) => self.apply_remote(object, state, &ctx),
            None => {
                tracing::warn!(
                    "{} {} no longer exists, removing from state",
                    self.resource_type,
                    id
                );
                state.reset();
                Ok(())
            },
        }
    }

    pub async fn create(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        let ctx = self.context(Operation::Create);
        tracing::info!("{} create (request {})", self.resource_type, ctx.request_id);

        let schema = self.schema();
        schema.attributes.apply_defaults(state.values_mut());
        self.validate(state)?;

        let mut wrapper = ResourceWrapper::new();
        self.expand_fields(Phase::Create, &mut wrapper, state, &ctx)?;
        let object = wrapper.into_object();

        let created = self
            .api
            .create(&object, &ctx)
            .await
            .map_err(ResourceError::Remote)?;
        let id = created.id().map(String::from).ok_or_else(|| {
            ResourceError::Remote(anyhow::anyhow!(
                "{} create returned no identifier",
                self.resource_type
            ))
        })?;
        state.set_id(id.clone());
        tracing::info!(
            "{} created {} in {}ms",
            self.resource_type,
            id,
            ctx.elapsed_ms()
        );

        self.apply_remote(created, state, &ctx)
    }

    pub async fn update(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        let ctx = self.context(Operation::Update);
        let id = state
            .id()
            .map(String::from)
            .ok_or(ResourceError::MissingId(Operation::Update))?;
        tracing::info!("{} update {} (request {})", self.resource_type, id, ctx.request_id);

        self.schema().attributes.apply_defaults(state.values_mut());
        self.validate(state)?;

        let mut wrapper = ResourceWrapper::new();
        let changed = self.expand_fields(Phase::Update, &mut wrapper, state, &ctx)?;
        if changed == 0 {
            tracing::debug!("{} {} has no changes", self.resource_type, id);
            state.commit();
            return Ok(());
        }

        let updated = self
            .api
            .update(&id, &wrapper.into_object(), &ctx)
            .await
            .map_err(ResourceError::Remote)?;
        self.apply_remote(updated, state, &ctx)
    }

    pub async fn delete(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        let ctx = self.context(Operation::Delete);
        let id = state
            .id()
            .map(String::from)
            .ok_or(ResourceError::MissingId(Operation::Delete))?;
        tracing::info!("{} delete {} (request {})", self.resource_type, id, ctx.request_id);

        self.api
            .delete(&id, &ctx)
            .await
            .map_err(ResourceError::Remote)?;
        state.reset();
        Ok(())
    }

    pub async fn import(&self, id: &str, state: &mut ResourceState) -> Result<(), ResourceError> {
        let ctx = self.context(Operation::Import);
        tracing::info!("{} import {} (request {})", self.resource_type, id, ctx.request_id);

        let object = self
            .api
            .read(id, &ctx)
            .await
            .map_err(ResourceError::Remote)?
            .ok_or_else(|| ResourceError::NotFound {
                resource_type: self.resource_type,
                id: id.to_string(),
            })?;

        state.set_id(id);
        let mut wrapper = ResourceWrapper::from_object(object);
        self.merge_fields(&mut wrapper, state, &ctx)?;
        self.read_fields(&wrapper, state, &ctx)?;
        state.commit();
        Ok(())
    }

    pub fn schema(&self) -> ResourceSchema {
        self.fields.schema(self.resource_type)
    }

    /// Check the whole configuration: schema first, then every field's
    /// cross-attribute constraint
    pub fn validate(&self, state: &ResourceState) -> Result<(), ResourceError> {
        self.schema()
            .check(state.values())
            .map_err(|v| ResourceError::Validation {
                path: v.path,
                message: v.message,
            })?;

        for field in self.fields.iter() {
            field
                .run_check(state)
                .map_err(|source| ResourceError::Validation {
                    path: field.name().to_string(),
                    message: source.to_string(),
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl<T: DomainObject> ResourceHandler for GenericResource<T> {
    fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    fn schema(&self) -> ResourceSchema {
        GenericResource::schema(self)
    }

    fn validate(&self, state: &ResourceState) -> Result<(), ResourceError> {
        GenericResource::validate(self, state)
    }

    async fn read(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        GenericResource::read(self, state).await
    }

    async fn create(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        GenericResource::create(self, state).await
    }

    async fn update(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        GenericResource::update(self, state).await
    }

    async fn delete(&self, state: &mut ResourceState) -> Result<(), ResourceError> {
        GenericResource::delete(self, state).await
    }

    async fn import(&self, id: &str, state: &mut ResourceState) -> Result<(), ResourceError> {
        GenericResource::import(self, id, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{HookError, RegistryError};
    use crate::field::{Category, Contributor, FieldName, FieldsMapBuilder, GenericField, Schema};
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Map, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Probe {
        id: Option<String>,
        name: Option<String>,
        size: Option<i64>,
        legacy_name: Option<String>,
        created_at: Option<String>,
    }

    impl DomainObject for Probe {
        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    const PROBE: Category = Category::new("probe");
    const NAME: FieldName = FieldName::new("name");
    const SIZE: FieldName = FieldName::new("size");
    const CREATED_AT: FieldName = FieldName::new("created_at");

    fn setup_probe(fields: &mut FieldsMapBuilder<Probe>) -> Result<(), RegistryError> {
        fields.register(
            GenericField::<Probe>::new(PROBE, NAME, Schema::string().required())
                .on_read(|w, state, _| match w.view() {
                    Some(p) => state.set(NAME, &p.name),
                    None => Ok(()),
                })
                .on_write(|w, state, _| {
                    w.get().name = state.get_str(NAME).map(String::from);
                    Ok(())
                })
                .on_extra(|w, _, _| {
                    let probe = w.get();
                    if probe.name.is_none() {
                        probe.name = probe.legacy_name.take();
                    }
                    Ok(())
                }),
        )?;
        fields.register(
            GenericField::<Probe>::new(PROBE, SIZE, Schema::int().optional().default(json!(1)))
                .on_read(|w, state, _| match w.view() {
                    Some(p) => state.set(SIZE, &p.size),
                    None => Ok(()),
                })
                .on_write(|w, state, _| {
                    w.get().size = state.get_i64(SIZE);
                    Ok(())
                }),
        )?;
        fields.register(
            GenericField::<Probe>::new(PROBE, CREATED_AT, Schema::string().computed()).on_read(
                |w, state, _| match w.view() {
                    Some(p) => state.set(CREATED_AT, &p.created_at),
                    None => Ok(()),
                },
            ),
        )?;
        Ok(())
    }

    #[derive(Default)]
    struct MemoryApi {
        objects: Mutex<HashMap<String, Probe>>,
        submitted: Mutex<Vec<Probe>>,
        next_id: AtomicUsize,
    }

    #[async_trait]
    impl RemoteApi<Probe> for MemoryApi {
        async fn create(&self, object: &Probe, _ctx: &Context) -> anyhow::Result<Probe> {
            let id = format!("probe-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
            let mut created = object.clone();
            created.id = Some(id.clone());
            created.created_at = Some("2026-01-01T00:00:00Z".to_string());
            self.submitted.lock().unwrap().push(object.clone());
            self.objects.lock().unwrap().insert(id, created.clone());
            Ok(created)
        }

        async fn read(&self, id: &str, _ctx: &Context) -> anyhow::Result<Option<Probe>> {
            Ok(self.objects.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, id: &str, object: &Probe, _ctx: &Context) -> anyhow::Result<Probe> {
            self.submitted.lock().unwrap().push(object.clone());
            let mut objects = self.objects.lock().unwrap();
            let current = objects
                .get_mut(id)
                .ok_or_else(|| anyhow::anyhow!("API request failed: 404"))?;
            if object.name.is_some() {
                current.name = object.name.clone();
            }
            if object.size.is_some() {
                current.size = object.size;
            }
            Ok(current.clone())
        }

        async fn delete(&self, id: &str, _ctx: &Context) -> anyhow::Result<()> {
            self.objects.lock().unwrap().remove(id);
            Ok(())
        }
    }

    fn resource(api: Arc<MemoryApi>) -> GenericResource<Probe> {
        let fields = FieldsMap::build(&[Contributor::new("probe", setup_probe)]).unwrap();
        GenericResource::new("probe", fields, api)
    }

    fn values(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_create_sets_id_and_computed_fields() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"name": "web"})));

        res.create(&mut state).await.unwrap();

        assert_eq!(state.id(), Some("probe-0"));
        assert_eq!(state.get_i64(SIZE), Some(1));
        assert_eq!(state.get_str(CREATED_AT), Some("2026-01-01T00:00:00Z"));
        assert!(!state.has_change(NAME));
    }

    #[tokio::test]
    async fn test_create_validates_before_any_hook() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"size": 3})));

        let err = res.create(&mut state).await.unwrap_err();
        assert!(matches!(err, ResourceError::Validation { ref path, .. } if path == "name"));
        assert!(api.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_submits_only_changed_fields() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"name": "web", "size": 2})));
        res.create(&mut state).await.unwrap();

        state.set(SIZE, &5).unwrap();
        res.update(&mut state).await.unwrap();

        let submitted = api.submitted.lock().unwrap();
        let partial = submitted.last().unwrap();
        assert_eq!(partial.size, Some(5));
        assert_eq!(partial.name, None);
        assert_eq!(state.get_i64(SIZE), Some(5));
        assert_eq!(state.get_str(NAME), Some("web"));
    }

    #[tokio::test]
    async fn test_update_without_changes_skips_remote() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"name": "web"})));
        res.create(&mut state).await.unwrap();

        res.update(&mut state).await.unwrap();
        assert_eq!(api.submitted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_read_is_idempotent() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"name": "web"})));
        res.create(&mut state).await.unwrap();

        res.read(&mut state).await.unwrap();
        let first = state.clone();
        res.read(&mut state).await.unwrap();
        assert_eq!(first, state);
    }

    #[tokio::test]
    async fn test_read_of_missing_resource_clears_state() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api);
        let mut state = ResourceState::existing("probe-9", values(json!({"name": "x"})), Map::new());

        res.read(&mut state).await.unwrap();
        assert!(state.is_new());
        assert!(state.values().is_empty());
    }

    #[tokio::test]
    async fn test_operations_require_id() {
        let res = resource(Arc::new(MemoryApi::default()));
        let mut state = ResourceState::new();
        assert!(matches!(
            res.read(&mut state).await,
            Err(ResourceError::MissingId(Operation::Read))
        ));
        assert!(matches!(
            res.delete(&mut state).await,
            Err(ResourceError::MissingId(Operation::Delete))
        ));
    }

    #[tokio::test]
    async fn test_delete_only_uses_id() {
        let api = Arc::new(MemoryApi::default());
        let res = resource(api.clone());
        let mut state = ResourceState::from_values(values(json!({"name": "web"})));
        res.create(&mut state).await.unwrap();

        res.delete(&mut state).await.unwrap();
        assert!(state.is_new());
        assert!(api.objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_merges_legacy_representation() {
        let api = Arc::new(MemoryApi::default());
        api.objects.lock().unwrap().insert(
            "probe-legacy".to_string(),
            Probe {
                id: Some("probe-legacy".to_string()),
                legacy_name: Some("old-web".to_string()),
                ..Probe::default()
            },
        );
        let res = resource(api);
        let mut state = ResourceState::new();

        res.import("probe-legacy", &mut state).await.unwrap();
        assert_eq!(state.id(), Some("probe-legacy"));
        assert_eq!(state.get_str(NAME), Some("old-web"));
    }

    #[tokio::test]
    async fn test_import_of_missing_id_is_not_retryable() {
        let res = resource(Arc::new(MemoryApi::default()));
        let mut state = ResourceState::new();

        let err = res.import("gone-1", &mut state).await.unwrap_err();
        assert!(matches!(&err, ResourceError::NotFound { id, .. } if id == "gone-1"));
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "probe gone-1 does not exist");
        assert!(state.is_new());
    }

    #[tokio::test]
    async fn test_concurrent_invocations_are_isolated() {
        let api = Arc::new(MemoryApi::default());
        let res = Arc::new(resource(api.clone()));

        let tasks: Vec<_> = (0..8i64)
            .map(|i| {
                let res = res.clone();
                tokio::spawn(async move {
                    let mut state = ResourceState::from_values(values(
                        json!({"name": format!("web-{}", i), "size": i}),
                    ));
                    res.create(&mut state).await.map(|_| (i, state))
                })
            })
            .collect();

        for task in futures::future::join_all(tasks).await {
            let (i, state) = task.unwrap().unwrap();
            assert_eq!(state.get_str(NAME), Some(format!("web-{}", i).as_str()));
            assert_eq!(state.get_i64(SIZE), Some(i));
        }
        assert_eq!(api.objects.lock().unwrap().len(), 8);
    }

    // Fail-fast: the hook after a failing one must never run.

    static AFTER_FAILURE: AtomicUsize = AtomicUsize::new(0);
    const FIRST: FieldName = FieldName::new("first");
    const BROKEN: FieldName = FieldName::new("broken");
    const LAST: FieldName = FieldName::new("last");

    fn setup_failing(fields: &mut FieldsMapBuilder<Probe>) -> Result<(), RegistryError> {
        fields.register(
            GenericField::<Probe>::new(PROBE, FIRST, Schema::string().optional()).on_write(|w, _, _| {
                w.get().name = Some("first".to_string());
                Ok(())
            }),
        )?;
        fields.register(
            GenericField::<Probe>::new(PROBE, BROKEN, Schema::string().optional())
                .on_write(|_, _, _| Err(HookError::invalid("unsupported value")))
                .on_read(|_, _, _| Err(HookError::invalid("cannot project"))),
        )?;
        fields.register(
            GenericField::<Probe>::new(PROBE, LAST, Schema::string().optional())
                .on_write(|_, _, _| {
                    AFTER_FAILURE.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .on_read(|_, _, _| {
                    AFTER_FAILURE.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
        )
    }

    #[tokio::test]
    async fn test_first_hook_error_aborts_pass() {
        let fields = FieldsMap::build(&[Contributor::new("failing", setup_failing)]).unwrap();
        let api = Arc::new(MemoryApi::default());
        let res = GenericResource::new("probe", fields, api.clone());
        let mut state = ResourceState::new();

        let err = res.create(&mut state).await.unwrap_err();
        assert_eq!(err.field(), Some("broken"));
        assert_eq!(
            err.to_string(),
            "create failed expanding field broken - invalid value: unsupported value"
        );
        assert!(api.submitted.lock().unwrap().is_empty());

        let ctx = Context::new(Operation::Read, "probe");
        let wrapper = ResourceWrapper::from_object(Probe::default());
        let err = res.read_fields(&wrapper, &mut state, &ctx).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("read failed reading field broken - "));

        assert_eq!(AFTER_FAILURE.load(Ordering::SeqCst), 0);
    }
}
