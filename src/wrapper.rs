//! Resource wrappers
//!
//! A [`ResourceWrapper`] owns the one domain object a CRUD invocation works
//! on. The root object is allocated on first mutable access; nested objects
//! stay `None` until a hook or the dispatcher's materializer allocates them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

/// Typed representation of a remote resource
pub trait DomainObject:
    Default + Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Server-assigned identifier, once the resource exists
    fn id(&self) -> Option<&str>;
}

/// Per-invocation owner of one domain object
#[derive(Debug, Clone, Default)]
pub struct ResourceWrapper<T> {
    inner: Option<T>,
}

impl<T: DomainObject> ResourceWrapper<T> {
    pub fn new() -> Self {
        Self { inner: None }
    }

    pub fn from_object(object: T) -> Self {
        Self {
            inner: Some(object),
        }
    }

    /// The domain object, allocated on first access
    pub fn get(&mut self) -> &mut T {
        self.inner.get_or_insert_with(T::default)
    }

    /// Read-only view; `None` if nothing has been allocated
    pub fn view(&self) -> Option<&T> {
        self.inner.as_ref()
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.is_some()
    }

    pub fn into_inner(self) -> Option<T> {
        self.inner
    }

    /// The object to submit; an empty wrapper yields a default object
    pub fn into_object(self) -> T {
        self.inner.unwrap_or_default()
    }
}
