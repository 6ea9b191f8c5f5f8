//! Remote API
//!
//! The collaborator the dispatcher hands populated domain objects to.
//! [`HttpResourceApi`] implements it over JSON/REST; tests and embedders can
//! supply their own implementation.

use crate::client::{error_status, ApiClient};
use crate::field::Context;
use crate::wrapper::DomainObject;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::marker::PhantomData;

/// CRUD calls against the remote service. No retries happen here.
#[async_trait]
pub trait RemoteApi<T: DomainObject>: Send + Sync {
    /// Create the object and return it with server-assigned fields
    async fn create(&self, object: &T, ctx: &Context) -> Result<T>;

    /// Fetch the object; `None` when it no longer exists
    async fn read(&self, id: &str, ctx: &Context) -> Result<Option<T>>;

    /// Apply a partial object and return the updated one
    async fn update(&self, id: &str, object: &T, ctx: &Context) -> Result<T>;

    async fn delete(&self, id: &str, ctx: &Context) -> Result<()>;
}

/// Where a resource type lives on the REST API
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    /// Collection path relative to the API base, e.g. `compute/group`
    pub collection: &'static str,
    /// Request body key wrapping the object, e.g. `group`
    pub envelope: &'static str,
    /// Dot path to the returned items, e.g. `response.items`
    pub response_path: &'static str,
}

/// JSON/REST implementation of [`RemoteApi`]
pub struct HttpResourceApi<T> {
    client: ApiClient,
    endpoint: Endpoint,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DomainObject> HttpResourceApi<T> {
    pub fn new(client: ApiClient, endpoint: Endpoint) -> Self {
        Self {
            client,
            endpoint,
            _marker: PhantomData,
        }
    }

    fn envelope(&self, object: &T) -> Result<Value> {
        let body = serde_json::to_value(object).context("Failed to serialize request body")?;
        let mut wrapped = serde_json::Map::new();
        wrapped.insert(self.endpoint.envelope.to_string(), body);
        Ok(Value::Object(wrapped))
    }

    fn decode(&self, response: &Value) -> Result<T> {
        let item = extract_first(response, self.endpoint.response_path).ok_or_else(|| {
            anyhow::anyhow!(
                "Response has no item at '{}'",
                self.endpoint.response_path
            )
        })?;
        serde_json::from_value(item.clone()).context("Failed to decode response item")
    }
}

#[async_trait]
impl<T: DomainObject> RemoteApi<T> for HttpResourceApi<T> {
    async fn create(&self, object: &T, ctx: &Context) -> Result<T> {
        tracing::info!(
            "create {} (request {})",
            ctx.resource_type,
            ctx.request_id
        );
        let url = self.client.collection_url(self.endpoint.collection)?;
        let body = self.envelope(object)?;
        let response = self.client.post(&url, Some(&body)).await?;
        self.decode(&response)
    }

    async fn read(&self, id: &str, ctx: &Context) -> Result<Option<T>> {
        tracing::debug!("read {} {} (request {})", ctx.resource_type, id, ctx.request_id);
        let url = self.client.resource_url(self.endpoint.collection, id)?;
        match self.client.get(&url).await {
            Ok(response) => match extract_first(&response, self.endpoint.response_path) {
                Some(item) => Ok(Some(
                    serde_json::from_value(item.clone())
                        .context("Failed to decode response item")?,
                )),
                None => Ok(None),
            },
            Err(e) if error_status(&e) == Some(404) => {
                tracing::warn!("{} {} not found", ctx.resource_type, id);
                Ok(None)
            },
            Err(e) => Err(e),
        }
    }

    async fn update(&self, id: &str, object: &T, ctx: &Context) -> Result<T> {
        tracing::info!(
            "update {} {} (request {})",
            ctx.resource_type,
            id,
            ctx.request_id
        );
        let url = self.client.resource_url(self.endpoint.collection, id)?;
        let body = self.envelope(object)?;
        let response = self.client.put(&url, Some(&body)).await?;
        self.decode(&response)
    }

    async fn delete(&self, id: &str, ctx: &Context) -> Result<()> {
        tracing::info!(
            "delete {} {} (request {})",
            ctx.resource_type,
            id,
            ctx.request_id
        );
        let url = self.client.resource_url(self.endpoint.collection, id)?;
        match self.client.delete(&url).await {
            Ok(_) => Ok(()),
            // Already gone
            Err(e) if error_status(&e) == Some(404) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// First item at a dot-separated path
///
/// An array at the path yields its first element; an object yields itself;
/// an empty path addresses the response root.
pub fn extract_first<'a>(response: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = response;
    if !path.is_empty() {
        for part in path.split('.') {
            current = match part.parse::<usize>() {
                Ok(idx) => current.get(idx)?,
                Err(_) => current.get(part)?,
            };
        }
    }

    match current {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(current),
        _ => None,
    }
}
