//! Resource dispatch layer
//!
//! Turns a composed [`FieldsMap`](crate::field::FieldsMap) into a resource
//! the host can drive through Read/Create/Update/Delete/Import.
//!
//! # Architecture
//!
//! - [`generic`] - CRUD dispatcher iterating the registered fields
//! - [`remote`] - Remote API contract and its JSON/REST implementation
//!
//! # Example
//!
//! ```ignore
//! let fields = FieldsMap::build(&[Contributor::new("group", group::setup)])?;
//! let api = Arc::new(HttpResourceApi::new(client, GROUP_ENDPOINT));
//! let resource = GenericResource::new("compute_group", fields, api);
//! resource.create(&mut state).await?;
//! ```

pub mod generic;
pub mod remote;

pub use generic::{GenericResource, ResourceHandler};
pub use remote::{extract_first, Endpoint, HttpResourceApi, RemoteApi};
