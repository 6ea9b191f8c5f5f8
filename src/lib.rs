//! fieldform
//!
//! Field-registry and CRUD-dispatch framework for infrastructure-as-code
//! provider resources. Each resource kind is assembled from independent
//! sub-resource modules that register typed fields; a generic dispatcher
//! drives Read/Create/Update/Delete/Import by iterating those fields.
//!
//! # Module Structure
//!
//! - [`field`] - FieldName, GenericField, schema fragments, registry
//! - [`wrapper`] - typed lazy holder of the domain object
//! - [`state`] - host-supplied configuration state
//! - [`resource`] - CRUD dispatcher and the remote API contract
//! - [`client`] - REST client for the remote API
//! - [`provider`] - the concrete resource kinds
//! - [`config`] - persistent user configuration

pub mod client;
pub mod config;
pub mod error;
pub mod field;
pub mod provider;
pub mod resource;
pub mod state;
pub mod wrapper;

pub use error::{HookError, RegistryError, ResourceError};
pub use field::{Category, Context, FieldName, FieldsMap, GenericField, Operation, Phase};
pub use provider::Provider;
pub use resource::{GenericResource, RemoteApi, ResourceHandler};
pub use state::ResourceState;
pub use wrapper::{DomainObject, ResourceWrapper};
