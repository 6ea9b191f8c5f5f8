//! Remote API interaction module
//!
//! # Module Structure
//!
//! - [`client`] - API client combining endpoint, credentials and HTTP
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use fieldform::client::{ApiClient, ApiSettings};
//!
//! async fn example(settings: &ApiSettings) -> anyhow::Result<()> {
//!     let client = ApiClient::new(settings)?;
//!     let group = client.get(&client.resource_url("compute/group", "sig-1")?).await?;
//!     Ok(())
//! }
//! ```

#[allow(clippy::module_inception)]
pub mod client;
pub mod http;

pub use client::{ApiClient, ApiSettings};
pub use http::{error_status, format_api_error, ApiStatusError};
