//! API Client
//!
//! Main client for the remote resource API, combining the base endpoint,
//! credentials and HTTP functionality.

use super::http::HttpClient;
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Connection settings for the remote API
#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub base_url: String,
    pub token: Option<String>,
    pub account: Option<String>,
    pub timeout: Duration,
}

/// Main API client
#[derive(Clone)]
pub struct ApiClient {
    pub http: HttpClient,
    base_url: Url,
    token: Option<String>,
    account: Option<String>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(settings: &ApiSettings) -> Result<Self> {
        let mut base = settings.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)
            .with_context(|| format!("Invalid API URL: {}", settings.base_url))?;

        let http = HttpClient::new(settings.timeout)?;

        Ok(Self {
            http,
            base_url,
            token: settings.token.clone(),
            account: settings.account.clone(),
        })
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Make a GET request
    pub async fn get(&self, url: &str) -> Result<Value> {
        self.http.get(url, self.token.as_deref()).await
    }

    /// Make a POST request
    pub async fn post(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.http.post(url, self.token.as_deref(), body).await
    }

    /// Make a PUT request
    pub async fn put(&self, url: &str, body: Option<&Value>) -> Result<Value> {
        self.http.put(url, self.token.as_deref(), body).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, url: &str) -> Result<Value> {
        self.http.delete(url, self.token.as_deref()).await
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Build a collection URL, e.g. `{base}/compute/group`
    pub fn collection_url(&self, collection: &str) -> Result<String> {
        self.build_url(collection.trim_matches('/'))
    }

    /// Build a single-resource URL, e.g. `{base}/compute/group/sig-123`
    pub fn resource_url(&self, collection: &str, id: &str) -> Result<String> {
        self.build_url(&format!(
            "{}/{}",
            collection.trim_matches('/'),
            urlencoding::encode(id)
        ))
    }

    fn build_url(&self, path: &str) -> Result<String> {
        let mut url = self
            .base_url
            .join(path)
            .with_context(|| format!("Invalid API path: {}", path))?;
        if let Some(account) = &self.account {
            url.query_pairs_mut().append_pair("accountId", account);
        }
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(base_url: &str, account: Option<&str>) -> ApiSettings {
        ApiSettings {
            base_url: base_url.to_string(),
            token: Some("token".to_string()),
            account: account.map(String::from),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_collection_url() {
        let client = ApiClient::new(&settings("https://api.example.com/v1", None)).unwrap();
        assert_eq!(
            client.collection_url("compute/group").unwrap(),
            "https://api.example.com/v1/compute/group"
        );
    }

    #[test]
    fn test_resource_url_with_account() {
        let client =
            ApiClient::new(&settings("https://api.example.com/", Some("act-123"))).unwrap();
        assert_eq!(
            client.resource_url("/node/pool/", "np 1").unwrap(),
            "https://api.example.com/node/pool/np%201?accountId=act-123"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new(&settings("not a url", None)).is_err());
    }
}
