//! Low-level OpenSearch REST client.
//!
//! One shared `reqwest::Client` with basic auth; callers speak JSON bodies
//! and NDJSON bulk payloads. Non-2xx responses surface as
//! [`SearchError::Status`] with the response body for the logs.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::Value;

use mintlog_core::config::OpenSearchConfig;

use crate::error::SearchError;

#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    base_url: String,
    user: String,
    password: String,
    client: reqwest::Client,
}

/// Outcome of a `_bulk` call. `errors` is set when any item failed even
/// though the transport succeeded.
#[derive(Debug, Deserialize)]
pub struct BulkResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<Value>,
}

impl OpenSearchClient {
    pub fn new(config: &OpenSearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            password: config.password.clone(),
            client,
        })
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, SearchError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SearchError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Execute an NDJSON `_bulk` payload.
    pub async fn bulk(&self, body: String) -> Result<BulkResponse, SearchError> {
        let url = format!("{}/_bulk", self.base_url);
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .header(CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Execute a `_search` against a comma-joined index list. Missing
    /// concrete indices are ignored so fresh tenants query cleanly.
    pub async fn search(&self, indices: &[String], query: &Value) -> Result<Value, SearchError> {
        let url = format!(
            "{}/{}/_search?ignore_unavailable=true",
            self.base_url,
            indices.join(",")
        );
        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(query)
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Install (or overwrite) an index template.
    pub async fn put_index_template(&self, name: &str, body: &Value) -> Result<(), SearchError> {
        let url = format!("{}/_index_template/{name}", self.base_url);
        let resp = self
            .client
            .put(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }
}
