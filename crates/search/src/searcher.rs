//! Typed search results over the raw client.

use serde_json::Value;

use crate::client::OpenSearchClient;
use crate::error::SearchError;

#[derive(Debug, Clone)]
pub struct Searcher {
    client: OpenSearchClient,
}

/// Hit sources plus the total match count.
#[derive(Debug)]
pub struct SearchResult {
    pub hits: Vec<Value>,
    pub total: i64,
}

impl Searcher {
    pub fn new(client: OpenSearchClient) -> Self {
        Self { client }
    }

    pub async fn search(
        &self,
        indices: &[String],
        query: &Value,
    ) -> Result<SearchResult, SearchError> {
        let resp = self.client.search(indices, query).await?;

        let total = resp["hits"]["total"]["value"].as_i64().unwrap_or(0);
        let hits = resp["hits"]["hits"]
            .as_array()
            .map(|hits| {
                hits.iter()
                    .map(|hit| hit["_source"].clone())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(SearchResult { hits, total })
    }

    /// Run an aggregation query and return the raw `aggregations` object.
    pub async fn aggregate(&self, indices: &[String], query: &Value) -> Result<Value, SearchError> {
        let resp = self.client.search(indices, query).await?;
        Ok(resp.get("aggregations").cloned().unwrap_or(Value::Null))
    }
}
