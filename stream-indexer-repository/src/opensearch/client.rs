//! OpenSearch client implementation.
//!
//! This module provides the concrete implementation of `SearchStore`
//! using the OpenSearch Rust client.

use async_trait::async_trait;
use opensearch::{
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    indices::{IndicesCreateParts, IndicesExistsParts},
    IndexParts, OpenSearch,
};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchError;
use crate::interfaces::SearchStore;

/// OpenSearch implementation of the search store.
///
/// # Example
///
/// ```ignore
/// use stream_indexer_repository::opensearch::{files_index_settings, FILES_INDEX};
///
/// let client = OpenSearchClient::new("http://localhost:9200")?;
/// if !client.index_exists(FILES_INDEX).await? {
///     client.create_index(FILES_INDEX, &files_index_settings()).await?;
/// }
/// ```
pub struct OpenSearchClient {
    client: OpenSearch,
}

impl OpenSearchClient {
    /// Create a new OpenSearch client connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchClient)` - A new client instance
    /// * `Err(SearchError)` - If connection setup fails
    pub fn new(url: &str) -> Result<Self, SearchError> {
        let parsed_url = Url::parse(url).map_err(|e| SearchError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, "Created OpenSearch client");

        Ok(Self { client })
    }
}

#[async_trait]
impl SearchStore for OpenSearchClient {
    /// Check whether the named index exists.
    ///
    /// A 404 from the exists API means the index is absent; any other
    /// non-success status is surfaced as an error.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[index]))
            .send()
            .await
            .map_err(|e| SearchError::exists_check(e.to_string()))?;

        let status = response.status_code();
        if status.as_u16() == 404 {
            return Ok(false);
        }
        if !status.is_success() {
            return Err(SearchError::exists_check(format!(
                "Exists check for '{}' failed with status {}",
                index, status
            )));
        }

        Ok(true)
    }

    /// Create the named index with the given settings and mappings.
    async fn create_index(&self, index: &str, mapping: &Value) -> Result<(), SearchError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(index))
            .body(mapping)
            .send()
            .await
            .map_err(|e| SearchError::index_creation(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(index = %index, status = %status, body = %error_body, "Index creation failed");
            return Err(SearchError::index_creation(format!(
                "Create index '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        info!(index = %index, "Created search index");
        Ok(())
    }

    /// Insert or overwrite the identically-identified document.
    ///
    /// Uses the index API with an explicit document id, so re-submitting the
    /// same document replaces it in place.
    async fn upsert_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchError> {
        let response = self
            .client
            .index(IndexParts::IndexId(index, id))
            .body(document)
            .send()
            .await
            .map_err(|e| SearchError::index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(
                index = %index,
                doc_id = %id,
                status = %status,
                body = %error_body,
                "Upsert request failed"
            );
            return Err(SearchError::index(format!(
                "Upsert into '{}' failed with status {}: {}",
                index, status, error_body
            )));
        }

        debug!(index = %index, doc_id = %id, "Document upserted");
        Ok(())
    }

    /// Check if the cluster is reachable.
    async fn health_check(&self) -> Result<bool, SearchError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchError::connection(e.to_string()))?;

        Ok(response.status_code().is_success())
    }
}
