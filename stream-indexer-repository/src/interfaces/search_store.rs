//! Search store trait definition.
//!
//! This module defines the abstract interface for search index operations,
//! allowing for different backend implementations (OpenSearch, mocks, etc.).

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::SearchError;

/// Abstract interface for search index operations.
///
/// The indexer only needs three things from the search backend: check whether
/// an index exists, create it with a fixed mapping, and upsert documents into
/// it. A health check is exposed for startup verification.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the poll loop shares one handle
/// across concurrent per-record pipeline invocations with no additional
/// locking, so every method must be safe for concurrent independent calls.
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Check whether the named index exists.
    async fn index_exists(&self, index: &str) -> Result<bool, SearchError>;

    /// Create the named index with the given settings and mappings.
    ///
    /// Callers are expected to check [`SearchStore::index_exists`] first;
    /// this method never deletes or migrates an existing index.
    async fn create_index(&self, index: &str, mapping: &Value) -> Result<(), SearchError>;

    /// Insert or overwrite the document with the given id in the named index.
    ///
    /// The write is keyed by `id`: re-submitting the same document replaces
    /// it rather than creating a duplicate, and the success or failure of one
    /// document's write is independent of any other's.
    async fn upsert_document(
        &self,
        index: &str,
        id: &str,
        document: &Value,
    ) -> Result<(), SearchError>;

    /// Check if the search backend is healthy and reachable.
    async fn health_check(&self) -> Result<bool, SearchError>;
}
