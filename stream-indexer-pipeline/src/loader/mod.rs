//! Loader module for the stream indexer pipeline.
//!
//! Upserts resolved documents into the search store and ensures the target
//! indices exist with the expected schema at startup.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use stream_indexer_repository::opensearch::{
    files_index_settings, products_index_settings, FILES_INDEX, PRODUCTS_INDEX,
};
use stream_indexer_repository::{SearchError, SearchStore};

use crate::errors::PipelineError;
use crate::processor::IndexRequest;

/// Configuration for the search loader.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Maximum number of retry attempts for a failed upsert.
    pub max_retries: u32,
    /// Initial retry delay in milliseconds.
    pub initial_retry_delay_ms: u64,
    /// Maximum retry delay in milliseconds.
    pub max_retry_delay_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_retry_delay_ms: 100,
            max_retry_delay_ms: 5000,
        }
    }
}

/// Outcome counts for one loaded batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    /// Documents successfully upserted.
    pub indexed: usize,
    /// Documents dropped after exhausting retries.
    pub failed: usize,
}

/// Loader that upserts documents into the search store.
///
/// Each document's write is independent: a failed write is retried a bounded
/// number of times for transient errors, then logged with the document's
/// natural key and dropped. There is no dead-letter mechanism; a dropped
/// document is only recovered if the source event is replayed.
pub struct SearchLoader {
    client: Arc<dyn SearchStore>,
    config: LoaderConfig,
}

impl SearchLoader {
    /// Create a new search loader with the given client.
    pub fn new(client: Arc<dyn SearchStore>) -> Self {
        Self {
            client,
            config: LoaderConfig::default(),
        }
    }

    /// Create a new search loader with custom configuration.
    pub fn with_config(client: Arc<dyn SearchStore>, config: LoaderConfig) -> Self {
        Self { client, config }
    }

    /// Ensure both target indices exist with their fixed mappings.
    ///
    /// Idempotent: each index is checked first and created only if absent;
    /// an existing index is never deleted or migrated. Called once at
    /// startup.
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> Result<(), PipelineError> {
        let indices = [
            (FILES_INDEX, files_index_settings()),
            (PRODUCTS_INDEX, products_index_settings()),
        ];

        for (index, settings) in indices {
            if self.client.index_exists(index).await? {
                debug!(index = %index, "Search index already exists");
                continue;
            }
            self.client.create_index(index, &settings).await?;
        }

        Ok(())
    }

    /// Upsert a batch of resolved documents.
    ///
    /// Never fails the batch: per-document failures are logged and counted.
    #[instrument(skip(self, requests), fields(request_count = requests.len()))]
    pub async fn load(&self, requests: Vec<IndexRequest>) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for request in requests {
            let index = request.index_name();
            let document = match request.to_document() {
                Ok(document) => document,
                Err(e) => {
                    error!(
                        index = %index,
                        doc_id = %request.document_id(),
                        error = %e,
                        "Failed to serialize document; dropping"
                    );
                    summary.failed += 1;
                    continue;
                }
            };

            match self
                .upsert_with_retry(index, request.document_id(), &document)
                .await
            {
                Ok(()) => summary.indexed += 1,
                Err(e) => {
                    error!(
                        index = %index,
                        doc_id = %request.document_id(),
                        error = %e,
                        "Failed to index document after retries; dropping"
                    );
                    summary.failed += 1;
                }
            }
        }

        if summary.failed > 0 {
            warn!(
                indexed = summary.indexed,
                failed = summary.failed,
                "Batch loaded with failures"
            );
        } else {
            debug!(indexed = summary.indexed, "Batch loaded");
        }

        summary
    }

    /// Upsert a single document with exponential backoff retry logic.
    async fn upsert_with_retry(
        &self,
        index: &str,
        id: &str,
        document: &serde_json::Value,
    ) -> Result<(), SearchError> {
        let mut delay_ms = self.config.initial_retry_delay_ms;
        let mut last_error: Option<SearchError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.client.upsert_document(index, id, document).await {
                Ok(()) => {
                    if attempt > 0 {
                        info!(
                            attempt = attempt,
                            index = %index,
                            doc_id = %id,
                            "Upsert succeeded after retry"
                        );
                    }
                    return Ok(());
                }
                Err(e) => {
                    let is_retryable = Self::is_retryable_error(&e);

                    if !is_retryable {
                        debug!(error = %e, "Non-retryable error encountered");
                        return Err(e);
                    }

                    // Don't wait after the last attempt
                    if attempt < self.config.max_retries {
                        warn!(
                            attempt = attempt + 1,
                            max_retries = self.config.max_retries,
                            delay_ms = delay_ms,
                            index = %index,
                            doc_id = %id,
                            error = %e,
                            "Upsert failed, retrying"
                        );

                        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

                        delay_ms = std::cmp::min(delay_ms * 2, self.config.max_retry_delay_ms);
                    }

                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SearchError::index("Unknown error after retries".to_string())))
    }

    /// Determine if an error is retryable (transient failures).
    fn is_retryable_error(error: &SearchError) -> bool {
        match error {
            SearchError::ConnectionError(_) => true,
            SearchError::IndexError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("rate limit")
                    || msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("503")
                    || msg_lower.contains("429")
            }
            SearchError::IndexCreationError(_)
            | SearchError::ExistsCheckError(_)
            | SearchError::SerializationError(_) => false,
        }
    }
}
