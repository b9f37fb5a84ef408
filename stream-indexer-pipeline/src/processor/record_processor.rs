//! Record processor implementation.
//!
//! Resolves each raw record into zero or more index documents. Every
//! per-record failure is caught here, logged with the record's sequence
//! number and the stage that failed, and treated as a skip; nothing
//! escalates to the poll loop.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use stream_indexer_repository::ObjectStore;
use stream_indexer_shared::{FileDocument, ProductDocument};

use crate::consumer::RawRecord;
use crate::errors::ProcessError;
use crate::processor::payload::RecordPayload;

/// Default number of records processed concurrently within one batch.
const DEFAULT_CONCURRENCY: usize = 8;

/// Which payload shape the pipeline expects and what it derives from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    /// Records carry object-store references; each yields a file document
    /// and, when the fetched content parses as a product, a product document.
    FilePipeline,
    /// Records carry inline product documents; each yields exactly one
    /// product document.
    DirectProduct,
}

impl std::str::FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "file" | "file-pipeline" => Ok(Self::FilePipeline),
            "product" | "direct-product" => Ok(Self::DirectProduct),
            other => Err(format!("unknown pipeline mode: {}", other)),
        }
    }
}

/// A resolved document headed for the search index.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexRequest {
    /// Document for the `files` index.
    File(FileDocument),
    /// Document for the `products` index.
    Product(ProductDocument),
}

impl IndexRequest {
    /// The index this document belongs to.
    pub fn index_name(&self) -> &'static str {
        match self {
            Self::File(_) => stream_indexer_repository::opensearch::FILES_INDEX,
            Self::Product(_) => stream_indexer_repository::opensearch::PRODUCTS_INDEX,
        }
    }

    /// The document's natural key, used as the upsert id.
    pub fn document_id(&self) -> &str {
        match self {
            Self::File(doc) => doc.document_id(),
            Self::Product(doc) => doc.document_id(),
        }
    }

    /// Serialize the document body for the search store.
    pub fn to_document(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::File(doc) => serde_json::to_value(doc),
            Self::Product(doc) => serde_json::to_value(doc),
        }
    }
}

/// Processor that resolves raw records into index documents.
pub struct RecordProcessor {
    object_store: Arc<dyn ObjectStore>,
    mode: PipelineMode,
    concurrency: usize,
}

impl RecordProcessor {
    /// Create a new record processor.
    pub fn new(object_store: Arc<dyn ObjectStore>, mode: PipelineMode) -> Self {
        Self {
            object_store,
            mode,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the per-batch processing concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Process one batch of records with bounded fan-out.
    ///
    /// Records are handed to the pipeline in stream order; completion order
    /// under concurrency is unspecified, which is safe because downstream
    /// writes are idempotent upserts. The returned vector only contains
    /// documents from records that resolved successfully; failed records
    /// have already been logged and skipped. The entire batch is complete
    /// when this returns.
    #[instrument(skip(self, records), fields(record_count = records.len()))]
    pub async fn process_batch(&self, records: Vec<RawRecord>) -> Vec<IndexRequest> {
        let resolved: Vec<Vec<IndexRequest>> = futures::stream::iter(records)
            .map(|record| async move {
                match self.process_record(&record).await {
                    Ok(requests) => requests,
                    Err(e) => {
                        warn!(
                            sequence_number = %record.sequence_number,
                            stage = e.stage(),
                            error = %e,
                            "Skipping record"
                        );
                        Vec::new()
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let requests: Vec<IndexRequest> = resolved.into_iter().flatten().collect();
        debug!(request_count = requests.len(), "Processed record batch");
        requests
    }

    /// Process a single record into its index documents.
    ///
    /// In file-pipeline mode the referenced object is fetched and a file
    /// document built from it; the fetched content is then reinterpreted as
    /// a product document when it parses as one. A failed reinterpretation
    /// only drops the secondary document, never the primary.
    pub async fn process_record(
        &self,
        record: &RawRecord,
    ) -> Result<Vec<IndexRequest>, ProcessError> {
        let payload = RecordPayload::decode(&record.data)?;

        match (self.mode, payload) {
            (PipelineMode::FilePipeline, RecordPayload::ObjectRef(reference)) => {
                let content = self
                    .object_store
                    .fetch_object(&reference.bucket, &reference.key)
                    .await?;

                let file_doc = FileDocument::from_reference(&reference, content.clone());
                let mut requests = vec![IndexRequest::File(file_doc)];

                match serde_json::from_str::<ProductDocument>(&content) {
                    Ok(product) => requests.push(IndexRequest::Product(product)),
                    Err(e) => {
                        debug!(
                            sequence_number = %record.sequence_number,
                            key = %reference.key,
                            error = %e,
                            "Fetched content is not a product document; indexing file only"
                        );
                    }
                }

                Ok(requests)
            }
            (PipelineMode::DirectProduct, RecordPayload::Product(product)) => {
                Ok(vec![IndexRequest::Product(product)])
            }
            (PipelineMode::FilePipeline, RecordPayload::Product(_)) => Err(
                ProcessError::unexpected("inline product payload in file-pipeline mode"),
            ),
            (PipelineMode::DirectProduct, RecordPayload::ObjectRef(_)) => Err(
                ProcessError::unexpected("object reference payload in direct-product mode"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use stream_indexer_repository::ObjectStoreError;

    const WIDGET: &str = r#"{"id":"p1","name":"Widget","description":"A widget","price":9.99}"#;

    /// Mock object store serving canned content by key.
    struct MockObjectStore {
        objects: HashMap<String, String>,
        fetches: Mutex<Vec<String>>,
    }

    impl MockObjectStore {
        fn new() -> Self {
            Self {
                objects: HashMap::new(),
                fetches: Mutex::new(Vec::new()),
            }
        }

        fn with_object(mut self, key: &str, content: &str) -> Self {
            self.objects.insert(key.to_string(), content.to_string());
            self
        }
    }

    #[async_trait]
    impl ObjectStore for MockObjectStore {
        async fn fetch_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
            self.fetches.lock().unwrap().push(format!("{}/{}", bucket, key));
            self.objects
                .get(key)
                .cloned()
                .ok_or_else(|| ObjectStoreError::not_found(format!("s3://{}/{}", bucket, key)))
        }
    }

    fn record(data: &str, sequence_number: &str) -> RawRecord {
        RawRecord {
            data: data.as_bytes().to_vec(),
            sequence_number: sequence_number.to_string(),
            arrival_timestamp: None,
        }
    }

    fn reference_payload() -> String {
        r#"{
            "bucket": "b",
            "key": "k.json",
            "contentType": "application/json",
            "size": 42,
            "timestamp": "2024-01-01T00:00:00Z"
        }"#
        .to_string()
    }

    #[tokio::test]
    async fn test_file_pipeline_yields_file_and_product_documents() {
        let store = Arc::new(MockObjectStore::new().with_object("k.json", WIDGET));
        let processor = RecordProcessor::new(store, PipelineMode::FilePipeline);

        let requests = processor
            .process_record(&record(&reference_payload(), "seq-1"))
            .await
            .unwrap();

        assert_eq!(requests.len(), 2);

        match &requests[0] {
            IndexRequest::File(doc) => {
                assert_eq!(doc.file_name, "k.json");
                assert_eq!(doc.content, WIDGET);
                assert_eq!(doc.s3_location, "s3://b/k.json");
            }
            other => panic!("expected file document first, got {:?}", other),
        }

        match &requests[1] {
            IndexRequest::Product(product) => {
                assert_eq!(product.id, "p1");
                assert_eq!(product.name, "Widget");
                assert_eq!(product.description.as_deref(), Some("A widget"));
                assert_eq!(product.price, 9.99);
            }
            other => panic!("expected product document second, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_file_pipeline_non_product_content_yields_file_only() {
        let store = Arc::new(MockObjectStore::new().with_object("k.json", "plain text, not JSON"));
        let processor = RecordProcessor::new(store, PipelineMode::FilePipeline);

        let requests = processor
            .process_record(&record(&reference_payload(), "seq-1"))
            .await
            .unwrap();

        assert_eq!(requests.len(), 1);
        assert!(matches!(requests[0], IndexRequest::File(_)));
    }

    #[tokio::test]
    async fn test_direct_product_yields_one_product() {
        let store = Arc::new(MockObjectStore::new());
        let processor = RecordProcessor::new(store.clone(), PipelineMode::DirectProduct);

        let requests = processor
            .process_record(&record(r#"{"id":"p2","name":"Gadget","price":5}"#, "seq-2"))
            .await
            .unwrap();

        assert_eq!(requests.len(), 1);
        match &requests[0] {
            IndexRequest::Product(product) => {
                assert_eq!(product.id, "p2");
                assert_eq!(product.name, "Gadget");
                assert!(product.description.is_none());
                assert_eq!(product.price, 5.0);
            }
            other => panic!("expected product document, got {:?}", other),
        }

        // No fetch in direct-product mode.
        assert!(store.fetches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_object_is_a_fetch_error() {
        let store = Arc::new(MockObjectStore::new());
        let processor = RecordProcessor::new(store, PipelineMode::FilePipeline);

        let err = processor
            .process_record(&record(&reference_payload(), "seq-3"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "fetch");
    }

    #[tokio::test]
    async fn test_mode_mismatch_is_a_classify_error() {
        let store = Arc::new(MockObjectStore::new());
        let processor = RecordProcessor::new(store, PipelineMode::DirectProduct);

        let err = processor
            .process_record(&record(&reference_payload(), "seq-4"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "classify");
    }

    #[tokio::test]
    async fn test_batch_skips_malformed_records() {
        let store = Arc::new(MockObjectStore::new());
        let processor = RecordProcessor::new(store, PipelineMode::DirectProduct);

        let records = vec![
            record(r#"{"id":"p1","name":"A","price":1.0}"#, "seq-1"),
            record("not json", "seq-2"),
            record(r#"{"id":"p3","name":"C","price":3.0}"#, "seq-3"),
        ];

        let requests = processor.process_batch(records).await;

        assert_eq!(requests.len(), 2);
        let mut ids: Vec<&str> = requests.iter().map(|r| r.document_id()).collect();
        ids.sort();
        assert_eq!(ids, vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_index_request_routing() {
        let product = ProductDocument {
            id: "p1".to_string(),
            name: "Widget".to_string(),
            description: None,
            price: 9.99,
        };
        let request = IndexRequest::Product(product);

        assert_eq!(request.index_name(), "products");
        assert_eq!(request.document_id(), "p1");

        let body = request.to_document().unwrap();
        assert_eq!(body["id"], "p1");
    }

    #[test]
    fn test_pipeline_mode_parse() {
        assert_eq!("file".parse::<PipelineMode>(), Ok(PipelineMode::FilePipeline));
        assert_eq!(
            "direct-product".parse::<PipelineMode>(),
            Ok(PipelineMode::DirectProduct)
        );
        assert!("other".parse::<PipelineMode>().is_err());
    }
}
