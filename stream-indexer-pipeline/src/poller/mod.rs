//! Poll loop for the stream indexer pipeline.
//!
//! Drives the read-dispatch-advance cycle against one shard, forever: ask
//! the cursor manager for the current position, read up to one batch,
//! dispatch the whole batch through the processor and loader, and only then
//! adopt the next cursor. A batch fully completes before the next read is
//! issued, which caps in-flight work to one batch's worth.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{CursorManager, CursorState, IteratorType, ShardStream};
use crate::errors::PipelineError;
use crate::loader::SearchLoader;
use crate::processor::RecordProcessor;

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep between iterations, bounding request rate against the stream
    /// regardless of batch size.
    pub poll_idle: Duration,
    /// Cooldown after a transient read failure. Must exceed `poll_idle`.
    pub read_backoff: Duration,
    /// Where a fresh cursor starts reading.
    pub iterator_type: IteratorType,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_idle: Duration::from_millis(1000),
            read_backoff: Duration::from_millis(5000),
            iterator_type: IteratorType::Latest,
        }
    }
}

impl PollConfig {
    /// Validate the interval relationship.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.read_backoff <= self.poll_idle {
            return Err(PipelineError::config(format!(
                "read_backoff ({:?}) must exceed poll_idle ({:?})",
                self.read_backoff, self.poll_idle
            )));
        }
        Ok(())
    }
}

/// Outcome of a single poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A batch was read and fully dispatched; the next cursor was adopted.
    Dispatched {
        /// Records in the batch.
        records: usize,
        /// Documents successfully upserted.
        indexed: usize,
        /// Documents dropped after retries.
        failed: usize,
    },
    /// The shard reported no next cursor and is permanently closed.
    ShardClosed,
    /// A transient failure occurred; the cursor was kept and the caller
    /// should wait the backoff interval before retrying.
    Backoff,
    /// The cursor was rejected as expired; it was invalidated and the next
    /// iteration re-initializes.
    CursorExpired,
}

/// The poll loop for one shard.
///
/// The loop exclusively owns the shard's cursor: it is mutated only between
/// iterations, never concurrently.
pub struct PollLoop {
    stream: Arc<dyn ShardStream>,
    processor: RecordProcessor,
    loader: SearchLoader,
    config: PollConfig,
    cursor: Option<CursorManager>,
}

impl PollLoop {
    /// Create a new poll loop.
    ///
    /// # Returns
    ///
    /// * `Ok(PollLoop)` - A loop ready to be initialized and run
    /// * `Err(PipelineError)` - If the configured intervals are inconsistent
    pub fn new(
        stream: Arc<dyn ShardStream>,
        processor: RecordProcessor,
        loader: SearchLoader,
        config: PollConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            stream,
            processor,
            loader,
            config,
            cursor: None,
        })
    }

    /// Resolve the stream topology and obtain the starting cursor.
    ///
    /// Shards are discovered once; the first shard is polled. Failure here
    /// is the only fatal condition in the pipeline: without a shard and a
    /// cursor the process cannot start.
    pub async fn initialize(&mut self) -> Result<(), PipelineError> {
        let shards = self.stream.list_shards().await?;
        let shard = shards
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::config("stream has no shards"))?;

        info!(shard_id = %shard.shard_id, "Polling shard");

        let mut manager = CursorManager::new(shard, self.config.iterator_type);
        manager.initialize(self.stream.as_ref()).await?;
        self.cursor = Some(manager);

        Ok(())
    }

    /// Run the poll loop until shutdown or shard exhaustion.
    ///
    /// Ensures the search indices exist (failures there are logged, not
    /// fatal), initializes the cursor, then loops. The shutdown signal is
    /// checked at every iteration boundary, including during sleeps.
    #[instrument(skip(self, shutdown))]
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<(), PipelineError> {
        info!("Starting poll loop");

        if let Err(e) = self.loader.ensure_indexes().await {
            error!(error = %e, "Failed to ensure search indexes; continuing");
        }

        self.initialize().await?;

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Poll loop received shutdown signal");
                    break;
                }
                outcome = self.poll_once() => {
                    let delay = match outcome {
                        PollOutcome::ShardClosed => {
                            info!("Shard exhausted; stopping poll loop");
                            break;
                        }
                        PollOutcome::Dispatched { records, indexed, failed } => {
                            if records > 0 {
                                debug!(records, indexed, failed, "Batch dispatched");
                            }
                            self.config.poll_idle
                        }
                        PollOutcome::Backoff | PollOutcome::CursorExpired => {
                            self.config.read_backoff
                        }
                    };

                    tokio::select! {
                        _ = shutdown.recv() => {
                            info!("Poll loop received shutdown signal");
                            break;
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!("Poll loop stopped");
        Ok(())
    }

    /// Perform a single poll iteration.
    ///
    /// Public so tests can drive a bounded number of iterations
    /// deterministically; [`PollLoop::run`] adds the sleeps and shutdown
    /// handling around it. Requires [`PollLoop::initialize`] to have
    /// succeeded once.
    pub async fn poll_once(&mut self) -> PollOutcome {
        let stream = Arc::clone(&self.stream);

        let cursor = {
            let manager = match self.cursor.as_mut() {
                Some(manager) => manager,
                None => {
                    warn!("Poll loop has no cursor manager; was initialize() called?");
                    return PollOutcome::Backoff;
                }
            };

            // Re-obtain the cursor if the previous one was invalidated.
            if manager.current().is_none() {
                if let Err(e) = manager.initialize(stream.as_ref()).await {
                    warn!(error = %e, "Failed to re-obtain shard cursor; backing off");
                    return PollOutcome::Backoff;
                }
            }

            match manager.current() {
                Some(cursor) => cursor.clone(),
                None => return PollOutcome::Backoff,
            }
        };

        match stream.read_batch(&cursor).await {
            Ok(batch) => {
                let record_count = batch.records.len();
                let next_cursor = batch.next_cursor;

                let summary = if record_count > 0 {
                    let requests = self.processor.process_batch(batch.records).await;
                    self.loader.load(requests).await
                } else {
                    Default::default()
                };

                // The batch is fully complete; only now adopt the next cursor.
                let state = match self.cursor.as_mut() {
                    Some(manager) => manager.advance(next_cursor),
                    None => CursorState::Exhausted,
                };

                match state {
                    CursorState::Active => PollOutcome::Dispatched {
                        records: record_count,
                        indexed: summary.indexed,
                        failed: summary.failed,
                    },
                    CursorState::Exhausted => PollOutcome::ShardClosed,
                }
            }
            Err(e) if e.is_cursor_expired() => {
                warn!(error = %e, "Shard cursor expired; re-initializing");
                if let Some(manager) = self.cursor.as_mut() {
                    manager.invalidate();
                }
                PollOutcome::CursorExpired
            }
            Err(e) => {
                warn!(error = %e, "Transient batch read failure; retrying with same cursor");
                PollOutcome::Backoff
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use stream_indexer_repository::{
        ObjectStore, ObjectStoreError, SearchError, SearchStore,
    };

    use crate::consumer::{Cursor, RawRecord, RecordBatch, Shard};
    use crate::errors::StreamError;
    use crate::processor::PipelineMode;

    /// Scripted shard stream: pops one response per read and records the
    /// cursor each read used.
    struct ScriptedStream {
        responses: Mutex<VecDeque<Result<RecordBatch, StreamError>>>,
        read_cursors: Mutex<Vec<String>>,
        iterator_calls: AtomicUsize,
    }

    impl ScriptedStream {
        fn new(responses: Vec<Result<RecordBatch, StreamError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                read_cursors: Mutex::new(Vec::new()),
                iterator_calls: AtomicUsize::new(0),
            }
        }

        fn read_cursors(&self) -> Vec<String> {
            self.read_cursors.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ShardStream for ScriptedStream {
        async fn list_shards(&self) -> Result<Vec<Shard>, StreamError> {
            Ok(vec![Shard::new("shardId-000000000000")])
        }

        async fn shard_iterator(
            &self,
            _shard: &Shard,
            _iterator_type: IteratorType,
        ) -> Result<Cursor, StreamError> {
            let n = self.iterator_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Cursor::new(format!("iterator-{}", n)))
        }

        async fn read_batch(&self, cursor: &Cursor) -> Result<RecordBatch, StreamError> {
            self.read_cursors
                .lock()
                .unwrap()
                .push(cursor.as_str().to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| {
                    Ok(RecordBatch {
                        records: vec![],
                        next_cursor: Some(Cursor::new("tail")),
                    })
                })
        }
    }

    /// Search store recording upserts.
    struct RecordingSearchStore {
        upserts: Mutex<Vec<(String, String, Value)>>,
    }

    impl RecordingSearchStore {
        fn new() -> Self {
            Self {
                upserts: Mutex::new(Vec::new()),
            }
        }

        fn upserts(&self) -> Vec<(String, String, Value)> {
            self.upserts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchStore for RecordingSearchStore {
        async fn index_exists(&self, _index: &str) -> Result<bool, SearchError> {
            Ok(true)
        }

        async fn create_index(&self, _index: &str, _mapping: &Value) -> Result<(), SearchError> {
            Ok(())
        }

        async fn upsert_document(
            &self,
            index: &str,
            id: &str,
            document: &Value,
        ) -> Result<(), SearchError> {
            self.upserts
                .lock()
                .unwrap()
                .push((index.to_string(), id.to_string(), document.clone()));
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, SearchError> {
            Ok(true)
        }
    }

    /// Object store serving a single canned object.
    struct SingleObjectStore {
        key: String,
        content: String,
    }

    #[async_trait]
    impl ObjectStore for SingleObjectStore {
        async fn fetch_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
            if key == self.key {
                Ok(self.content.clone())
            } else {
                Err(ObjectStoreError::not_found(format!("s3://{}/{}", bucket, key)))
            }
        }
    }

    fn record(data: &str, sequence_number: &str) -> RawRecord {
        RawRecord {
            data: data.as_bytes().to_vec(),
            sequence_number: sequence_number.to_string(),
            arrival_timestamp: None,
        }
    }

    fn batch(records: Vec<RawRecord>, next: &str) -> RecordBatch {
        RecordBatch {
            records,
            next_cursor: Some(Cursor::new(next)),
        }
    }

    fn test_config() -> PollConfig {
        PollConfig {
            poll_idle: Duration::from_millis(1),
            read_backoff: Duration::from_millis(2),
            iterator_type: IteratorType::Latest,
        }
    }

    fn poll_loop(
        stream: Arc<ScriptedStream>,
        search: Arc<RecordingSearchStore>,
        object_store: Arc<dyn ObjectStore>,
        mode: PipelineMode,
    ) -> PollLoop {
        let processor = RecordProcessor::new(object_store, mode);
        let loader = SearchLoader::new(search);
        PollLoop::new(stream, processor, loader, test_config()).unwrap()
    }

    fn no_objects() -> Arc<dyn ObjectStore> {
        Arc::new(SingleObjectStore {
            key: String::new(),
            content: String::new(),
        })
    }

    #[test]
    fn test_config_rejects_backoff_not_exceeding_idle() {
        let config = PollConfig {
            poll_idle: Duration::from_millis(1000),
            read_backoff: Duration::from_millis(1000),
            iterator_type: IteratorType::Latest,
        };
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_transient_failure_keeps_cursor() {
        let stream = Arc::new(ScriptedStream::new(vec![
            Err(StreamError::read("timed out")),
            Ok(batch(vec![], "iterator-next")),
        ]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search,
            no_objects(),
            PipelineMode::DirectProduct,
        );

        poll.initialize().await.unwrap();

        assert_eq!(poll.poll_once().await, PollOutcome::Backoff);
        assert!(matches!(
            poll.poll_once().await,
            PollOutcome::Dispatched { records: 0, .. }
        ));

        // Both reads used the cursor that was current before the failure.
        assert_eq!(
            stream.read_cursors(),
            vec!["iterator-0".to_string(), "iterator-0".to_string()]
        );
    }

    #[tokio::test]
    async fn test_expired_cursor_triggers_reinitialization() {
        let stream = Arc::new(ScriptedStream::new(vec![
            Err(StreamError::expired("iterator expired")),
            Ok(batch(vec![], "iterator-next")),
        ]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search,
            no_objects(),
            PipelineMode::DirectProduct,
        );

        poll.initialize().await.unwrap();

        assert_eq!(poll.poll_once().await, PollOutcome::CursorExpired);
        assert!(matches!(
            poll.poll_once().await,
            PollOutcome::Dispatched { .. }
        ));

        // The failed read used the original cursor; the next read used a
        // freshly initialized one.
        assert_eq!(
            stream.read_cursors(),
            vec!["iterator-0".to_string(), "iterator-1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_shard_closure_stops_polling() {
        let stream = Arc::new(ScriptedStream::new(vec![Ok(RecordBatch {
            records: vec![],
            next_cursor: None,
        })]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search,
            no_objects(),
            PipelineMode::DirectProduct,
        );

        poll.initialize().await.unwrap();
        assert_eq!(poll.poll_once().await, PollOutcome::ShardClosed);
    }

    #[tokio::test]
    async fn test_malformed_record_does_not_abort_batch() {
        let records = vec![
            record(r#"{"id":"p1","name":"A","price":1.0}"#, "seq-1"),
            record("garbage", "seq-2"),
            record(r#"{"id":"p3","name":"C","price":3.0}"#, "seq-3"),
        ];
        let stream = Arc::new(ScriptedStream::new(vec![Ok(batch(records, "next"))]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search.clone(),
            no_objects(),
            PipelineMode::DirectProduct,
        );

        poll.initialize().await.unwrap();
        let outcome = poll.poll_once().await;

        assert_eq!(
            outcome,
            PollOutcome::Dispatched {
                records: 3,
                indexed: 2,
                failed: 0
            }
        );

        let mut ids: Vec<String> = search.upserts().iter().map(|(_, id, _)| id.clone()).collect();
        ids.sort();
        assert_eq!(ids, vec!["p1".to_string(), "p3".to_string()]);
    }

    #[tokio::test]
    async fn test_file_pipeline_end_to_end() {
        let reference = r#"{
            "bucket": "b",
            "key": "k.json",
            "contentType": "application/json",
            "size": 42,
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;
        let widget = r#"{"id":"p1","name":"Widget","description":"A widget","price":9.99}"#;

        let stream = Arc::new(ScriptedStream::new(vec![Ok(batch(
            vec![record(reference, "seq-1")],
            "next",
        ))]));
        let search = Arc::new(RecordingSearchStore::new());
        let object_store = Arc::new(SingleObjectStore {
            key: "k.json".to_string(),
            content: widget.to_string(),
        });
        let mut poll = poll_loop(
            stream.clone(),
            search.clone(),
            object_store,
            PipelineMode::FilePipeline,
        );

        poll.initialize().await.unwrap();
        let outcome = poll.poll_once().await;

        assert_eq!(
            outcome,
            PollOutcome::Dispatched {
                records: 1,
                indexed: 2,
                failed: 0
            }
        );

        let upserts = search.upserts();
        assert_eq!(upserts.len(), 2);

        let (file_index, file_id, file_doc) = &upserts[0];
        assert_eq!(file_index, "files");
        assert_eq!(file_id, "k.json");
        assert_eq!(file_doc["fileName"], "k.json");
        assert_eq!(file_doc["content"], widget);
        assert_eq!(file_doc["s3Location"], "s3://b/k.json");
        assert_eq!(file_doc["size"], 42);

        let (product_index, product_id, product_doc) = &upserts[1];
        assert_eq!(product_index, "products");
        assert_eq!(product_id, "p1");
        assert_eq!(product_doc["name"], "Widget");
        assert_eq!(product_doc["description"], "A widget");
        assert_eq!(product_doc["price"], 9.99);
    }

    #[tokio::test]
    async fn test_direct_product_end_to_end() {
        let stream = Arc::new(ScriptedStream::new(vec![Ok(batch(
            vec![record(r#"{"id":"p2","name":"Gadget","price":5}"#, "seq-1")],
            "next",
        ))]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search.clone(),
            no_objects(),
            PipelineMode::DirectProduct,
        );

        poll.initialize().await.unwrap();
        let outcome = poll.poll_once().await;

        assert_eq!(
            outcome,
            PollOutcome::Dispatched {
                records: 1,
                indexed: 1,
                failed: 0
            }
        );

        let upserts = search.upserts();
        assert_eq!(upserts.len(), 1);

        let (index, id, doc) = &upserts[0];
        assert_eq!(index, "products");
        assert_eq!(id, "p2");
        assert_eq!(doc["name"], "Gadget");
        assert_eq!(doc["price"], 5.0);
        assert!(doc.get("description").is_none());
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let stream = Arc::new(ScriptedStream::new(vec![]));
        let search = Arc::new(RecordingSearchStore::new());
        let mut poll = poll_loop(
            stream.clone(),
            search,
            no_objects(),
            PipelineMode::DirectProduct,
        );

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        poll.run(shutdown_rx).await.unwrap();
    }
}
