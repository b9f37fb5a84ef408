//! Environment-driven configuration for the stream indexer.
//!
//! All settings are read once at startup into an explicit struct and passed
//! by reference into the dependency wiring; no component reads the
//! environment or holds ambient client state.

use std::env;

use stream_indexer_pipeline::consumer::IteratorType;
use stream_indexer_pipeline::processor::PipelineMode;

use crate::IndexingError;

/// Default stream name, matching the upload service.
const DEFAULT_STREAM_NAME: &str = "file-upload-stream";

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default AWS region.
const DEFAULT_AWS_REGION: &str = "us-east-1";

/// Default idle interval between polls, in milliseconds.
const DEFAULT_POLL_IDLE_MS: u64 = 1000;

/// Default cooldown after a transient read failure, in milliseconds.
const DEFAULT_READ_BACKOFF_MS: u64 = 5000;

/// Default per-batch record processing concurrency.
const DEFAULT_BATCH_CONCURRENCY: usize = 8;

/// Runtime configuration for the indexer, immutable for the run.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    /// Name of the stream to consume.
    pub stream_name: String,
    /// OpenSearch server URL.
    pub opensearch_url: String,
    /// Optional AWS endpoint override (e.g. a LocalStack URL). When unset,
    /// the SDK's default endpoint resolution applies.
    pub aws_endpoint_url: Option<String>,
    /// AWS region.
    pub aws_region: String,
    /// Where a fresh shard cursor starts reading.
    pub iterator_type: IteratorType,
    /// Which payload shape the pipeline expects.
    pub pipeline_mode: PipelineMode,
    /// Idle interval between polls, in milliseconds.
    pub poll_idle_ms: u64,
    /// Cooldown after a transient read failure, in milliseconds. Must
    /// exceed the idle interval.
    pub read_backoff_ms: u64,
    /// Per-batch record processing concurrency.
    pub batch_concurrency: usize,
}

impl IndexerConfig {
    /// Read configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KINESIS_STREAM_NAME`: stream to consume (default: file-upload-stream)
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `AWS_ENDPOINT_URL`: AWS endpoint override, e.g. LocalStack (default: unset)
    /// - `AWS_REGION`: AWS region (default: us-east-1)
    /// - `SHARD_ITERATOR_TYPE`: LATEST or TRIM_HORIZON (default: LATEST)
    /// - `PIPELINE_MODE`: file-pipeline or direct-product (default: file-pipeline)
    /// - `POLL_IDLE_MS`: idle interval in milliseconds (default: 1000)
    /// - `READ_BACKOFF_MS`: transient-failure cooldown in milliseconds (default: 5000)
    /// - `BATCH_CONCURRENCY`: per-batch processing concurrency (default: 8)
    pub fn from_env() -> Result<Self, IndexingError> {
        let stream_name =
            env::var("KINESIS_STREAM_NAME").unwrap_or_else(|_| DEFAULT_STREAM_NAME.to_string());
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let aws_endpoint_url = env::var("AWS_ENDPOINT_URL").ok();
        let aws_region =
            env::var("AWS_REGION").unwrap_or_else(|_| DEFAULT_AWS_REGION.to_string());

        let iterator_type = match env::var("SHARD_ITERATOR_TYPE") {
            Ok(value) => value
                .parse::<IteratorType>()
                .map_err(IndexingError::config)?,
            Err(_) => IteratorType::Latest,
        };

        let pipeline_mode = match env::var("PIPELINE_MODE") {
            Ok(value) => value
                .parse::<PipelineMode>()
                .map_err(IndexingError::config)?,
            Err(_) => PipelineMode::FilePipeline,
        };

        let poll_idle_ms = parse_env_u64("POLL_IDLE_MS", DEFAULT_POLL_IDLE_MS)?;
        let read_backoff_ms = parse_env_u64("READ_BACKOFF_MS", DEFAULT_READ_BACKOFF_MS)?;
        let batch_concurrency =
            parse_env_u64("BATCH_CONCURRENCY", DEFAULT_BATCH_CONCURRENCY as u64)? as usize;

        Ok(Self {
            stream_name,
            opensearch_url,
            aws_endpoint_url,
            aws_region,
            iterator_type,
            pipeline_mode,
            poll_idle_ms,
            read_backoff_ms,
            batch_concurrency,
        })
    }
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, IndexingError> {
    match env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| IndexingError::config(format!("invalid {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}
