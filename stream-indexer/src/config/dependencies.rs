//! Dependency initialization and wiring for the stream indexer.

use std::sync::Arc;
use std::time::Duration;

use aws_config::{BehaviorVersion, Region};
use tracing::info;

use crate::config::IndexerConfig;
use crate::IndexingError;
use stream_indexer_pipeline::{
    consumer::KinesisShardStream,
    loader::SearchLoader,
    poller::{PollConfig, PollLoop},
    processor::RecordProcessor,
};
use stream_indexer_repository::{OpenSearchClient, S3ObjectStore, SearchStore};

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured poll loop ready to run.
    pub poll_loop: PollLoop,
}

impl Dependencies {
    /// Initialize all dependencies from the given configuration.
    ///
    /// Builds the AWS clients (with optional endpoint override and
    /// path-style S3 addressing for LocalStack), verifies the OpenSearch
    /// cluster is reachable, and wires the pipeline together.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(IndexingError)` - If initialization fails
    pub async fn new(config: &IndexerConfig) -> Result<Self, IndexingError> {
        info!(
            stream_name = %config.stream_name,
            opensearch_url = %config.opensearch_url,
            aws_region = %config.aws_region,
            "Initializing dependencies"
        );

        let mut aws_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.aws_region.clone()));
        if let Some(endpoint) = &config.aws_endpoint_url {
            aws_loader = aws_loader.endpoint_url(endpoint);
        }
        let aws_config = aws_loader.load().await;

        let kinesis_client = aws_sdk_kinesis::Client::new(&aws_config);

        // LocalStack and other S3-compatible endpoints require path-style
        // addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
            .force_path_style(true)
            .build();
        let s3_client = aws_sdk_s3::Client::from_conf(s3_config);

        // Initialize OpenSearch client and verify it is reachable
        let search_client = OpenSearchClient::new(&config.opensearch_url).map_err(|e| {
            IndexingError::config(format!("Failed to create OpenSearch client: {}", e))
        })?;

        let healthy = search_client.health_check().await.map_err(|e| {
            IndexingError::config(format!("OpenSearch health check failed: {}", e))
        })?;

        if !healthy {
            return Err(IndexingError::config("OpenSearch cluster is unhealthy"));
        }

        info!("OpenSearch connection verified");

        let stream = Arc::new(KinesisShardStream::new(
            kinesis_client,
            &config.stream_name,
        ));

        let object_store = Arc::new(S3ObjectStore::new(s3_client));

        let processor = RecordProcessor::new(object_store, config.pipeline_mode)
            .with_concurrency(config.batch_concurrency);

        let loader = SearchLoader::new(Arc::new(search_client));

        let poll_config = PollConfig {
            poll_idle: Duration::from_millis(config.poll_idle_ms),
            read_backoff: Duration::from_millis(config.read_backoff_ms),
            iterator_type: config.iterator_type,
        };

        let poll_loop = PollLoop::new(stream, processor, loader, poll_config)?;

        Ok(Self { poll_loop })
    }
}
