//! Kinesis implementation of the shard stream.
//!
//! Maps the shard stream operations onto the AWS Kinesis data-plane calls:
//! `describe_stream`, `get_shard_iterator`, and `get_records`. An
//! `ExpiredIteratorException` from `get_records` becomes the distinguished
//! [`StreamError::CursorExpired`]; everything else on the read path is a
//! transient [`StreamError::ReadError`].

use async_trait::async_trait;
use aws_sdk_kinesis::types::ShardIteratorType;
use aws_sdk_kinesis::Client;
use chrono::DateTime;
use tracing::{debug, info};

use crate::consumer::messages::{Cursor, IteratorType, RawRecord, RecordBatch, Shard};
use crate::consumer::shard_stream::ShardStream;
use crate::errors::StreamError;

/// Kinesis-backed shard stream.
pub struct KinesisShardStream {
    client: Client,
    stream_name: String,
}

impl KinesisShardStream {
    /// Create a new shard stream over an already-configured Kinesis client.
    pub fn new(client: Client, stream_name: impl Into<String>) -> Self {
        let stream_name = stream_name.into();
        info!(stream_name = %stream_name, "Created Kinesis shard stream");
        Self {
            client,
            stream_name,
        }
    }
}

#[async_trait]
impl ShardStream for KinesisShardStream {
    async fn list_shards(&self) -> Result<Vec<Shard>, StreamError> {
        let output = self
            .client
            .describe_stream()
            .stream_name(&self.stream_name)
            .send()
            .await
            .map_err(|e| StreamError::describe(e.into_service_error().to_string()))?;

        let description = output
            .stream_description()
            .ok_or_else(|| StreamError::describe("describe_stream returned no description"))?;

        let shards: Vec<Shard> = description
            .shards()
            .iter()
            .map(|shard| Shard::new(shard.shard_id()))
            .collect();

        info!(
            stream_name = %self.stream_name,
            shard_count = shards.len(),
            "Described stream"
        );

        Ok(shards)
    }

    async fn shard_iterator(
        &self,
        shard: &Shard,
        iterator_type: IteratorType,
    ) -> Result<Cursor, StreamError> {
        let kinesis_type = match iterator_type {
            IteratorType::Latest => ShardIteratorType::Latest,
            IteratorType::TrimHorizon => ShardIteratorType::TrimHorizon,
        };

        let output = self
            .client
            .get_shard_iterator()
            .stream_name(&self.stream_name)
            .shard_id(&shard.shard_id)
            .shard_iterator_type(kinesis_type)
            .send()
            .await
            .map_err(|e| StreamError::iterator(e.into_service_error().to_string()))?;

        let token = output
            .shard_iterator()
            .ok_or_else(|| StreamError::iterator("get_shard_iterator returned no iterator"))?;

        debug!(
            shard_id = %shard.shard_id,
            iterator_type = iterator_type.as_str(),
            "Obtained shard iterator"
        );

        Ok(Cursor::new(token))
    }

    async fn read_batch(&self, cursor: &Cursor) -> Result<RecordBatch, StreamError> {
        let output = self
            .client
            .get_records()
            .shard_iterator(cursor.as_str())
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_expired_iterator_exception() {
                    StreamError::expired(service_error.to_string())
                } else {
                    StreamError::read(service_error.to_string())
                }
            })?;

        let records: Vec<RawRecord> = output
            .records()
            .iter()
            .map(|record| RawRecord {
                data: record.data().as_ref().to_vec(),
                sequence_number: record.sequence_number().to_string(),
                arrival_timestamp: record
                    .approximate_arrival_timestamp()
                    .and_then(|t| DateTime::from_timestamp(t.secs(), t.subsec_nanos())),
            })
            .collect();

        let next_cursor = output.next_shard_iterator().map(Cursor::new);

        debug!(record_count = records.len(), "Read record batch");

        Ok(RecordBatch {
            records,
            next_cursor,
        })
    }
}
