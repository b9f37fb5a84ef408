//! Shard stream trait definition.
//!
//! This module defines the abstract interface for the shard-partitioned log
//! storage, allowing the Kinesis implementation to be swapped for mocks in
//! tests.

use async_trait::async_trait;

use crate::consumer::messages::{Cursor, IteratorType, RecordBatch, Shard};
use crate::errors::StreamError;

/// Abstract interface for reading a shard-partitioned, append-only stream.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the handle is long-lived and shared.
#[async_trait]
pub trait ShardStream: Send + Sync {
    /// List the stream's shards.
    ///
    /// Called once at startup; shards are never re-discovered within a run.
    async fn list_shards(&self) -> Result<Vec<Shard>, StreamError>;

    /// Obtain a starting cursor for the given shard.
    async fn shard_iterator(
        &self,
        shard: &Shard,
        iterator_type: IteratorType,
    ) -> Result<Cursor, StreamError>;

    /// Read up to one batch of records from the given cursor.
    ///
    /// An expired or invalid cursor surfaces as
    /// [`StreamError::CursorExpired`], not as a generic read error.
    async fn read_batch(&self, cursor: &Cursor) -> Result<RecordBatch, StreamError>;
}
