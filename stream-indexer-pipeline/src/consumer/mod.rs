//! Consumer module for the stream indexer pipeline.
//!
//! Provides the shard stream abstraction, its Kinesis implementation, and
//! the cursor manager that tracks the read position on a shard.

mod cursor;
mod kinesis;
mod messages;
mod shard_stream;

pub use cursor::{CursorManager, CursorState};
pub use kinesis::KinesisShardStream;
pub use messages::{Cursor, IteratorType, RawRecord, RecordBatch, Shard};
pub use shard_stream::ShardStream;
