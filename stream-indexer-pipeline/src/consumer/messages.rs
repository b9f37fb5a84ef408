//! Record and cursor types for the shard stream.
//!
//! Defines the structures handed back by one batch read.

use chrono::{DateTime, Utc};

/// One ordered, append-only partition of the source stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// Shard identifier as reported by the stream storage.
    pub shard_id: String,
}

impl Shard {
    /// Create a shard handle for the given identifier.
    pub fn new(shard_id: impl Into<String>) -> Self {
        Self {
            shard_id: shard_id.into(),
        }
    }
}

/// Where on the shard a fresh cursor starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorType {
    /// Only records arriving after cursor initialization.
    Latest,
    /// All retained records, from the oldest available.
    TrimHorizon,
}

impl IteratorType {
    /// Wire name of the iterator type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Latest => "LATEST",
            Self::TrimHorizon => "TRIM_HORIZON",
        }
    }
}

impl std::str::FromStr for IteratorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LATEST" => Ok(Self::Latest),
            "TRIM_HORIZON" => Ok(Self::TrimHorizon),
            other => Err(format!("unknown iterator type: {}", other)),
        }
    }
}

/// Opaque position token for resuming reads on a shard.
///
/// Always replaced by the token returned from the most recent successful
/// batch read; never advanced on a failed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(String);

impl Cursor {
    /// Wrap a position token handed back by the stream storage.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw position token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A single record as handed back by one batch read. Immutable once received.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// The record's byte payload.
    pub data: Vec<u8>,
    /// Monotonic sequence number within the shard.
    pub sequence_number: String,
    /// Approximate arrival timestamp, when the storage reports one.
    pub arrival_timestamp: Option<DateTime<Utc>>,
}

/// One set of records returned by a single batch read.
#[derive(Debug, Clone)]
pub struct RecordBatch {
    /// Records in the order the stream storage returned them.
    pub records: Vec<RawRecord>,
    /// Cursor for the next read. `None` means the shard has been permanently
    /// closed.
    pub next_cursor: Option<Cursor>,
}
