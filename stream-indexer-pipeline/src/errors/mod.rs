//! Error types for the stream indexer pipeline.
//!
//! Failures fall into three tiers: fatal (stream topology cannot be resolved
//! at startup), recoverable-retry (transient or expired-cursor read failures
//! handled by the poll loop), and recoverable-skip (per-record processing or
//! per-document write failures that are logged and dropped).

use stream_indexer_repository::{ObjectStoreError, SearchError};
use thiserror::Error;

/// Errors that can occur while reading from the shard stream.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The stream or its shard topology could not be described.
    ///
    /// Fatal when it happens at startup; the process cannot begin polling
    /// without a shard.
    #[error("Stream description error: {0}")]
    DescribeError(String),

    /// A shard iterator could not be obtained.
    #[error("Shard iterator error: {0}")]
    IteratorError(String),

    /// The stored cursor was rejected as expired or invalid.
    ///
    /// Distinguished from [`StreamError::ReadError`] so the poll loop can
    /// re-initialize instead of retrying a dead cursor.
    #[error("Cursor expired: {0}")]
    CursorExpired(String),

    /// A transient batch read failure (network, throttling, temporary
    /// unavailability). The same cursor remains valid and is retried.
    #[error("Read error: {0}")]
    ReadError(String),
}

impl StreamError {
    /// Create a stream description error.
    pub fn describe(msg: impl Into<String>) -> Self {
        Self::DescribeError(msg.into())
    }

    /// Create a shard iterator error.
    pub fn iterator(msg: impl Into<String>) -> Self {
        Self::IteratorError(msg.into())
    }

    /// Create an expired-cursor error.
    pub fn expired(msg: impl Into<String>) -> Self {
        Self::CursorExpired(msg.into())
    }

    /// Create a transient read error.
    pub fn read(msg: impl Into<String>) -> Self {
        Self::ReadError(msg.into())
    }

    /// Whether this error means the cursor itself is dead and must be
    /// re-initialized rather than retried.
    pub fn is_cursor_expired(&self) -> bool {
        matches!(self, Self::CursorExpired(_))
    }
}

/// Errors that can occur while processing a single record.
///
/// These never escalate past the record pipeline boundary; the offending
/// record is logged and skipped.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The record bytes could not be decoded as (possibly double-encoded)
    /// JSON.
    #[error("Payload decode error: {0}")]
    DecodeError(String),

    /// The decoded JSON does not match any payload shape the current mode
    /// accepts.
    #[error("Unexpected payload: {0}")]
    UnexpectedPayload(String),

    /// The referenced object could not be fetched.
    #[error("Object fetch error: {0}")]
    FetchError(#[from] ObjectStoreError),
}

impl ProcessError {
    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// Create an unexpected-payload error.
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::UnexpectedPayload(msg.into())
    }

    /// The pipeline stage this error occurred in, for log correlation.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::DecodeError(_) => "decode",
            Self::UnexpectedPayload(_) => "classify",
            Self::FetchError(_) => "fetch",
        }
    }
}

/// Errors that can occur in the pipeline as a whole.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Error reading from the shard stream.
    #[error("Stream error: {0}")]
    StreamError(#[from] StreamError),

    /// Error from the search store.
    #[error("Search error: {0}")]
    SearchError(#[from] SearchError),

    /// Invalid pipeline configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PipelineError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
