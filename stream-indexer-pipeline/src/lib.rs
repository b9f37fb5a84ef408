//! # Stream Indexer Pipeline
//!
//! This crate provides the pipeline components for consuming upload events
//! from a shard-partitioned stream and indexing them into OpenSearch.
//!
//! ## Architecture
//!
//! The pipeline follows the Consumer-Processor-Loader pattern:
//!
//! 1. **Consumer**: Reads record batches from the stream via rotating shard
//!    cursors
//! 2. **Processor**: Decodes payloads and resolves them into index documents
//! 3. **Loader**: Upserts documents into OpenSearch
//! 4. **Poll Loop**: Drives the read-dispatch-advance cycle forever

pub mod consumer;
pub mod errors;
pub mod loader;
pub mod poller;
pub mod processor;

pub use errors::{PipelineError, ProcessError, StreamError};
