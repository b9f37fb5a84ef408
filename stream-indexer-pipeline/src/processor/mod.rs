//! Processor module for the stream indexer pipeline.
//!
//! Decodes record payloads and resolves them into index documents.

mod payload;
mod record_processor;

pub use payload::RecordPayload;
pub use record_processor::{IndexRequest, PipelineMode, RecordProcessor};
