//! # Stream Indexer Repository
//!
//! This crate provides traits and implementations for the indexer's storage
//! collaborators. It includes definitions for errors, interfaces, a concrete
//! OpenSearch implementation of the search store, and an S3 implementation
//! of the object store.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod s3;

pub use errors::{ObjectStoreError, SearchError};
pub use interfaces::{ObjectStore, SearchStore};
pub use opensearch::OpenSearchClient;
pub use s3::S3ObjectStore;
