//! Search error types.
//!
//! This module defines the error types that can occur during search store
//! operations.

use thiserror::Error;

/// Errors that can occur during search store operations.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Failed to establish connection to the search engine.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Failed to upsert a document.
    #[error("Index error: {0}")]
    IndexError(String),

    /// Failed to create a search index.
    #[error("Index creation error: {0}")]
    IndexCreationError(String),

    /// Failed to check whether a search index exists.
    #[error("Index existence check error: {0}")]
    ExistsCheckError(String),

    /// Failed to serialize data for the search engine.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl SearchError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create an index (upsert) error.
    pub fn index(msg: impl Into<String>) -> Self {
        Self::IndexError(msg.into())
    }

    /// Create an index creation error.
    pub fn index_creation(msg: impl Into<String>) -> Self {
        Self::IndexCreationError(msg.into())
    }

    /// Create an existence check error.
    pub fn exists_check(msg: impl Into<String>) -> Self {
        Self::ExistsCheckError(msg.into())
    }
}
