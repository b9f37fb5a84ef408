//! Object store error types.

use thiserror::Error;

/// Errors that can occur while fetching objects from the object store.
#[derive(Error, Debug)]
pub enum ObjectStoreError {
    /// The referenced object does not exist.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// The fetch request itself failed.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Reading the object body stream failed partway through.
    #[error("Body read error: {0}")]
    BodyError(String),

    /// The object body is not valid UTF-8 text.
    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ObjectStoreError {
    /// Create a not-found error for the given location.
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound(location.into())
    }

    /// Create a fetch error.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::FetchError(msg.into())
    }

    /// Create a body read error.
    pub fn body(msg: impl Into<String>) -> Self {
        Self::BodyError(msg.into())
    }
}
