//! Error types for the stream indexer repository.

mod object_store_error;
mod search_error;

pub use object_store_error::ObjectStoreError;
pub use search_error::SearchError;
