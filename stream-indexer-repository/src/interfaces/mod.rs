//! Interface definitions for the indexer's storage collaborators.
//!
//! This module defines the abstract `SearchStore` and `ObjectStore` traits
//! that allow for dependency injection and swappable backend implementations.

mod object_store;
mod search_store;

pub use object_store::ObjectStore;
pub use search_store::SearchStore;
