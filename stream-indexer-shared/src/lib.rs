//! # Stream Indexer Shared
//!
//! Shared types and data structures for the stream indexer system.
//!
//! This crate defines the document shapes written to the search index and
//! the object-reference payload carried by upload events on the stream.

pub mod documents;

pub use documents::{FileDocument, ObjectReference, ProductDocument};
