//! OpenSearch implementation of the search store.
//!
//! This module provides a concrete implementation of `SearchStore`
//! using OpenSearch as the backend.

mod client;
mod index_config;

pub use client::OpenSearchClient;
pub use index_config::{files_index_settings, products_index_settings, FILES_INDEX, PRODUCTS_INDEX};
