//! OpenSearch index configuration and mappings.
//!
//! This module defines the mappings for the two indices the pipeline writes
//! to. Field typing is fixed per index: full-text fields for searchable
//! content, keyword fields for identifiers and exact-match filters, numeric
//! fields for sizes and prices, and date fields for timestamps. The mappings
//! are applied once at index creation and never altered afterwards.

use serde_json::{json, Value};

/// The name of the file documents index.
pub const FILES_INDEX: &str = "files";

/// The name of the product documents index.
pub const PRODUCTS_INDEX: &str = "products";

/// Get the mappings for the `files` index.
///
/// File content and names are full-text searchable; the content type and
/// object location are exact-match filters.
pub fn files_index_settings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "fileName": { "type": "text" },
                "content": { "type": "text" },
                "contentType": { "type": "keyword" },
                "size": { "type": "integer" },
                "timestamp": { "type": "date" },
                "s3Location": { "type": "keyword" }
            }
        }
    })
}

/// Get the mappings for the `products` index.
pub fn products_index_settings() -> Value {
    json!({
        "mappings": {
            "properties": {
                "id": { "type": "keyword" },
                "name": { "type": "text" },
                "description": { "type": "text" },
                "price": { "type": "float" }
            }
        }
    })
}
