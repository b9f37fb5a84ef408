//! Document and payload types shared across the indexer.
//!
//! Field names follow the wire format produced by the upload service, so
//! everything serializes as camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an object in the object store, as carried by an upload event.
///
/// This is the payload shape the upload service puts on the stream: it points
/// at the stored object rather than embedding its content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ObjectReference {
    /// Bucket holding the object.
    pub bucket: String,
    /// Object key within the bucket.
    pub key: String,
    /// MIME type recorded at upload time.
    pub content_type: String,
    /// Object size in bytes.
    pub size: i64,
    /// Upload timestamp.
    pub timestamp: DateTime<Utc>,
}

impl ObjectReference {
    /// Canonical `s3://bucket/key` location string for the referenced object.
    pub fn location(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

/// Document written to the `files` index: upload metadata plus the full
/// fetched content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDocument {
    /// Original file name (the object key).
    pub file_name: String,
    /// Full text content of the fetched object.
    pub content: String,
    /// MIME type recorded at upload time.
    pub content_type: String,
    /// Object size in bytes.
    pub size: i64,
    /// Upload timestamp.
    pub timestamp: DateTime<Utc>,
    /// Canonical `s3://bucket/key` location.
    pub s3_location: String,
}

impl FileDocument {
    /// Build a file document from an object reference and its fetched content.
    pub fn from_reference(reference: &ObjectReference, content: String) -> Self {
        Self {
            file_name: reference.key.clone(),
            content,
            content_type: reference.content_type.clone(),
            size: reference.size,
            timestamp: reference.timestamp,
            s3_location: reference.location(),
        }
    }

    /// Natural key for upserts: the object key.
    ///
    /// Re-delivering the same upload event overwrites the same document
    /// instead of creating a duplicate.
    pub fn document_id(&self) -> &str {
        &self.file_name
    }
}

/// Document written to the `products` index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    /// Product identifier.
    pub id: String,
    /// Product name.
    pub name: String,
    /// Product description, when the producer supplied one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product price.
    pub price: f64,
}

impl ProductDocument {
    /// Natural key for upserts: the product id.
    pub fn document_id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> ObjectReference {
        ObjectReference {
            bucket: "b".to_string(),
            key: "k.json".to_string(),
            content_type: "application/json".to_string(),
            size: 42,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_object_reference_location() {
        assert_eq!(reference().location(), "s3://b/k.json");
    }

    #[test]
    fn test_object_reference_wire_format() {
        let json = r#"{
            "bucket": "b",
            "key": "k.json",
            "contentType": "application/json",
            "size": 42,
            "timestamp": "2024-01-01T00:00:00Z"
        }"#;

        let parsed: ObjectReference = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, reference());
    }

    #[test]
    fn test_file_document_from_reference() {
        let doc = FileDocument::from_reference(&reference(), "hello".to_string());

        assert_eq!(doc.file_name, "k.json");
        assert_eq!(doc.content, "hello");
        assert_eq!(doc.s3_location, "s3://b/k.json");
        assert_eq!(doc.document_id(), "k.json");
    }

    #[test]
    fn test_file_document_serializes_camel_case() {
        let doc = FileDocument::from_reference(&reference(), "hello".to_string());
        let value = serde_json::to_value(&doc).unwrap();

        assert_eq!(value["fileName"], "k.json");
        assert_eq!(value["contentType"], "application/json");
        assert_eq!(value["s3Location"], "s3://b/k.json");
        assert_eq!(value["size"], 42);
    }

    #[test]
    fn test_product_document_omits_missing_description() {
        let product = ProductDocument {
            id: "p2".to_string(),
            name: "Gadget".to_string(),
            description: None,
            price: 5.0,
        };

        let value = serde_json::to_value(&product).unwrap();
        assert!(value.get("description").is_none());
        assert_eq!(product.document_id(), "p2");
    }

    #[test]
    fn test_product_document_integer_price() {
        let product: ProductDocument =
            serde_json::from_str(r#"{"id":"p2","name":"Gadget","price":5}"#).unwrap();
        assert_eq!(product.price, 5.0);
    }
}
