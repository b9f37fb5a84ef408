//! Record payload decoding and classification.
//!
//! Producers are not consistent about payload shape: some put the JSON
//! object on the stream directly, some serialize it twice so the record
//! bytes hold a JSON string containing JSON. Decoding therefore runs in two
//! stages: parse (unwrapping at most one extra string layer), then classify
//! into an explicit variant.

use serde::Deserialize;
use serde_json::Value;
use stream_indexer_shared::{ObjectReference, ProductDocument};

use crate::errors::ProcessError;

/// Classified payload of one decoded record.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RecordPayload {
    /// Reference to an object in the object store (file-pipeline mode).
    ObjectRef(ObjectReference),
    /// An inline product document (direct-product mode).
    Product(ProductDocument),
}

impl RecordPayload {
    /// Decode raw record bytes into a classified payload.
    ///
    /// The bytes are interpreted as UTF-8 text and parsed as JSON. If the
    /// parsed value is itself a string, it is parsed once more. The unwrap
    /// depth is a fixed contract of two layers: a payload encoded three or
    /// more times fails classification and the record is skipped.
    pub fn decode(data: &[u8]) -> Result<Self, ProcessError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| ProcessError::decode(format!("payload is not UTF-8: {}", e)))?;

        let mut value: Value = serde_json::from_str(text)
            .map_err(|e| ProcessError::decode(format!("payload is not JSON: {}", e)))?;

        if let Value::String(inner) = value {
            value = serde_json::from_str(&inner).map_err(|e| {
                ProcessError::decode(format!("double-encoded payload is not JSON: {}", e))
            })?;
        }

        serde_json::from_value(value)
            .map_err(|e| ProcessError::unexpected(format!("unrecognized payload shape: {}", e)))
    }
}
