//! S3 object store implementation.
//!
//! Fetches referenced objects from S3 (or an S3-compatible endpoint such as
//! LocalStack) and accumulates their bodies into a single text buffer.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::errors::ObjectStoreError;
use crate::interfaces::ObjectStore;

/// S3 implementation of the object store.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Create a new object store over an already-configured S3 client.
    ///
    /// Endpoint overrides and path-style addressing are the caller's concern;
    /// this type only performs fetches.
    pub fn new(client: Client) -> Self {
        info!("Created S3 object store");
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    /// Fetch an object and return its full body as UTF-8 text.
    ///
    /// The body stream is drained chunk by chunk into one buffer; the data is
    /// only treated as complete once the stream ends, so a still-arriving
    /// object is never returned partially.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    ObjectStoreError::not_found(format!("s3://{}/{}", bucket, key))
                } else {
                    ObjectStoreError::fetch(service_error.to_string())
                }
            })?;

        let mut body = output.body;
        let mut buffer: Vec<u8> = Vec::new();

        while let Some(chunk) = body
            .try_next()
            .await
            .map_err(|e| ObjectStoreError::body(e.to_string()))?
        {
            buffer.extend_from_slice(&chunk);
        }

        debug!(bucket = %bucket, key = %key, bytes = buffer.len(), "Fetched object");

        String::from_utf8(buffer).map_err(|e| ObjectStoreError::EncodingError(e.to_string()))
    }
}
