//! Object store trait definition.

use async_trait::async_trait;

use crate::errors::ObjectStoreError;

/// Abstract interface for fetching referenced objects.
///
/// Upload events on the stream carry a `{bucket, key}` reference rather than
/// the file content itself; the record pipeline resolves the reference
/// through this trait.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the referenced object and return its full body as text.
    ///
    /// The body is accumulated chunk by chunk into a single buffer before
    /// being returned, so callers never observe a partially arrived object.
    async fn fetch_object(&self, bucket: &str, key: &str) -> Result<String, ObjectStoreError>;
}
