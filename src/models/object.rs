//! Represents an object fetched from the backing store.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use std::{fmt, io};

/// Body of a fetched object, read incrementally from the backend.
pub type ObjectBody = BoxStream<'static, io::Result<Bytes>>;

/// A single object (blob) as returned by the backing store.
///
/// Lives for one request: the body is handed to the response and the rest
/// becomes response headers.
pub struct StoredObject {
    /// Payload stream. Dropping it releases the backend connection.
    pub body: ObjectBody,

    /// Content type (MIME type) as reported by the store.
    pub content_type: Option<String>,

    /// Entity tag, passed through verbatim (quotes included).
    pub etag: Option<String>,

    /// Timestamp when the object was last modified.
    pub last_modified: Option<DateTime<Utc>>,

    /// Size in bytes, when the store knows it.
    pub content_length: Option<u64>,
}

impl fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredObject")
            .field("content_type", &self.content_type)
            .field("etag", &self.etag)
            .field("last_modified", &self.last_modified)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
