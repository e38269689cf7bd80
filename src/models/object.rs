//! Represents a document stored in the bucket.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Metadata of a single stored object.
///
/// The payload itself lives with the object store; this struct only describes it.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Object {
    /// Internal UUID for DB indexing.
    pub id: Uuid,

    /// Bucket the object belongs to.
    pub bucket: String,

    /// Object key, e.g. `folder-in-s3/example.png`.
    pub key: String,

    /// Last path segment of the key.
    pub filename: String,

    /// Content type (MIME type) supplied at upload time.
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// Hex MD5 of the payload.
    pub etag: Option<String>,

    pub last_modified: DateTime<Utc>,
}
