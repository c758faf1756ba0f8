use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polysub_core::BlobKey;

use crate::error::BlobResult;
use crate::types::{ByteStream, PutResult};

/// Core storage primitives: a blob put/get/presign interface, trimmed of
/// multipart/range support this system has no use for.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &BlobKey, content_type: Option<&str>, bytes: Vec<u8>) -> BlobResult<PutResult>;
    async fn get_stream(&self, key: &BlobKey) -> BlobResult<ByteStream>;
    async fn presign_get(&self, key: &BlobKey, ttl_secs: u64) -> BlobResult<String>;
    async fn delete(&self, key: &BlobKey) -> BlobResult<()>;
    /// Object keys uploaded before `older_than`, for the cleaner.
    async fn list_older_than(&self, older_than: DateTime<Utc>) -> BlobResult<Vec<BlobKey>>;
}
