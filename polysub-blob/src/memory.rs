use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use parking_lot::RwLock;
use polysub_core::BlobKey;

use crate::error::{BlobError, BlobResult};
use crate::store::BlobStore;
use crate::types::{ByteStream, PutResult};

struct Object {
    bytes: Vec<u8>,
    content_type: Option<String>,
    uploaded_at: DateTime<Utc>,
}

/// In-memory blob store for tests and local runs.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<BlobKey, Object>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, key: &BlobKey, content_type: Option<&str>, bytes: Vec<u8>) -> BlobResult<PutResult> {
        let size_bytes = bytes.len() as u64;
        self.objects.write().insert(
            key.clone(),
            Object {
                bytes,
                content_type: content_type.map(|s| s.to_string()),
                uploaded_at: Utc::now(),
            },
        );
        Ok(PutResult {
            size_bytes,
            etag: None,
        })
    }

    async fn get_stream(&self, key: &BlobKey) -> BlobResult<ByteStream> {
        let objects = self.objects.read();
        let object = objects
            .get(key)
            .ok_or_else(|| BlobError::not_found(key.to_string()))?;
        let chunk: Result<Bytes, std::io::Error> = Ok(Bytes::from(object.bytes.clone()));
        let boxed: ByteStream = Box::pin(stream::iter(vec![chunk]));
        Ok(boxed)
    }

    async fn presign_get(&self, key: &BlobKey, ttl_secs: u64) -> BlobResult<String> {
        if !self.objects.read().contains_key(key) {
            return Err(BlobError::not_found(key.to_string()));
        }
        Ok(format!("memory://{key}?ttl={ttl_secs}"))
    }

    async fn delete(&self, key: &BlobKey) -> BlobResult<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn list_older_than(&self, older_than: DateTime<Utc>) -> BlobResult<Vec<BlobKey>> {
        Ok(self
            .objects
            .read()
            .iter()
            .filter(|(_, object)| object.uploaded_at < older_than)
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_presign_round_trips() {
        let store = MemoryBlobStore::new();
        let key = BlobKey::new("t1/audio/deadbeef.wav");
        store.put(&key, Some("audio/wav"), b"pcm".to_vec()).await.unwrap();
        let url = store.presign_get(&key, 3600).await.unwrap();
        assert!(url.contains("t1/audio/deadbeef.wav"));
    }

    #[tokio::test]
    async fn delete_removes_object() {
        let store = MemoryBlobStore::new();
        let key = BlobKey::new("t1/audio/x.wav");
        store.put(&key, None, vec![1, 2, 3]).await.unwrap();
        store.delete(&key).await.unwrap();
        assert!(store.presign_get(&key, 60).await.is_err());
    }

    #[tokio::test]
    async fn list_older_than_filters_by_upload_time() {
        let store = MemoryBlobStore::new();
        let key = BlobKey::new("t1/audio/old.wav");
        store.put(&key, None, vec![0]).await.unwrap();
        let future_cutoff = Utc::now() + chrono::Duration::seconds(5);
        let stale = store.list_older_than(future_cutoff).await.unwrap();
        assert_eq!(stale, vec![key]);
    }
}
