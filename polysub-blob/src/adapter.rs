use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::instrument;

use polysub_core::{BlobKey, TenantId};

use crate::config::BlobConfig;
use crate::error::BlobResult;
use crate::key_strategy::{BlobKeyStrategy, ContentHashKeyStrategy};
use crate::receipt::{BlobMetadata, PutReceipt};
use crate::store::BlobStore;
use crate::types::{BlobKind, ByteStream};

/// The adapter embedded by the pipeline driver and subtitle emitter: wraps
/// a `BlobStore` with key generation and TTL metadata.
pub struct BlobAdapter {
    store: Arc<dyn BlobStore>,
    keys: Arc<dyn BlobKeyStrategy>,
    config: BlobConfig,
}

impl BlobAdapter {
    pub fn new<S: BlobStore + 'static>(store: S, config: BlobConfig) -> Self {
        Self {
            store: Arc::new(store),
            keys: Arc::new(ContentHashKeyStrategy),
            config,
        }
    }

    pub fn with_key_strategy<S, K>(store: S, keys: K, config: BlobConfig) -> Self
    where
        S: BlobStore + 'static,
        K: BlobKeyStrategy + 'static,
    {
        Self {
            store: Arc::new(store),
            keys: Arc::new(keys),
            config,
        }
    }

    #[instrument(skip(self), fields(tenant = %tenant, kind = ?kind))]
    pub async fn put(
        &self,
        local_path: &Path,
        tenant: &TenantId,
        kind: BlobKind,
        content_type: Option<&str>,
    ) -> BlobResult<PutReceipt> {
        let bytes = tokio::fs::read(local_path).await?;
        let key = self.keys.object_key(tenant, kind, &bytes);
        let size_bytes = bytes.len() as u64;
        self.store.put(&key, content_type, bytes).await?;

        let presigned_get_url = self
            .store
            .presign_get(&key, self.config.presign_default_ttl_secs)
            .await?;

        Ok(PutReceipt {
            key,
            presigned_get_url,
            expires_in_secs: self.config.presign_default_ttl_secs,
            size_bytes,
            metadata: BlobMetadata {
                uploaded_at: Utc::now(),
                tenant: tenant.clone(),
                auto_delete_ttl_hours: self.config.artifact_ttl_hours,
            },
        })
    }

    pub async fn get_stream(&self, key: &BlobKey) -> BlobResult<ByteStream> {
        self.store.get_stream(key).await
    }

    pub async fn presign_get(&self, key: &BlobKey, ttl_secs: u64) -> BlobResult<String> {
        self.store.presign_get(key, ttl_secs).await
    }

    pub async fn delete(&self, key: &BlobKey) -> BlobResult<()> {
        self.store.delete(key).await
    }

    pub async fn list_older_than(&self, older_than: DateTime<Utc>) -> BlobResult<Vec<BlobKey>> {
        self.store.list_older_than(older_than).await
    }

    pub fn config(&self) -> &BlobConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobStore;

    #[tokio::test]
    async fn put_attaches_ttl_metadata_and_presigns() {
        let dir = tempdir();
        let path = dir.join("clip.wav");
        tokio::fs::write(&path, b"pcm-data").await.unwrap();

        let adapter = BlobAdapter::new(MemoryBlobStore::new(), BlobConfig::default());
        let tenant = TenantId::new("acme");
        let receipt = adapter
            .put(&path, &tenant, BlobKind::Audio, Some("audio/wav"))
            .await
            .unwrap();

        assert_eq!(receipt.metadata.auto_delete_ttl_hours, 24);
        assert_eq!(receipt.expires_in_secs, 86_400);
        assert!(receipt.key.as_str().starts_with("acme/audio/"));
        assert!(!receipt.presigned_get_url.is_empty());

        tokio::fs::remove_file(&path).await.ok();
    }

    fn tempdir() -> std::path::PathBuf {
        std::env::temp_dir()
    }
}
