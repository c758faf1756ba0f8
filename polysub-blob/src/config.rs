/// Configuration for the blob store adapter.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// Default presign TTL for `put`'s returned URL.
    pub presign_default_ttl_secs: u64,
    /// TTL recorded in `BlobMetadata.auto_delete_ttl_hours`, consumed by the cleaner.
    pub artifact_ttl_hours: u32,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            presign_default_ttl_secs: 24 * 3600,
            artifact_ttl_hours: 24,
        }
    }
}

impl BlobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_presign_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.presign_default_ttl_secs = ttl_secs;
        self
    }

    pub fn with_artifact_ttl_hours(mut self, hours: u32) -> Self {
        self.artifact_ttl_hours = hours;
        self
    }
}
