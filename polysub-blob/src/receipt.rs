use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use polysub_core::{BlobKey, TenantId};

/// Returned by `BlobAdapter::put`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutReceipt {
    pub key: BlobKey,
    pub presigned_get_url: String,
    pub expires_in_secs: u64,
    pub size_bytes: u64,
    pub metadata: BlobMetadata,
}

/// Metadata attached on put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMetadata {
    pub uploaded_at: DateTime<Utc>,
    pub tenant: TenantId,
    pub auto_delete_ttl_hours: u32,
}
