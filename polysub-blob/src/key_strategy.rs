use sha2::{Digest, Sha256};

use polysub_core::{BlobKey, TenantId};

use crate::types::BlobKind;

/// Generates object keys. The default strategy lays objects out as
/// `{tenant}/{kind}/{hash}{ext}`; content-addressing lets the cleaner and
/// the translator's content cache share the same hash.
pub trait BlobKeyStrategy: Send + Sync {
    fn object_key(&self, tenant: &TenantId, kind: BlobKind, content: &[u8]) -> BlobKey;
}

#[derive(Debug, Clone, Default)]
pub struct ContentHashKeyStrategy;

impl BlobKeyStrategy for ContentHashKeyStrategy {
    fn object_key(&self, tenant: &TenantId, kind: BlobKind, content: &[u8]) -> BlobKey {
        let mut hasher = Sha256::new();
        hasher.update(content);
        let digest = hasher.finalize();
        let hash = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
        BlobKey::new(format!(
            "{}/{}/{}{}",
            tenant.as_str(),
            kind.path(),
            &hash[..32],
            kind.extension()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_format_is_tenant_kind_hash() {
        let strategy = ContentHashKeyStrategy;
        let tenant = TenantId::new("acme");
        let key = strategy.object_key(&tenant, BlobKind::SubtitlesSrt, b"hello");
        assert!(key.as_str().starts_with("acme/subtitles/srt/"));
        assert!(key.as_str().ends_with(".srt"));
    }

    #[test]
    fn identical_content_yields_identical_key() {
        let strategy = ContentHashKeyStrategy;
        let tenant = TenantId::new("acme");
        let a = strategy.object_key(&tenant, BlobKind::Audio, b"same bytes");
        let b = strategy.object_key(&tenant, BlobKind::Audio, b"same bytes");
        assert_eq!(a, b);
    }
}
