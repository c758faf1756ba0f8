use async_trait::async_trait;

use crate::error::ProviderError;

/// A callable "translate strings with context" black box. Implementations wrap a specific vendor API.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translates one `[SEGk]`-marked block verbatim, preserving markers.
    async fn translate_block(
        &self,
        block: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError>;
}
