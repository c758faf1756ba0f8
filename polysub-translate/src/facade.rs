use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use polysub_subtitle::Segment;

use crate::budget::ProviderBudget;
use crate::cache::TranslationCache;
use crate::chunk::{chunk_texts, parse_markers, Block};
use crate::config::FacadeConfig;
use crate::error::{ProviderError, TranslateError, TranslateResult};
use crate::provider::TranslationProvider;

struct NamedProvider {
    name: String,
    provider: Arc<dyn TranslationProvider>,
    budget: ProviderBudget,
}

/// Given `segments, sourceLang, targetLang`, produces segments with
/// translated `text` and preserved timings.
pub struct TranslatorFacade {
    providers: Vec<NamedProvider>,
    cache: Option<Arc<dyn TranslationCache>>,
    config: FacadeConfig,
}

impl TranslatorFacade {
    pub fn new(config: FacadeConfig) -> Self {
        Self {
            providers: Vec::new(),
            cache: None,
            config,
        }
    }

    /// Registers a provider at the end of the priority order.
    pub fn with_provider<P: TranslationProvider + 'static>(
        mut self,
        name: impl Into<String>,
        provider: P,
        hourly_limit: u32,
    ) -> Self {
        self.providers.push(NamedProvider {
            name: name.into(),
            provider: Arc::new(provider),
            budget: ProviderBudget::new(hourly_limit),
        });
        self
    }

    pub fn with_cache<C: TranslationCache + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    #[instrument(skip(self, segments), fields(segment_count = segments.len(), %source_lang, %target_lang))]
    pub async fn translate(
        &self,
        segments: &[Segment],
        source_lang: &str,
        target_lang: &str,
    ) -> TranslateResult<Vec<Segment>> {
        if self.providers.is_empty() {
            return Err(TranslateError::NoProviders);
        }

        let mut output = segments.to_vec();
        let mut uncached: Vec<(usize, String)> = Vec::new();

        for (index, segment) in segments.iter().enumerate() {
            if let Some(cached) = self
                .cache
                .as_ref()
                .and_then(|cache| cache.get(source_lang, target_lang, &segment.text))
            {
                output[index].original_text = Some(segment.text.clone());
                output[index].text = cached;
            } else {
                uncached.push((index, segment.text.clone()));
            }
        }

        if uncached.is_empty() {
            return Ok(output);
        }

        let refs: Vec<(usize, &str)> = uncached.iter().map(|(i, t)| (*i, t.as_str())).collect();
        let blocks = chunk_texts(&refs, self.config.char_budget);

        for (block_index, block) in blocks.iter().enumerate() {
            if block_index > 0 {
                tokio::time::sleep(self.config.inter_block_pacing).await;
            }

            let translated = self.translate_block(block, source_lang, target_lang).await;

            for &index in &block.indices {
                let original = segments[index].text.clone();
                let text = translated
                    .as_ref()
                    .ok()
                    .and_then(|map| map.get(&index).cloned())
                    .unwrap_or_else(|| original.clone());

                if let Some(cache) = &self.cache {
                    if translated.is_ok() && text != original {
                        cache.put(source_lang, target_lang, &original, text.clone());
                    }
                }

                output[index].original_text = Some(original);
                output[index].text = text;
            }
        }

        Ok(output)
    }

    async fn translate_block(
        &self,
        block: &Block,
        source_lang: &str,
        target_lang: &str,
    ) -> TranslateResult<HashMap<usize, String>> {
        for named in &self.providers {
            if !named.budget.can_use() {
                continue;
            }

            match self.attempt_with_retry(named, block, source_lang, target_lang).await {
                Ok(response) => {
                    named.budget.record_use();
                    return Ok(parse_markers(&response));
                }
                Err(ProviderError::RateLimited) => {
                    named.budget.mark_saturated();
                    warn!(provider = %named.name, "provider saturated, trying next");
                }
                Err(ProviderError::Hard(reason)) => {
                    warn!(provider = %named.name, %reason, "provider failed after retries");
                }
            }
        }

        warn!("all providers at budget, retrying with delay");
        tokio::time::sleep(self.config.exhausted_retry_delay).await;

        for named in &self.providers {
            match named.provider.translate_block(&block.prompt, source_lang, target_lang).await {
                Ok(response) => return Ok(parse_markers(&response)),
                Err(_) => {
                    warn!(provider = %named.name, "forced fallback attempt failed, trying next");
                }
            }
        }

        warn!("all providers exhausted, block falls back to originals");
        Err(TranslateError::AllProvidersExhausted)
    }

    async fn attempt_with_retry(
        &self,
        named: &NamedProvider,
        block: &Block,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, ProviderError> {
        let mut attempt = 0;
        loop {
            match named.provider.translate_block(&block.prompt, source_lang, target_lang).await {
                Ok(response) => return Ok(response),
                Err(ProviderError::RateLimited) => return Err(ProviderError::RateLimited),
                Err(ProviderError::Hard(reason)) => {
                    attempt += 1;
                    if attempt >= self.config.retry_attempts {
                        return Err(ProviderError::Hard(reason));
                    }
                    let backoff = Duration::from_millis(200 * 2u64.pow(attempt));
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EchoProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TranslationProvider for EchoProvider {
        async fn translate_block(
            &self,
            block: &str,
            _source_lang: &str,
            _target_lang: &str,
        ) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let translated: Vec<String> = block
                .lines()
                .map(|line| {
                    let (marker, rest) = line.split_once(' ').unwrap_or((line, ""));
                    format!("{marker} [translated]{rest}")
                })
                .collect();
            Ok(translated.join("\n"))
        }
    }

    struct AlwaysRateLimited;

    #[async_trait]
    impl TranslationProvider for AlwaysRateLimited {
        async fn translate_block(
            &self,
            _block: &str,
            _source_lang: &str,
            _target_lang: &str,
        ) -> Result<String, ProviderError> {
            Err(ProviderError::RateLimited)
        }
    }

    #[tokio::test]
    async fn translates_preserving_timings() {
        let facade = TranslatorFacade::new(FacadeConfig::default()).with_provider(
            "primary",
            EchoProvider { calls: AtomicUsize::new(0) },
            100,
        );

        let segments = vec![Segment::new(0.0, 1.0, "hello"), Segment::new(1.0, 2.0, "world")];
        let translated = facade.translate(&segments, "en", "pt").await.unwrap();

        assert_eq!(translated[0].start, 0.0);
        assert_eq!(translated[0].end, 1.0);
        assert!(translated[0].text.contains("[translated]"));
        assert_eq!(translated[0].original_text.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn falls_over_to_secondary_when_primary_saturated() {
        let facade = TranslatorFacade::new(FacadeConfig::default())
            .with_provider("primary", AlwaysRateLimited, 100)
            .with_provider("secondary", EchoProvider { calls: AtomicUsize::new(0) }, 100);

        let segments = vec![Segment::new(0.0, 1.0, "hello")];
        let translated = facade.translate(&segments, "en", "pt").await.unwrap();
        assert!(translated[0].text.contains("[translated]"));
    }

    #[tokio::test]
    async fn no_providers_configured_errors() {
        let facade = TranslatorFacade::new(FacadeConfig::default());
        let segments = vec![Segment::new(0.0, 1.0, "hello")];
        let result = facade.translate(&segments, "en", "pt").await;
        assert!(matches!(result, Err(TranslateError::NoProviders)));
    }

    #[tokio::test]
    async fn cache_hit_skips_provider_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        struct CountingProvider(Arc<AtomicUsize>);

        #[async_trait]
        impl TranslationProvider for CountingProvider {
            async fn translate_block(
                &self,
                block: &str,
                _source_lang: &str,
                _target_lang: &str,
            ) -> Result<String, ProviderError> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(block.to_string())
            }
        }

        let cache = crate::cache::InMemoryTranslationCache::new();
        cache.put("en", "pt", "hello", "olá".to_string());

        let facade = TranslatorFacade::new(FacadeConfig::default())
            .with_provider("primary", CountingProvider(calls.clone()), 100)
            .with_cache(cache);

        let segments = vec![Segment::new(0.0, 1.0, "hello")];
        let translated = facade.translate(&segments, "en", "pt").await.unwrap();
        assert_eq!(translated[0].text, "olá");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
