use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ProviderError;
use crate::provider::TranslationProvider;

/// A vendor-agnostic REST provider: POSTs the marked block to a configured
/// endpoint and expects back `{"text": "..."}`. Concrete vendors (OpenAI,
/// DeepL, a self-hosted NLLB server) all fit this shape closely enough that
/// the facade only needs one HTTP implementation, parameterized by
/// `base_url`/`model`/`api_key`.
pub struct HttpTranslationProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

#[derive(Serialize)]
struct TranslateRequest<'a> {
    model: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    text: String,
}

impl HttpTranslationProvider {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, model: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslationProvider {
    #[instrument(skip(self, block), fields(model = %self.model, len = block.len()))]
    async fn translate_block(&self, block: &str, source_lang: &str, target_lang: &str) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&TranslateRequest {
                model: &self.model,
                source_lang,
                target_lang,
                text: block,
            })
            .send()
            .await
            .map_err(|err| ProviderError::Hard(err.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(ProviderError::Hard(format!("provider returned {}", response.status())));
        }

        let body: TranslateResponse = response.json().await.map_err(|err| ProviderError::Hard(err.to_string()))?;
        Ok(body.text)
    }
}
