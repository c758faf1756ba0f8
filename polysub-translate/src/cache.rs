use std::collections::HashMap;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

/// Content-addressed translation cache, keyed on
/// `sha256(sourceLang||targetLang||normalized_text)`.
pub trait TranslationCache: Send + Sync {
    fn get(&self, source_lang: &str, target_lang: &str, text: &str) -> Option<String>;
    fn put(&self, source_lang: &str, target_lang: &str, text: &str, translated: String);
}

pub fn cache_key(source_lang: &str, target_lang: &str, text: &str) -> String {
    let normalized = text.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(source_lang.as_bytes());
    hasher.update(b"||");
    hasher.update(target_lang.as_bytes());
    hasher.update(b"||");
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Default)]
pub struct InMemoryTranslationCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryTranslationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TranslationCache for InMemoryTranslationCache {
    fn get(&self, source_lang: &str, target_lang: &str, text: &str) -> Option<String> {
        let key = cache_key(source_lang, target_lang, text);
        self.entries.read().get(&key).cloned()
    }

    fn put(&self, source_lang: &str, target_lang: &str, text: &str, translated: String) {
        let key = cache_key(source_lang, target_lang, text);
        self.entries.write().insert(key, translated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_and_langs_hit_the_cache() {
        let cache = InMemoryTranslationCache::new();
        cache.put("en", "pt", "Hello", "Olá".to_string());
        assert_eq!(cache.get("en", "pt", "Hello"), Some("Olá".to_string()));
        assert_eq!(cache.get("en", "pt", "  hello  "), Some("Olá".to_string()));
    }

    #[test]
    fn different_target_lang_misses() {
        let cache = InMemoryTranslationCache::new();
        cache.put("en", "pt", "Hello", "Olá".to_string());
        assert_eq!(cache.get("en", "es", "Hello"), None);
    }
}
