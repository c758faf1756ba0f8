//! Environment-driven configuration.
//!
//! String-keyed settings loaded from `std::env`, with typed accessors for
//! the fixed set of knobs this workspace needs plus a raw fallback map for
//! overrides that haven't been promoted to a typed field yet.

use std::collections::HashMap;
use std::env;

/// Process-wide configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub api_host: String,
    pub api_port: u16,
    pub whisper_model_free: String,
    pub whisper_model_paid: String,
    pub translation_model_free: String,
    pub translation_model_paid: String,
    pub free_minutes_limit: u32,
    pub max_file_size_mb_free: u64,
    pub max_file_size_mb_paid: u64,
    pub blob_endpoint: String,
    pub db_url: String,
    pub rate_limiter_store_url: String,
    pub artifact_ttl_hours: u32,
    pub concurrency_priority: usize,
    pub concurrency_paid: usize,
    pub concurrency_free: usize,
    /// Raw overrides, for knobs not promoted to a typed field yet.
    extra: HashMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_host: "0.0.0.0".to_string(),
            api_port: 8080,
            whisper_model_free: "base".to_string(),
            whisper_model_paid: "large-v3".to_string(),
            translation_model_free: "nllb-200-distilled".to_string(),
            translation_model_paid: "gpt-4o-mini".to_string(),
            free_minutes_limit: 20,
            max_file_size_mb_free: 100,
            max_file_size_mb_paid: 2048,
            blob_endpoint: "http://localhost:9000".to_string(),
            db_url: "postgres://localhost/polysub".to_string(),
            rate_limiter_store_url: "redis://localhost:6379".to_string(),
            artifact_ttl_hours: 24,
            concurrency_priority: 8,
            concurrency_paid: 4,
            concurrency_free: 2,
            extra: HashMap::new(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration, taking defaults and overriding from the process
    /// environment wherever a recognized variable is set.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    fn apply_env(&mut self) {
        if let Some(v) = env_str("API_HOST") {
            self.api_host = v;
        }
        if let Some(v) = env_parsed::<u16>("API_PORT") {
            self.api_port = v;
        }
        if let Some(v) = env_str("WHISPER_MODEL_FREE") {
            self.whisper_model_free = v;
        }
        if let Some(v) = env_str("WHISPER_MODEL_PAID") {
            self.whisper_model_paid = v;
        }
        if let Some(v) = env_str("TRANSLATION_MODEL_FREE") {
            self.translation_model_free = v;
        }
        if let Some(v) = env_str("TRANSLATION_MODEL_PAID") {
            self.translation_model_paid = v;
        }
        if let Some(v) = env_parsed::<u32>("FREE_MINUTES_LIMIT") {
            self.free_minutes_limit = v;
        }
        if let Some(v) = env_parsed::<u64>("MAX_FILE_SIZE_MB_FREE") {
            self.max_file_size_mb_free = v;
        }
        if let Some(v) = env_parsed::<u64>("MAX_FILE_SIZE_MB_PAID") {
            self.max_file_size_mb_paid = v;
        }
        if let Some(v) = env_str("BLOB_ENDPOINT") {
            self.blob_endpoint = v;
        }
        if let Some(v) = env_str("DB_URL") {
            self.db_url = v;
        }
        if let Some(v) = env_str("RATE_LIMITER_STORE_URL") {
            self.rate_limiter_store_url = v;
        }
        if let Some(v) = env_parsed::<u32>("ARTIFACT_TTL_HOURS") {
            self.artifact_ttl_hours = v;
        }
        if let Some(v) = env_parsed::<usize>("CONCURRENCY_PRIORITY") {
            self.concurrency_priority = v;
        }
        if let Some(v) = env_parsed::<usize>("CONCURRENCY_PAID") {
            self.concurrency_paid = v;
        }
        if let Some(v) = env_parsed::<usize>("CONCURRENCY_FREE") {
            self.concurrency_free = v;
        }

        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix("POLYSUB__") {
                self.extra.insert(stripped.to_lowercase().replace("__", "."), value);
            }
        }
    }

    /// Look up an override not covered by a typed field.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|s| s.as_str())
    }

    /// Sanity-checks required knobs before the process starts serving
    /// traffic.
    pub fn validate(&self) -> Result<(), String> {
        if self.api_host.trim().is_empty() {
            return Err("API_HOST must not be empty".to_string());
        }
        if self.api_port == 0 {
            return Err("API_PORT must be nonzero".to_string());
        }
        if self.blob_endpoint.trim().is_empty() {
            return Err("BLOB_ENDPOINT must not be empty".to_string());
        }
        if self.db_url.trim().is_empty() {
            return Err("DB_URL must not be empty".to_string());
        }
        Ok(())
    }

    /// Concurrency cap for a given job class.
    pub fn concurrency_for(&self, class: crate::JobClass) -> usize {
        match class {
            crate::JobClass::Priority => self.concurrency_priority,
            crate::JobClass::Paid => self.concurrency_paid,
            crate::JobClass::Free => self.concurrency_free,
        }
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.free_minutes_limit, 20);
        assert_eq!(cfg.artifact_ttl_hours, 24);
    }

    #[test]
    fn concurrency_for_routes_by_class() {
        let cfg = PipelineConfig::default();
        use crate::JobClass;
        assert_eq!(cfg.concurrency_for(JobClass::Priority), cfg.concurrency_priority);
        assert_eq!(cfg.concurrency_for(JobClass::Free), cfg.concurrency_free);
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(PipelineConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_db_url() {
        let mut cfg = PipelineConfig::default();
        cfg.db_url = String::new();
        assert!(cfg.validate().is_err());
    }
}
