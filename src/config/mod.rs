//! Provider credentials and agent configuration.

mod agent;

pub use agent::AgentConfig;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Provider API keys and base URLs.
///
/// Values come from explicit setters or from the environment (including a
/// `.env` file) via [`ColloquyConfig::from_env`]. Clones share state.
#[derive(Clone, Default)]
pub struct ColloquyConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
}

const API_KEY_VARS: [(&str, &str); 2] = [
    ("OPENAI_API_KEY", "openai"),
    ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
];

const BASE_URL_VARS: [(&str, &str); 2] = [
    ("OPENAI_BASE_URL", "openai"),
    ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
];

impl ColloquyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from environment variables, reading `.env` first if present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self::new();
        for (var, provider) in API_KEY_VARS {
            if let Some(key) = lookup(var).filter(|v| !v.is_empty()) {
                config.set_api_key(provider, key);
            }
        }
        for (var, provider) in BASE_URL_VARS {
            if let Some(url) = lookup(var).filter(|v| !v.is_empty()) {
                config.set_base_url(provider, url);
            }
        }
        config
    }

    pub fn set_api_key(&self, provider: &str, key: impl Into<String>) {
        self.api_keys
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), key.into());
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: impl Into<String>) {
        self.base_urls
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), url.into());
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned()
    }

    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }
}

impl std::fmt::Debug for ColloquyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let providers: Vec<String> = self
            .api_keys
            .read()
            .map(|keys| keys.keys().cloned().collect())
            .unwrap_or_default();
        f.debug_struct("ColloquyConfig")
            .field("providers_with_keys", &providers)
            .finish_non_exhaustive()
    }
}
