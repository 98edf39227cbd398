use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use log::debug;

use crate::app_config::TranslatorConfig;
use crate::errors::TranslationError;
use crate::language_utils::AUTO_LANGUAGE;
use crate::providers::{TranslationProvider, api_error, build_http_client};
use crate::translation::cache::TranslationCache;

/// Default host of the free web translation endpoint
const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Google web translation client
#[derive(Debug)]
pub struct GoogleTranslator {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint host, overridable through `base_url`
    base_url: String,
    /// Response cache
    cache: TranslationCache,
}

impl GoogleTranslator {
    /// Create a new client from provider settings
    pub fn new(settings: &TranslatorConfig, cache: TranslationCache) -> Result<Self, TranslationError> {
        let base_url = if settings.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            settings.base_url.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client: build_http_client(settings.timeout_duration())?,
            base_url,
            cache,
        })
    }

    /// Google expects regional codes for Chinese
    fn target_code(target_language: &str) -> &str {
        match target_language {
            "zh" => "zh-CN",
            other => other,
        }
    }

    async fn request(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let url = format!("{}/translate_a/single", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("client", "gtx"),
                ("sl", AUTO_LANGUAGE),
                ("tl", Self::target_code(target_language)),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: Value = response.json().await?;
        Ok(extract_translation(&body)?.unwrap_or_else(|| text.to_string()))
    }
}

/// Join the translated chunks of a `translate_a/single` response.
///
/// Returns `None` when the response holds no text.
pub fn extract_translation(body: &Value) -> Result<Option<String>, TranslationError> {
    let chunks = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslationError::unusable_payload("missing translation array"))?;

    let joined: String = chunks
        .iter()
        .filter_map(|chunk| chunk.get(0).and_then(Value::as_str))
        .collect();

    if joined.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(joined.trim().to_string()))
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, target_language) {
            return Ok(cached);
        }

        let translated = self.request(text, target_language).await?;
        debug!("google translated {} chars", text.chars().count());
        self.cache.store(text, target_language, &translated);
        Ok(translated)
    }
}
