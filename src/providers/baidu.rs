use async_trait::async_trait;
use md5::{Digest, Md5};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use log::debug;

use crate::app_config::TranslatorConfig;
use crate::errors::TranslationError;
use crate::language_utils::{AUTO_LANGUAGE, base_language_code};
use crate::providers::{TranslationProvider, api_error, build_http_client};
use crate::translation::cache::TranslationCache;

/// Default host of the general translation API
const DEFAULT_BASE_URL: &str = "https://fanyi-api.baidu.com";

/// Baidu general translation client
#[derive(Debug)]
pub struct BaiduTranslator {
    /// HTTP client for API requests
    client: Client,
    /// Endpoint host, overridable through `base_url`
    base_url: String,
    /// Application id
    app_id: String,
    /// Signing secret
    secret_key: String,
    /// Response cache
    cache: TranslationCache,
}

/// Response of `/api/trans/vip/translate`
#[derive(Debug, Deserialize)]
struct BaiduResponse {
    #[serde(default)]
    trans_result: Vec<BaiduTranslation>,
    /// Sent as a string or a number depending on the error
    #[serde(default)]
    error_code: Option<Value>,
    #[serde(default)]
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BaiduTranslation {
    dst: String,
}

/// Request signature: hex MD5 of `app_id + query + salt + secret_key`
pub fn sign(app_id: &str, query: &str, salt: &str, secret_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_id.as_bytes());
    hasher.update(query.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(secret_key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Baidu uses its own codes for several languages
pub fn target_code(target_language: &str) -> String {
    let lowered = target_language.to_lowercase();
    match lowered.as_str() {
        "zh-tw" | "zh-hk" | "zh-hant" => return "cht".to_string(),
        "zh-cn" | "zh-hans" => return "zh".to_string(),
        _ => {}
    }

    match base_language_code(&lowered).as_str() {
        "ja" => "jp".to_string(),
        "ko" => "kor".to_string(),
        "fr" => "fra".to_string(),
        "es" => "spa".to_string(),
        "ar" => "ara".to_string(),
        "vi" => "vie".to_string(),
        other => other.to_string(),
    }
}

impl BaiduTranslator {
    /// Create a new client; an app id and a secret key are required
    pub fn new(settings: &TranslatorConfig, cache: TranslationCache) -> Result<Self, TranslationError> {
        if settings.app_id.trim().is_empty() || settings.secret_key.trim().is_empty() {
            return Err(TranslationError::Config(
                "baidu requires an app_id and a secret_key".to_string(),
            ));
        }

        let base_url = if settings.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            settings.base_url.trim_end_matches('/').to_string()
        };

        Ok(Self {
            client: build_http_client(settings.timeout_duration())?,
            base_url,
            app_id: settings.app_id.trim().to_string(),
            secret_key: settings.secret_key.trim().to_string(),
            cache,
        })
    }

    async fn request(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let salt = rand::rng().random_range(32768..=65536).to_string();
        let signature = sign(&self.app_id, text, &salt, &self.secret_key);
        let target = target_code(target_language);

        let url = format!("{}/api/trans/vip/translate", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", text),
                ("from", AUTO_LANGUAGE),
                ("to", target.as_str()),
                ("appid", self.app_id.as_str()),
                ("salt", salt.as_str()),
                ("sign", signature.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: BaiduResponse = response.json().await?;
        if let Some(code) = body.error_code {
            let code = match code {
                Value::String(code) => code,
                other => other.to_string(),
            };
            return Err(TranslationError::api(format!(
                "baidu error {}: {}",
                code,
                body.error_msg.unwrap_or_default()
            )));
        }
        if body.trans_result.is_empty() {
            return Err(TranslationError::unusable_payload("missing trans_result"));
        }

        // One entry per line of the query
        let lines: Vec<String> = body.trans_result.into_iter().map(|line| line.dst).collect();
        Ok(lines.join("\n"))
    }
}

#[async_trait]
impl TranslationProvider for BaiduTranslator {
    fn name(&self) -> &str {
        "baidu"
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, target_language) {
            return Ok(cached);
        }

        let translated = self.request(text, target_language).await?;
        debug!("baidu translated {} chars", text.chars().count());
        self.cache.store(text, target_language, &translated);
        Ok(translated)
    }
}
