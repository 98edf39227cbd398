/*!
 * Translation providers.
 *
 * Every backend implements the `TranslationProvider` capability trait:
 * - Google: free web translation endpoint
 * - Baidu: signed general translation API
 * - OpenAI: chat-completions API, context-aware and structured block translation
 * - Ollama: local LLM server, same capabilities as OpenAI
 * - Simple / Passthrough: offline providers that never touch the network
 * - Mock: scripted behaviors for tests
 *
 * Optional capabilities have default implementations so a provider only
 * overrides what it actually supports.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::sync::Arc;
use log::warn;

use crate::app_config::Config;
use crate::errors::TranslationError;
use crate::translation::cache::TranslationCache;

pub mod baidu;
pub mod google;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod simple;

/// Names accepted by `create_provider`
pub const KNOWN_PROVIDERS: &[&str] = &["google", "baidu", "openai", "ollama", "simple", "passthrough"];

/// One segment of a block sent for structured translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockItem {
    /// Index of the segment in the caller's segment list
    pub id: usize,

    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Source text
    pub text: String,
}

/// Structured translation of one block item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredTranslation {
    /// Start time proposed by the provider
    pub start: f64,

    /// End time proposed by the provider
    pub end: f64,

    /// Translated text
    pub text_translated: String,
}

/// Common trait for all translation providers
///
/// Implementations must never mutate their input. Blank input is returned
/// unchanged without a network call.
#[async_trait]
pub trait TranslationProvider: Send + Sync + Debug {
    /// Registry name of the provider
    fn name(&self) -> &str;

    /// Translate a single piece of text
    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError>;

    /// Whether `translate_with_context` makes use of the context
    fn supports_context(&self) -> bool {
        false
    }

    /// Translate `current_text` using the surrounding subtitles for disambiguation.
    ///
    /// Providers without context support ignore the context.
    async fn translate_with_context(
        &self,
        _context_text: &str,
        current_text: &str,
        target_language: &str,
        _start_time: f64,
        _end_time: f64,
    ) -> Result<String, TranslationError> {
        self.translate_text(current_text, target_language).await
    }

    /// Translate a batch of texts, one call per item.
    ///
    /// A failed item is replaced by its original text; one failure never
    /// aborts the batch.
    async fn translate_texts(&self, texts: &[String], target_language: &str) -> Result<Vec<String>, TranslationError> {
        let mut translated = Vec::with_capacity(texts.len());

        for text in texts {
            match self.translate_text(text, target_language).await {
                Ok(result) => translated.push(result),
                Err(e) => {
                    warn!("{}: keeping original text after failure: {}", self.name(), e);
                    translated.push(text.clone());
                }
            }
        }

        Ok(translated)
    }

    /// Whether `translate_block_with_structure` is implemented
    fn supports_structured(&self) -> bool {
        false
    }

    /// Translate a block as JSON-in/JSON-out, allowing the provider to adjust
    /// segment boundaries. The returned map has exactly the ids of `items`.
    async fn translate_block_with_structure(
        &self,
        _items: &[BlockItem],
        _target_language: &str,
    ) -> Result<BTreeMap<usize, StructuredTranslation>, TranslationError> {
        Err(TranslationError::unsupported(self.name(), "structured block translation"))
    }
}

/// Fall back to the source text when a model answers with nothing
pub(crate) fn answer_or_source(provider: &str, answer: String, source: &str) -> String {
    if answer.trim().is_empty() {
        warn!("{}: empty answer, keeping source text", provider);
        source.to_string()
    } else {
        answer
    }
}

/// Check that a structured response covers exactly the requested ids
pub fn check_structured_ids(
    items: &[BlockItem],
    translations: &BTreeMap<usize, StructuredTranslation>,
) -> Result<(), TranslationError> {
    let expected: BTreeSet<usize> = items.iter().map(|item| item.id).collect();
    let received: BTreeSet<usize> = translations.keys().copied().collect();

    if expected == received {
        return Ok(());
    }

    let missing: Vec<_> = expected.difference(&received).collect();
    let unexpected: Vec<_> = received.difference(&expected).collect();
    Err(TranslationError::MalformedResponse(format!(
        "structured response ids do not match request (missing {:?}, unexpected {:?})",
        missing, unexpected
    )))
}

/// Create a provider by registry name using its settings from `config`
pub fn create_provider(name: &str, config: &Config) -> Result<Arc<dyn TranslationProvider>, TranslationError> {
    let settings = config.translator_config(name);
    let cache = TranslationCache::new(config.translation.cache_enabled, config.translation.cache_size);

    let provider: Arc<dyn TranslationProvider> = match name {
        "google" => Arc::new(google::GoogleTranslator::new(&settings, cache)?),
        "baidu" => Arc::new(baidu::BaiduTranslator::new(&settings, cache)?),
        "openai" => Arc::new(openai::OpenAiTranslator::new(&settings, cache)?),
        "ollama" => Arc::new(ollama::OllamaTranslator::new(&settings, cache)?),
        "simple" => Arc::new(simple::SimpleTranslator::new()),
        "passthrough" => Arc::new(simple::PassthroughTranslator::new()),
        other => return Err(TranslationError::UnsupportedTranslator(other.to_string())),
    };

    Ok(provider)
}

/// Build the HTTP client an API provider keeps for its lifetime
pub(crate) fn build_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, TranslationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .pool_idle_timeout(std::time::Duration::from_secs(90))
        .build()
        .map_err(|e| TranslationError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Turn a non-success HTTP response into an API error carrying the body
pub(crate) async fn api_error(response: reqwest::Response) -> TranslationError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        body.chars().take(500).collect()
    };

    TranslationError::Api {
        status_code: Some(status.as_u16()),
        message,
    }
}
