use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use log::debug;

use crate::app_config::TranslatorConfig;
use crate::errors::TranslationError;
use crate::providers::{
    BlockItem, StructuredTranslation, TranslationProvider, answer_or_source, api_error, build_http_client,
};
use crate::translation::cache::TranslationCache;
use crate::translation::prompts;

/// Default API root
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// OpenAI chat-completions client
#[derive(Debug)]
pub struct OpenAiTranslator {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API root, e.g. `https://api.openai.com/v1`
    base_url: String,
    /// Model name
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Completion token limit
    max_tokens: u32,
    /// Response cache for context-free requests
    cache: TranslationCache,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

/// Chat message object
#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    role: String,
    /// Content of the message
    #[serde(default)]
    content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl OpenAiTranslator {
    /// Create a new client; an API key is required
    pub fn new(settings: &TranslatorConfig, cache: TranslationCache) -> Result<Self, TranslationError> {
        if settings.api_key.trim().is_empty() {
            return Err(TranslationError::Config("openai requires an api_key".to_string()));
        }

        let base_url = if settings.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            settings.base_url.trim_end_matches('/').to_string()
        };
        let model = if settings.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            settings.model.clone()
        };

        Ok(Self {
            client: build_http_client(settings.timeout_duration())?,
            api_key: settings.api_key.clone(),
            base_url,
            model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            cache,
        })
    }

    /// Send one system + user exchange and return the raw answer
    async fn complete(&self, system: String, prompt: String) -> Result<String, TranslationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system },
                ChatMessage { role: "user".to_string(), content: prompt },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let body: ChatResponse = response.json().await?;
        let answer = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(answer)
    }
}

#[async_trait]
impl TranslationProvider for OpenAiTranslator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, target_language) {
            return Ok(cached);
        }

        let answer = self
            .complete(
                prompts::system_prompt(target_language),
                prompts::translation_prompt(text, target_language),
            )
            .await?;
        let translated = answer_or_source(self.name(), prompts::clean_translation(&answer), text);
        if translated != text {
            self.cache.store(text, target_language, &translated);
        }
        Ok(translated)
    }

    fn supports_context(&self) -> bool {
        true
    }

    async fn translate_with_context(
        &self,
        context_text: &str,
        current_text: &str,
        target_language: &str,
        start_time: f64,
        end_time: f64,
    ) -> Result<String, TranslationError> {
        if current_text.trim().is_empty() {
            return Ok(current_text.to_string());
        }

        debug!("openai context translation for {:.2}-{:.2}", start_time, end_time);
        let answer = self
            .complete(
                prompts::system_prompt(target_language),
                prompts::context_prompt(context_text, target_language),
            )
            .await?;
        Ok(answer_or_source(self.name(), prompts::clean_translation(&answer), current_text))
    }

    fn supports_structured(&self) -> bool {
        true
    }

    async fn translate_block_with_structure(
        &self,
        items: &[BlockItem],
        target_language: &str,
    ) -> Result<BTreeMap<usize, StructuredTranslation>, TranslationError> {
        if items.is_empty() {
            return Ok(BTreeMap::new());
        }

        let answer = self
            .complete(
                prompts::system_prompt(target_language),
                prompts::structured_prompt(items, target_language)?,
            )
            .await?;
        prompts::parse_structured_response(&answer, items)
    }
}
