use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;
use log::{debug, error};

use crate::app_config::TranslatorConfig;
use crate::errors::TranslationError;
use crate::providers::{
    BlockItem, StructuredTranslation, TranslationProvider, answer_or_source, api_error, build_http_client,
};
use crate::translation::cache::TranslationCache;
use crate::translation::prompts;

/// Default Ollama server
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Default local model
const DEFAULT_MODEL: &str = "llama3";

/// Ollama client for local LLM translation
#[derive(Debug)]
pub struct OllamaTranslator {
    /// Base URL of the Ollama API
    base_url: String,
    /// HTTP client for making requests
    client: Client,
    /// Model name to use for generation
    model: String,
    /// Sampling temperature
    temperature: f32,
    /// Maximum number of tokens to generate
    max_tokens: u32,
    /// Response cache for context-free requests
    cache: TranslationCache,
}

/// Generate request for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationRequest {
    /// Model name to use for generation
    model: String,
    /// Prompt to generate from
    prompt: String,
    /// System message to guide the model
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    /// Additional model parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerationOptions>,
    /// Whether to stream the response
    stream: bool,
}

/// Generation options for the Ollama API
#[derive(Debug, Serialize)]
pub struct GenerationOptions {
    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Generation response from the Ollama API
#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    /// Generated text
    pub response: String,
    /// Whether the generation is complete
    #[serde(default)]
    pub done: bool,
}

impl GenerationRequest {
    /// Create a new non-streaming generation request
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            system: None,
            options: None,
            stream: false,
        }
    }

    /// Set the system prompt
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set temperature and token limit
    pub fn sampling(mut self, temperature: f32, num_predict: u32) -> Self {
        self.options = Some(GenerationOptions {
            temperature: Some(temperature),
            num_predict: Some(num_predict),
        });
        self
    }
}

/// Parse and normalise an Ollama endpoint; empty means the default server
pub fn parse_endpoint(endpoint: &str) -> Result<String, TranslationError> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Ok(DEFAULT_ENDPOINT.to_string());
    }

    let url = Url::parse(endpoint)
        .map_err(|e| TranslationError::Config(format!("Invalid ollama endpoint '{}': {}", endpoint, e)))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(TranslationError::Config(format!(
            "Invalid ollama endpoint '{}': expected an http(s) URL",
            endpoint
        )));
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

impl OllamaTranslator {
    /// Create a new Ollama client from provider settings
    pub fn new(settings: &TranslatorConfig, cache: TranslationCache) -> Result<Self, TranslationError> {
        let model = if settings.model.trim().is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            settings.model.clone()
        };

        Ok(Self {
            base_url: parse_endpoint(&settings.endpoint)?,
            client: build_http_client(settings.timeout_duration())?,
            model,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            cache,
        })
    }

    /// Generate text from the Ollama API
    async fn generate(&self, system: String, prompt: String) -> Result<String, TranslationError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerationRequest::new(&self.model, prompt)
            .system(system)
            .sampling(self.temperature, self.max_tokens);

        let response = self.client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let response_text = response.text().await?;
        let generated: GenerationResponse = serde_json::from_str(&response_text).map_err(|e| {
            error!(
                "Failed to parse Ollama API response: {}. Raw response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            );
            TranslationError::unusable_payload(e)
        })?;

        if !generated.done {
            debug!("Ollama returned an unfinished generation");
        }
        Ok(generated.response)
    }
}

#[async_trait]
impl TranslationProvider for OllamaTranslator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        if let Some(cached) = self.cache.get(text, target_language) {
            return Ok(cached);
        }

        let answer = self
            .generate(
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
        _start_time: f64,
        _end_time: f64,
    ) -> Result<String, TranslationError> {
        if current_text.trim().is_empty() {
            return Ok(current_text.to_string());
        }

        let answer = self
            .generate(
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
            .generate(
                prompts::system_prompt(target_language),
                prompts::structured_prompt(items, target_language)?,
            )
            .await?;
        prompts::parse_structured_response(&answer, items)
    }
}
