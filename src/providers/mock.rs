/*!
 * Mock provider implementations for testing.
 *
 * This module provides a scriptable provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with `[target] text`
 * - `MockProvider::fixed()` - Always answers the same string
 * - `MockProvider::failing_network()` - Always fails with a retryable error
 * - `MockProvider::fail_first()` - Fails a number of calls, then works
 */

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::TranslationError;
use crate::providers::{BlockItem, StructuredTranslation, TranslationProvider};

/// Behavior mode for the mock provider
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with `[target] text`
    Working,
    /// Always answers this text
    Fixed(String),
    /// Always fails with a network error
    FailingNetwork,
    /// Always fails with an API error
    FailingApi,
    /// Always fails with a non-retryable malformed-response error
    Malformed,
    /// Fails every Nth request
    Intermittent { fail_every: usize },
    /// Fails the first N requests, then works
    FailFirst { count: usize },
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
    /// Returns empty response
    Empty,
}

/// Structured translation behavior
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockStructured {
    /// Not supported
    Off,
    /// Translate every item, keeping its timing shifted by `shift` seconds
    Working { shift: f64 },
    /// Drop the last item from the answer
    MissingIds,
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Registry name
    name: String,
    /// Behavior mode
    behavior: MockBehavior,
    /// Structured translation mode
    structured: MockStructured,
    /// Whether context-aware translation is advertised
    context: bool,
    /// Request counter shared with tests
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&str, &str) -> String>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            structured: MockStructured::Off,
            context: false,
            request_count: Arc::new(AtomicUsize::new(0)),
            custom_response: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working(name: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Working)
    }

    /// Create a mock that always answers `text`
    pub fn fixed(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::Fixed(text.into()))
    }

    /// Create a mock that always fails with a network error
    pub fn failing_network(name: impl Into<String>) -> Self {
        Self::new(name, MockBehavior::FailingNetwork)
    }

    /// Create a mock that fails `count` times before working
    pub fn fail_first(name: impl Into<String>, count: usize) -> Self {
        Self::new(name, MockBehavior::FailFirst { count })
    }

    /// Enable structured block translation
    pub fn with_structured(mut self, structured: MockStructured) -> Self {
        self.structured = structured;
        self
    }

    /// Advertise context-aware translation
    pub fn with_context(mut self) -> Self {
        self.context = true;
        self
    }

    /// Set a custom response generator taking `(text, target_language)`
    pub fn with_custom_response(mut self, generator: fn(&str, &str) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Handle on the request counter, valid after the provider is moved
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }

    /// Number of requests served so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn respond(&self, text: &str, target_language: &str) -> String {
        if let Some(generator) = self.custom_response {
            return generator(text, target_language);
        }
        match &self.behavior {
            MockBehavior::Fixed(answer) => answer.clone(),
            MockBehavior::Empty => String::new(),
            _ => format!("[{}] {}", target_language, text.trim()),
        }
    }

    /// Count the request and apply the failure behavior
    async fn simulate(&self) -> Result<(), TranslationError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst) + 1;

        match &self.behavior {
            MockBehavior::FailingNetwork => Err(TranslationError::Network("simulated connection reset".to_string())),
            MockBehavior::FailingApi => Err(TranslationError::Api {
                status_code: Some(503),
                message: "simulated service unavailable".to_string(),
            }),
            MockBehavior::Malformed => Err(TranslationError::MalformedResponse("simulated garbage".to_string())),
            MockBehavior::Intermittent { fail_every } if *fail_every > 0 && count % fail_every == 0 => {
                Err(TranslationError::Network(format!("simulated failure on request {}", count)))
            }
            MockBehavior::FailFirst { count: failures } if count <= *failures => {
                Err(TranslationError::Network(format!("simulated failure on request {}", count)))
            }
            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }
        self.simulate().await?;
        Ok(self.respond(text, target_language))
    }

    fn supports_context(&self) -> bool {
        self.context
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
        self.simulate().await?;
        let answer = self.respond(current_text, target_language);
        if context_text.contains("[CURRENT]") {
            Ok(answer)
        } else {
            Err(TranslationError::MalformedResponse("context has no [CURRENT] line".to_string()))
        }
    }

    fn supports_structured(&self) -> bool {
        self.structured != MockStructured::Off
    }

    async fn translate_block_with_structure(
        &self,
        items: &[BlockItem],
        target_language: &str,
    ) -> Result<BTreeMap<usize, StructuredTranslation>, TranslationError> {
        let shift = match self.structured {
            MockStructured::Off => {
                return Err(TranslationError::unsupported(&self.name, "structured block translation"));
            }
            MockStructured::Working { shift } => shift,
            MockStructured::MissingIds => 0.0,
        };

        self.simulate().await?;

        let mut translations: BTreeMap<usize, StructuredTranslation> = items
            .iter()
            .map(|item| {
                (
                    item.id,
                    StructuredTranslation {
                        start: item.start + shift,
                        end: item.end + shift,
                        text_translated: self.respond(&item.text, target_language),
                    },
                )
            })
            .collect();

        if self.structured == MockStructured::MissingIds {
            translations.pop_last();
        }
        Ok(translations)
    }
}
