/*!
 * Offline providers.
 *
 * `SimpleTranslator` tags text with the target language so a pipeline can be
 * exercised without any service; `PassthroughTranslator` returns its input.
 */

use async_trait::async_trait;

use crate::errors::TranslationError;
use crate::language_utils::base_language_code;
use crate::providers::TranslationProvider;

/// Placeholder provider producing `[ZH] text`
#[derive(Debug, Default)]
pub struct SimpleTranslator;

impl SimpleTranslator {
    pub fn new() -> Self {
        Self
    }

    fn tag(target_language: &str) -> String {
        format!("[{}]", base_language_code(target_language).to_uppercase())
    }
}

#[async_trait]
impl TranslationProvider for SimpleTranslator {
    fn name(&self) -> &str {
        "simple"
    }

    async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let tag = Self::tag(target_language);
        let trimmed = text.trim();
        // Already tagged text is left alone so repeated runs are stable
        if trimmed.starts_with(&tag) {
            return Ok(trimmed.to_string());
        }
        Ok(format!("{} {}", tag, trimmed))
    }
}

/// No-op provider
#[derive(Debug, Default)]
pub struct PassthroughTranslator;

impl PassthroughTranslator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TranslationProvider for PassthroughTranslator {
    fn name(&self) -> &str {
        "passthrough"
    }

    async fn translate_text(&self, text: &str, _target_language: &str) -> Result<String, TranslationError> {
        Ok(text.to_string())
    }
}
