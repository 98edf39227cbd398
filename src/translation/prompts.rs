/*!
 * Prompts for LLM-backed providers.
 *
 * Builds the plain, context-aware and structured (JSON) prompts, and turns
 * model answers back into clean subtitle text.
 */

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::errors::TranslationError;
use crate::language_utils::language_display_name;
use crate::providers::{BlockItem, StructuredTranslation, check_structured_ids};

/// Prefixes models like to put in front of the answer
static ANSWER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:translation|translated|translated text|翻译结果|翻译|译文)\s*[:：]\s*")
        .expect("Invalid answer prefix regex")
});

/// Markdown code fence around a JSON answer
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[a-zA-Z]*\s*(.*?)\s*```$").expect("Invalid code fence regex")
});

/// System message shared by all prompts
pub fn system_prompt(target_language: &str) -> String {
    format!(
        "You are a professional subtitle translator. You translate video subtitles into {}.",
        language_display_name(target_language)
    )
}

/// Prompt for a single piece of text
pub fn translation_prompt(text: &str, target_language: &str) -> String {
    format!(
        "Translate the following subtitle text into {}. \
         Keep it concise and suitable for on-screen display. \
         Output ONLY the translated text without any explanations.\n\n{}",
        language_display_name(target_language),
        text
    )
}

/// Prompt asking for the `[CURRENT]` line of a context window
pub fn context_prompt(context_text: &str, target_language: &str) -> String {
    format!(
        "Translate subtitles into {}. The context below (with timestamps) is for reference only.\n\n\
         Context:\n{}\n\n\
         Translate ONLY the line marked [CURRENT]. Requirements:\n\
         1. Keep the subtitle concise for on-screen display\n\
         2. Keep the tone and style of the original\n\
         3. Return only the translation, no explanations\n\
         4. Use natural phrasing in the target language\n\n\
         Translation:",
        language_display_name(target_language),
        context_text
    )
}

/// Prompt for structured block translation
pub fn structured_prompt(items: &[BlockItem], target_language: &str) -> Result<String, TranslationError> {
    let payload = serde_json::to_string_pretty(items)?;
    Ok(format!(
        "Translate the subtitle segments below into {}. They are consecutive lines of one \
         passage; translate them as a whole so the result reads naturally.\n\
         You may move text between neighbouring segments and adjust \"start\"/\"end\" \
         slightly to match sentence boundaries, but never reorder segments.\n\
         Answer with a JSON array only, one object per input segment, keeping every \"id\":\n\
         [{{\"id\": 0, \"start\": 0.0, \"end\": 1.0, \"text_translated\": \"...\"}}]\n\n\
         Segments:\n{}",
        language_display_name(target_language),
        payload
    ))
}

/// Strip answer prefixes, quotes and surrounding whitespace
pub fn clean_translation(raw: &str) -> String {
    let mut text = raw.trim();
    if let Some(found) = ANSWER_PREFIX.find(text) {
        text = text[found.end()..].trim();
    }

    let quoted = text.chars().count() >= 2
        && ((text.starts_with('"') && text.ends_with('"'))
            || (text.starts_with('“') && text.ends_with('”')));
    if quoted {
        let mut chars = text.chars();
        chars.next();
        chars.next_back();
        text = chars.as_str().trim();
    }

    text.to_string()
}

#[derive(Debug, Deserialize)]
struct RawStructuredItem {
    id: usize,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
    #[serde(alias = "text", alias = "translation")]
    text_translated: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawStructuredAnswer {
    List(Vec<RawStructuredItem>),
    Wrapped { segments: Vec<RawStructuredItem> },
}

/// Parse a structured answer and check it covers exactly the requested ids.
///
/// Missing timestamps fall back to the request's timing.
pub fn parse_structured_response(
    raw: &str,
    items: &[BlockItem],
) -> Result<BTreeMap<usize, StructuredTranslation>, TranslationError> {
    let mut body = raw.trim();
    if let Some(captures) = CODE_FENCE.captures(body) {
        if let Some(inner) = captures.get(1) {
            body = inner.as_str();
        }
    }

    let answer: RawStructuredAnswer = match serde_json::from_str(body) {
        Ok(answer) => answer,
        Err(_) => {
            // Models sometimes wrap the array in prose
            let start = body.find('[');
            let end = body.rfind(']');
            match (start, end) {
                (Some(start), Some(end)) if start < end => serde_json::from_str(&body[start..=end])?,
                _ => {
                    return Err(TranslationError::MalformedResponse(
                        "structured answer contains no JSON array".to_string(),
                    ));
                }
            }
        }
    };

    let entries = match answer {
        RawStructuredAnswer::List(entries) => entries,
        RawStructuredAnswer::Wrapped { segments } => segments,
    };

    let requested: BTreeMap<usize, &BlockItem> = items.iter().map(|item| (item.id, item)).collect();
    let mut translations = BTreeMap::new();
    for entry in entries {
        let (default_start, default_end) = requested
            .get(&entry.id)
            .map(|item| (item.start, item.end))
            .unwrap_or((0.0, 0.0));

        if translations.contains_key(&entry.id) {
            return Err(TranslationError::MalformedResponse(format!(
                "duplicate id {} in structured answer",
                entry.id
            )));
        }

        translations.insert(
            entry.id,
            StructuredTranslation {
                start: entry.start.unwrap_or(default_start),
                end: entry.end.unwrap_or(default_end),
                text_translated: entry.text_translated.trim().to_string(),
            },
        );
    }

    check_structured_ids(items, &translations)?;
    Ok(translations)
}
