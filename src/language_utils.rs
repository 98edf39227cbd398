/*!
 * Language utilities for ISO language code handling.
 *
 * Subtitle pipelines pass around short codes such as `zh`, `zh-CN`, `fre`
 * or `auto`. This module validates them and turns them into readable names
 * for translation prompts.
 */

use anyhow::{Result, anyhow};
use isolang::Language;

/// ISO 639-2/B codes that differ from their 639-2/T form
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Code used when the source language is left to the provider
pub const AUTO_LANGUAGE: &str = "auto";

/// Strip a region or script subtag: `zh-CN` -> `zh`, `pt_BR` -> `pt`
pub fn base_language_code(code: &str) -> String {
    code.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let normalized_code = base_language_code(code);

    if normalized_code.len() == 2 {
        if let Some(lang) = Language::from_639_1(&normalized_code) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if normalized_code.len() == 3 {
        if Language::from_639_3(&normalized_code).is_some() {
            return Ok(normalized_code);
        }

        if let Some((_, part2t)) = PART2B_TO_PART2T
            .iter()
            .find(|(part2b, _)| *part2b == normalized_code)
        {
            return Ok((*part2t).to_string());
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Validate a language code; `auto` is accepted as a source language
pub fn validate_language_code(code: &str, allow_auto: bool) -> Result<()> {
    if allow_auto && code.trim().eq_ignore_ascii_case(AUTO_LANGUAGE) {
        return Ok(());
    }
    normalize_to_part2t(code).map(|_| ())
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// English name of a language for use in prompts.
///
/// Unknown codes are returned as given so a prompt never loses information.
pub fn language_display_name(code: &str) -> String {
    if code.trim().eq_ignore_ascii_case(AUTO_LANGUAGE) || code.trim().is_empty() {
        return "the source language".to_string();
    }

    normalize_to_part2t(code)
        .ok()
        .and_then(|part2t| Language::from_639_3(&part2t))
        .map(|lang| lang.to_name().to_string())
        .unwrap_or_else(|| code.trim().to_string())
}
