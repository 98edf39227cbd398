/*!
 * # video2srt - translation core
 *
 * A Rust library that translates timed speech segments (as produced by a
 * speech recognizer) into a target language, keeping their timing so the
 * result can be written as subtitles.
 *
 * ## Features
 *
 * - Pluggable translation providers:
 *   - Google web translation endpoint
 *   - OpenAI-compatible chat completion APIs
 *   - Ollama (local LLM)
 *   - Offline `simple` and `passthrough` translators
 * - Block translation: adjacent segments are merged, translated in one call
 *   and split back proportionally onto the original timing
 * - Context-aware per-segment translation for providers that support it
 * - Structured (JSON) block translation with optional model-proposed timing
 * - Retry with exponential backoff, circuit breaker and fallback across
 *   providers
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `models`: Timed segments and translation results
 * - `providers`: The provider trait and its implementations
 * - `translation`: Single-provider translation strategies:
 *   - `translation::blocking`: Grouping of segments into blocks
 *   - `translation::splitting`: Proportional re-splitting of block translations
 *   - `translation::engine`: Per-segment and block translation
 * - `manager`: Health tracking, retry and fallback across providers
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod errors;
pub mod language_utils;
pub mod manager;
pub mod models;
pub mod providers;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, TranslationMode};
pub use errors::{ManagerError, TranslationError};
pub use language_utils::{language_codes_match, language_display_name, normalize_to_part2t};
pub use manager::{TranslatorManager, TranslatorStats, TranslatorStatus};
pub use models::{TimedSegment, TranslationResult};
pub use providers::{TranslationProvider, create_provider};
pub use translation::{SegmentTranslator, split_translated_text_by_ratio};
