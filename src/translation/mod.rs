/*!
 * Segment translation for subtitle pipelines.
 *
 * This module turns a list of timed segments into translated segments using
 * one provider. It is split into several submodules:
 *
 * - `blocking`: Grouping of segments into translation blocks
 * - `splitting`: Proportional re-splitting of a translated block
 * - `context`: Timestamped context windows for context-aware translation
 * - `prompts`: Prompt templates and answer parsing for LLM providers
 * - `cache`: Caching mechanisms for translations
 * - `engine`: Per-segment and block translation strategies
 */

// Re-export main types for easier usage
pub use self::blocking::{Block, BlockOptions, build_blocks};
pub use self::cache::TranslationCache;
pub use self::engine::SegmentTranslator;
pub use self::splitting::split_translated_text_by_ratio;

// Submodules
pub mod blocking;
pub mod cache;
pub mod context;
pub mod engine;
pub mod prompts;
pub mod splitting;
