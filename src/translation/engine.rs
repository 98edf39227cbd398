/*!
 * Translation of a segment list with a single provider.
 *
 * Two strategies are supported:
 * - per-segment: one call per segment, optionally with a context window
 * - block: segments are merged into blocks, translated in one call each and
 *   split back onto the original timing (or translated as structured JSON when
 *   the provider supports it)
 *
 * The first failing call fails the whole attempt so the orchestrator can retry
 * or fall back. After one call has succeeded, a later failure only keeps the
 * original text of the affected segment or block.
 */

use std::future::Future;
use std::time::Duration;
use log::{debug, warn};

use crate::app_config::{TranslationConfig, TranslationMode};
use crate::errors::TranslationError;
use crate::models::{TimedSegment, TranslationResult};
use crate::providers::{BlockItem, StructuredTranslation, TranslationProvider};
use crate::translation::blocking::{Block, BlockOptions, build_blocks};
use crate::translation::context::build_context_text;
use crate::translation::splitting::split_translated_text_by_ratio;

/// Drives one provider over a list of segments
#[derive(Debug, Clone)]
pub struct SegmentTranslator {
    /// Strategy settings
    options: TranslationConfig,

    /// Upper bound for each provider call
    call_timeout: Option<Duration>,
}

/// Bookkeeping for the "fail until the first success" rule
struct Progress {
    any_success: bool,
}

impl Progress {
    /// Decide what a failed call means for the attempt
    fn on_failure(&self, provider: &str, error: TranslationError) -> Result<(), TranslationError> {
        if self.any_success {
            warn!("{}: keeping original text after failure: {}", provider, error);
            Ok(())
        } else {
            Err(error)
        }
    }
}

impl SegmentTranslator {
    /// Create a translator for the given strategy settings
    pub fn new(options: TranslationConfig) -> Self {
        Self {
            options,
            call_timeout: None,
        }
    }

    /// Bound every provider call by `timeout`
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Strategy settings in use
    pub fn options(&self) -> &TranslationConfig {
        &self.options
    }

    /// Translate `segments` into `target_language` with `provider`
    pub async fn translate_segments(
        &self,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        target_language: &str,
        source_language: &str,
    ) -> Result<TranslationResult, TranslationError> {
        let translated = match self.options.mode {
            TranslationMode::PerSegment => self.translate_per_segment(provider, segments, target_language).await?,
            TranslationMode::Block => self.translate_blocks(provider, segments, target_language).await?,
        };

        Ok(TranslationResult {
            segments: translated,
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            translator_name: provider.name().to_string(),
        })
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, TranslationError>>,
    ) -> Result<T, TranslationError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                TranslationError::Network(format!("request timed out after {:.1}s", limit.as_secs_f64()))
            })?,
            None => call.await,
        }
    }

    async fn translate_per_segment(
        &self,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        target_language: &str,
    ) -> Result<Vec<TimedSegment>, TranslationError> {
        let use_context = self.options.context_enabled && provider.supports_context();
        let mut progress = Progress { any_success: false };
        let mut output = Vec::with_capacity(segments.len());

        for (index, segment) in segments.iter().enumerate() {
            if segment.is_blank() {
                output.push(segment.clone());
                continue;
            }

            let call = async {
                if use_context {
                    let context = build_context_text(segments, index, self.options.context_window);
                    provider
                        .translate_with_context(&context, &segment.text, target_language, segment.start, segment.end)
                        .await
                } else {
                    provider.translate_text(&segment.text, target_language).await
                }
            };

            match self.bounded(call).await {
                Ok(text) if text.trim().is_empty() => {
                    progress.any_success = true;
                    warn!("{}: empty translation, keeping original text", provider.name());
                    output.push(segment.clone());
                }
                Ok(text) => {
                    progress.any_success = true;
                    output.push(segment.translated(text.trim(), target_language));
                }
                Err(e) => {
                    progress.on_failure(provider.name(), e)?;
                    output.push(segment.clone());
                }
            }
        }

        Ok(output)
    }

    async fn translate_blocks(
        &self,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        target_language: &str,
    ) -> Result<Vec<TimedSegment>, TranslationError> {
        let blocks = build_blocks(segments, &BlockOptions::from(&self.options));
        let use_structured = self.options.structured_prompt && provider.supports_structured();
        let mut progress = Progress { any_success: false };
        let mut output: Vec<TimedSegment> = Vec::with_capacity(segments.len());

        debug!("{} segments grouped into {} blocks", segments.len(), blocks.len());

        for block in &blocks {
            let members: Vec<usize> = block
                .segment_indices
                .iter()
                .copied()
                .filter(|&index| !segments[index].is_blank())
                .collect();

            if members.is_empty() {
                output.extend(block.segment_indices.iter().map(|&index| segments[index].clone()));
                continue;
            }

            let structured = if use_structured {
                self.structured_block(provider, segments, &members, target_language).await
            } else {
                None
            };

            let translated = match structured {
                Some(Ok(translations)) => Ok(translations),
                Some(Err(e)) => Err(e),
                None => self
                    .plain_block(provider, segments, block, &members, target_language)
                    .await
                    .map(|texts| {
                        members
                            .iter()
                            .zip(texts)
                            .map(|(&index, text)| {
                                let segment = &segments[index];
                                (index, StructuredTranslation {
                                    start: segment.start,
                                    end: segment.end,
                                    text_translated: text,
                                })
                            })
                            .collect::<Vec<_>>()
                    }),
            };

            match translated {
                Ok(translations) => {
                    progress.any_success = true;
                    self.emit_block(segments, block, translations, target_language, &mut output);
                }
                Err(e) => {
                    progress.on_failure(provider.name(), e)?;
                    output.extend(block.segment_indices.iter().map(|&index| segments[index].clone()));
                }
            }
        }

        Ok(output)
    }

    /// Structured translation of one block.
    ///
    /// Returns `None` when the answer was unusable and the plain path should be used.
    async fn structured_block(
        &self,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        members: &[usize],
        target_language: &str,
    ) -> Option<Result<Vec<(usize, StructuredTranslation)>, TranslationError>> {
        let items: Vec<BlockItem> = members
            .iter()
            .map(|&index| {
                let segment = &segments[index];
                BlockItem {
                    id: index,
                    start: segment.start,
                    end: segment.end,
                    text: segment.text.trim().to_string(),
                }
            })
            .collect();

        match self.bounded(provider.translate_block_with_structure(&items, target_language)).await {
            Ok(mut translations) => {
                let ordered = members
                    .iter()
                    .filter_map(|index| translations.remove(index).map(|t| (*index, t)))
                    .collect::<Vec<_>>();
                if ordered.len() == members.len() {
                    Some(Ok(ordered))
                } else {
                    warn!("{}: structured answer does not cover the block, using plain translation", provider.name());
                    None
                }
            }
            Err(e @ (TranslationError::MalformedResponse(_) | TranslationError::Unsupported { .. })) => {
                warn!("{}: structured translation unusable ({}), using plain translation", provider.name(), e);
                None
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// Translate the merged block text and split it back onto `members`
    async fn plain_block(
        &self,
        provider: &dyn TranslationProvider,
        segments: &[TimedSegment],
        block: &Block,
        members: &[usize],
        target_language: &str,
    ) -> Result<Vec<String>, TranslationError> {
        let translated = self.bounded(provider.translate_text(&block.text, target_language)).await?;
        let originals: Vec<&str> = members.iter().map(|&index| segments[index].text.as_str()).collect();
        Ok(split_translated_text_by_ratio(&translated, &originals))
    }

    /// Append the translated block to `output`, restoring blank members as-is
    fn emit_block(
        &self,
        segments: &[TimedSegment],
        block: &Block,
        mut translations: Vec<(usize, StructuredTranslation)>,
        target_language: &str,
        output: &mut Vec<TimedSegment>,
    ) {
        translations.reverse();

        for &index in &block.segment_indices {
            let segment = &segments[index];
            if segment.is_blank() {
                output.push(segment.clone());
                continue;
            }

            let Some((_, translation)) = translations.pop() else {
                output.push(segment.clone());
                continue;
            };

            let text = translation.text_translated.trim();
            if text.is_empty() {
                output.push(segment.clone());
                continue;
            }

            if self.options.use_ai_timestamps {
                let previous_end = output.last().map(|prev| prev.end).unwrap_or(0.0);
                let next_start = segments.get(index + 1).map(|next| next.start);
                let (start, end) = clamp_timing(segment, &translation, previous_end, next_start);
                output.push(segment.retimed(start, end, text, target_language));
            } else {
                output.push(segment.translated(text, target_language));
            }
        }
    }
}

/// Keep provider-proposed timing inside `[previous_end, next_start]` with `end >= start`.
///
/// Non-finite proposals fall back to the original timing.
pub fn clamp_timing(
    original: &TimedSegment,
    proposed: &StructuredTranslation,
    previous_end: f64,
    next_start: Option<f64>,
) -> (f64, f64) {
    if !proposed.start.is_finite() || !proposed.end.is_finite() {
        return (original.start, original.end);
    }

    let lower = previous_end.max(0.0);
    let upper = next_start.unwrap_or(f64::INFINITY).max(lower);

    let start = proposed.start.max(lower).min(upper);
    let end = proposed.end.max(start).min(upper);
    (start, end)
}
