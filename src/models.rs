/*!
 * Value types exchanged with the transcription and subtitle collaborators.
 *
 * A `TimedSegment` comes from the speech-recognition step and is never mutated
 * by the translation core; translated output is always a new segment carrying
 * the original timing.
 */

use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;

/// One timed piece of recognised speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedSegment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Recognised (or translated) text
    pub text: String,

    /// Language code of `text`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Recogniser confidence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl TimedSegment {
    /// Create a validated segment.
    ///
    /// Fails when `start` is negative, `end < start`, or the text is blank.
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Result<Self, TranslationError> {
        let segment = Self::from_raw(start, end, text);
        segment.validate()?;
        Ok(segment)
    }

    /// Create a segment without validating it.
    ///
    /// Upstream records with blank text are tolerated in block mode, so the
    /// translation core must be able to carry them.
    pub fn from_raw(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            language: None,
            confidence: None,
        }
    }

    /// Check the segment invariants
    pub fn validate(&self) -> Result<(), TranslationError> {
        if !self.start.is_finite() || self.start < 0.0 {
            return Err(TranslationError::InvalidSegment(format!(
                "start time must be a non-negative number, got {}",
                self.start
            )));
        }
        if !self.end.is_finite() || self.end < self.start {
            return Err(TranslationError::InvalidSegment(format!(
                "end time {} is before start time {}",
                self.end, self.start
            )));
        }
        if self.is_blank() {
            return Err(TranslationError::InvalidSegment(
                "segment text must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Set the language code
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Set the recogniser confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// A new segment with the same timing and confidence but different text
    pub fn translated(&self, text: impl Into<String>, language: &str) -> Self {
        Self {
            start: self.start,
            end: self.end,
            text: text.into(),
            language: Some(language.to_string()),
            confidence: self.confidence,
        }
    }

    /// A new segment with different text and timing
    pub fn retimed(&self, start: f64, end: f64, text: impl Into<String>, language: &str) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            language: Some(language.to_string()),
            confidence: self.confidence,
        }
    }
}

/// Output of one orchestrated translation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// Translated segments, in input order
    pub segments: Vec<TimedSegment>,

    /// Source language code ("auto" when detected by the provider)
    pub source_language: String,

    /// Target language code
    pub target_language: String,

    /// Name of the provider that produced the segments
    pub translator_name: String,
}

impl TranslationResult {
    /// Result for an empty input, produced without calling any provider
    pub fn empty(source_language: &str, target_language: &str) -> Self {
        Self {
            segments: Vec::new(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            translator_name: "none".to_string(),
        }
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the result holds no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segment texts joined by newlines
    pub fn full_text(&self) -> String {
        self.segments
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
