/*!
 * Grouping of timed segments into translation blocks.
 *
 * Consecutive segments are merged until a character limit or a silence gap
 * is reached, so one provider call sees a whole passage instead of a single
 * subtitle line. Blank segments stay in their block but contribute no text.
 */

use crate::app_config::TranslationConfig;
use crate::models::TimedSegment;

/// Strong sentence-terminal punctuation
pub const SENTENCE_TERMINALS: &[char] = &['.', '!', '?', ';', '。', '！', '？', '；', '…'];

/// Whether `c` ends a sentence
pub fn is_sentence_terminal(c: char) -> bool {
    SENTENCE_TERMINALS.contains(&c)
}

/// A run of consecutive segments translated in one call
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Indices into the caller's segment list, ascending
    pub segment_indices: Vec<usize>,

    /// Trimmed texts of the non-blank members joined by a space
    pub text: String,
}

impl Block {
    fn new() -> Self {
        Self {
            segment_indices: Vec::new(),
            text: String::new(),
        }
    }

    /// Number of characters in the merged text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    fn push(&mut self, index: usize, text: &str) {
        self.segment_indices.push(index);
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }
}

/// Thresholds for `build_blocks`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOptions {
    /// Maximum characters of merged text per block
    pub max_block_chars: usize,

    /// Largest silence, in seconds, allowed inside a block
    pub max_gap_seconds: f64,

    /// Close a block after sentence-terminal punctuation
    pub prefer_sentence_boundaries: bool,
}

impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            max_block_chars: 600,
            max_gap_seconds: 3.0,
            prefer_sentence_boundaries: false,
        }
    }
}

impl From<&TranslationConfig> for BlockOptions {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            max_block_chars: config.max_block_chars.max(1),
            max_gap_seconds: config.max_gap_seconds,
            prefer_sentence_boundaries: config.sentence_boundaries,
        }
    }
}

/// Group segments into blocks covering every index exactly once, in order
pub fn build_blocks(segments: &[TimedSegment], options: &BlockOptions) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Block::new();
    let mut previous: Option<&TimedSegment> = None;

    for (index, segment) in segments.iter().enumerate() {
        let text = segment.text.trim();

        if let Some(prev) = previous {
            if !current.segment_indices.is_empty() && should_split(&current, prev, segment, text, options) {
                blocks.push(std::mem::replace(&mut current, Block::new()));
            }
        }

        current.push(index, text);
        previous = Some(segment);
    }

    if !current.segment_indices.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn should_split(
    current: &Block,
    prev: &TimedSegment,
    next: &TimedSegment,
    next_text: &str,
    options: &BlockOptions,
) -> bool {
    if next.start - prev.end > options.max_gap_seconds {
        return true;
    }

    let current_chars = current.char_count();
    if !next_text.is_empty() && current_chars > 0 {
        let merged = current_chars + 1 + next_text.chars().count();
        if merged > options.max_block_chars {
            return true;
        }
    }

    options.prefer_sentence_boundaries
        && prev.text.trim_end().chars().last().is_some_and(is_sentence_terminal)
}
