/*!
 * Single-provider translation strategies: per-segment, block and structured
 */

use std::time::Duration;

use video2srt::app_config::{TranslationConfig, TranslationMode};
use video2srt::errors::TranslationError;
use video2srt::providers::mock::{MockBehavior, MockProvider, MockStructured};
use video2srt::translation::SegmentTranslator;
use video2srt::TimedSegment;

use crate::common::{init_logging, two_sentences};

fn per_segment() -> TranslationConfig {
    TranslationConfig {
        mode: TranslationMode::PerSegment,
        ..TranslationConfig::default()
    }
}

fn block(structured: bool, ai_timestamps: bool) -> TranslationConfig {
    TranslationConfig {
        mode: TranslationMode::Block,
        structured_prompt: structured,
        use_ai_timestamps: ai_timestamps,
        ..TranslationConfig::default()
    }
}

#[tokio::test]
async fn test_perSegment_withContextProvider_shouldTranslateEachNonBlankSegment() {
    let provider = MockProvider::working("mock").with_context();
    let segments = vec![
        TimedSegment::from_raw(0.0, 1.0, "Hello."),
        TimedSegment::from_raw(1.5, 2.0, "   "),
        TimedSegment::from_raw(2.5, 4.0, "Goodbye."),
    ];

    let result = SegmentTranslator::new(per_segment())
        .translate_segments(&provider, &segments, "fr", "en")
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(result.translator_name, "mock");
    assert_eq!(result.segments[0].text, "[fr] Hello.");
    assert_eq!(result.segments[1], segments[1]);
    assert_eq!(result.segments[2].text, "[fr] Goodbye.");
    assert_eq!(result.segments[2].start, 2.5);
    assert_eq!(result.segments[2].language.as_deref(), Some("fr"));
}

#[tokio::test]
async fn test_perSegment_withFailureAfterSuccess_shouldKeepOriginalText() {
    let provider = MockProvider::new("mock", MockBehavior::Intermittent { fail_every: 2 });
    let segments = vec![
        TimedSegment::from_raw(0.0, 1.0, "one"),
        TimedSegment::from_raw(1.0, 2.0, "two"),
        TimedSegment::from_raw(2.0, 3.0, "three"),
    ];

    let result = SegmentTranslator::new(per_segment())
        .translate_segments(&provider, &segments, "de", "en")
        .await
        .unwrap();

    let texts: Vec<&str> = result.segments.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["[de] one", "two", "[de] three"]);
}

#[tokio::test]
async fn test_perSegment_withFirstCallFailing_shouldFailAttempt() {
    let provider = MockProvider::fail_first("mock", 1);

    let result = SegmentTranslator::new(per_segment())
        .translate_segments(&provider, &two_sentences(), "de", "en")
        .await;

    assert!(matches!(result, Err(TranslationError::Network(_))));
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_perSegment_withEmptyAnswer_shouldKeepOriginalSegment() {
    let provider = MockProvider::new("mock", MockBehavior::Empty);
    let segments = two_sentences();

    let result = SegmentTranslator::new(per_segment())
        .translate_segments(&provider, &segments, "de", "en")
        .await
        .unwrap();

    assert_eq!(result.segments, segments);
}

#[tokio::test]
async fn test_block_withSingleSegment_shouldKeepTiming() {
    let provider = MockProvider::fixed("mock", "你好");
    let segments = vec![TimedSegment::from_raw(0.0, 2.0, "Hello")];

    let result = SegmentTranslator::new(block(false, false))
        .translate_segments(&provider, &segments, "zh", "en")
        .await
        .unwrap();

    assert_eq!(result.len(), 1);
    assert_eq!(result.segments[0].text, "你好");
    assert_eq!((result.segments[0].start, result.segments[0].end), (0.0, 2.0));
    assert_eq!(result.target_language, "zh");
}

#[tokio::test]
async fn test_block_withTwoSentences_shouldSplitProportionally() {
    let provider = MockProvider::fixed("mock", "你好世界。你好吗？");

    let result = SegmentTranslator::new(block(false, false))
        .translate_segments(&provider, &two_sentences(), "zh", "en")
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(result.segments[0].text, "你好世界。");
    assert_eq!(result.segments[1].text, "你好吗？");
    assert_eq!((result.segments[1].start, result.segments[1].end), (2.5, 4.0));
}

#[tokio::test]
async fn test_block_withBlankMember_shouldRestoreItAsIs() {
    let provider = MockProvider::working("mock");
    let segments = vec![
        TimedSegment::from_raw(0.0, 1.0, "Hello."),
        TimedSegment::from_raw(1.0, 1.5, ""),
        TimedSegment::from_raw(1.5, 3.0, "Bye."),
    ];

    let result = SegmentTranslator::new(block(false, false))
        .translate_segments(&provider, &segments, "es", "en")
        .await
        .unwrap();

    assert_eq!(result.len(), 3);
    assert_eq!(result.segments[1], segments[1]);
    assert!(result.segments[0].text.starts_with("[es]"));
    assert!(!result.segments[2].text.is_empty());
}

#[tokio::test]
async fn test_block_withSilenceGap_shouldCallOncePerBlock() {
    let provider = MockProvider::working("mock");
    let segments = vec![
        TimedSegment::from_raw(0.0, 1.0, "First part."),
        TimedSegment::from_raw(10.0, 11.0, "Second part."),
    ];

    let result = SegmentTranslator::new(block(false, false))
        .translate_segments(&provider, &segments, "it", "en")
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(result.segments[0].text, "[it] First part.");
    assert_eq!(result.segments[1].text, "[it] Second part.");
}

#[tokio::test]
async fn test_structured_withAiTimestamps_shouldClampProposedTiming() {
    let provider = MockProvider::working("mock").with_structured(MockStructured::Working { shift: 1.0 });

    let result = SegmentTranslator::new(block(true, true))
        .translate_segments(&provider, &two_sentences(), "fr", "en")
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 1);
    assert_eq!(result.segments[0].text, "[fr] Hello world.");
    assert_eq!((result.segments[0].start, result.segments[0].end), (1.0, 2.5));
    assert_eq!((result.segments[1].start, result.segments[1].end), (3.5, 5.0));
}

#[tokio::test]
async fn test_structured_withNegativeProposal_shouldNotStartBeforeZero() {
    let provider = MockProvider::working("mock").with_structured(MockStructured::Working { shift: -1.0 });

    let result = SegmentTranslator::new(block(true, true))
        .translate_segments(&provider, &two_sentences(), "fr", "en")
        .await
        .unwrap();

    assert_eq!((result.segments[0].start, result.segments[0].end), (0.0, 1.0));
    assert_eq!((result.segments[1].start, result.segments[1].end), (1.5, 3.0));
}

#[tokio::test]
async fn test_structured_withoutAiTimestamps_shouldKeepOriginalTiming() {
    let provider = MockProvider::working("mock").with_structured(MockStructured::Working { shift: 1.0 });
    let segments = two_sentences();

    let result = SegmentTranslator::new(block(true, false))
        .translate_segments(&provider, &segments, "fr", "en")
        .await
        .unwrap();

    assert_eq!(result.segments[1].text, "[fr] How are you?");
    assert_eq!((result.segments[1].start, result.segments[1].end), (2.5, 4.0));
}

#[tokio::test]
async fn test_structured_withMissingIds_shouldFallBackToPlainBlock() {
    init_logging();
    let provider = MockProvider::working("mock").with_structured(MockStructured::MissingIds);

    let result = SegmentTranslator::new(block(true, false))
        .translate_segments(&provider, &two_sentences(), "fr", "en")
        .await
        .unwrap();

    assert_eq!(provider.request_count(), 2);
    assert_eq!(result.len(), 2);
    assert!(result.segments[0].text.starts_with("[fr]"));
    assert!(result.segments.iter().all(|s| !s.text.is_empty()));
}

#[tokio::test]
async fn test_callTimeout_withSlowProvider_shouldBeNetworkError() {
    let provider = MockProvider::new("slow", MockBehavior::Slow { delay_ms: 500 });

    let result = SegmentTranslator::new(block(false, false))
        .with_call_timeout(Duration::from_millis(20))
        .translate_segments(&provider, &two_sentences(), "fr", "en")
        .await;

    assert!(matches!(result, Err(TranslationError::Network(_))));
}
