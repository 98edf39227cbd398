/*!
 * Tests for error classification
 */

use std::error::Error;

use video2srt::errors::{ManagerError, TranslationError};

#[test]
fn test_isRetryable_shouldOnlyAcceptTransientErrors() {
    assert!(TranslationError::Network("reset".into()).is_retryable());
    assert!(TranslationError::api("overloaded").is_retryable());

    assert!(!TranslationError::MalformedResponse("not json".into()).is_retryable());
    assert!(!TranslationError::Config("missing key".into()).is_retryable());
    assert!(!TranslationError::UnsupportedTranslator("babelfish".into()).is_retryable());
    assert!(!TranslationError::unsupported("google", "context").is_retryable());
}

#[test]
fn test_display_withStatusCode_shouldIncludeIt() {
    let error = TranslationError::Api {
        status_code: Some(503),
        message: "service unavailable".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 503 - service unavailable");
    assert_eq!(
        TranslationError::api("quota exceeded").to_string(),
        "API responded with error: quota exceeded"
    );
}

#[test]
fn test_fromSerdeError_shouldBeMalformedResponse() {
    let parse_error = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    assert!(matches!(
        TranslationError::from(parse_error),
        TranslationError::MalformedResponse(_)
    ));
}

#[test]
fn test_unusablePayload_shouldBeRetryableApiError() {
    let error = TranslationError::unusable_payload("missing translation array");
    assert!(matches!(error, TranslationError::Api { status_code: None, .. }));
    assert!(error.is_retryable());
    assert_eq!(
        error.to_string(),
        "API responded with error: unusable response payload: missing translation array"
    );
}

#[test]
fn test_allTranslatorsFailed_shouldExposeLastErrorAsSource() {
    let error = ManagerError::AllTranslatorsFailed {
        last_error: TranslationError::Network("timed out".into()),
    };

    assert!(error.to_string().contains("timed out"));
    let source = error.source().map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("Network error: timed out"));
    assert!(ManagerError::NoEligibleTranslator.source().is_none());
}
