/*!
 * Tests for the provider factory and offline providers
 */

use serde_json::json;
use video2srt::app_config::{Config, TranslatorConfig};
use video2srt::errors::TranslationError;
use video2srt::providers::baidu::BaiduTranslator;
use video2srt::providers::create_provider;
use video2srt::providers::google::{GoogleTranslator, extract_translation};
use video2srt::providers::mock::{MockBehavior, MockProvider};
use video2srt::providers::ollama::{OllamaTranslator, parse_endpoint};
use video2srt::providers::openai::OpenAiTranslator;
use video2srt::providers::TranslationProvider;
use video2srt::translation::TranslationCache;

use crate::common::serve_http;

#[test]
fn test_createProvider_withOpenAiWithoutKey_shouldBeConfigError() {
    let mut config = Config::default();
    config.translators.insert("openai".to_string(), TranslatorConfig::default());

    assert!(matches!(create_provider("openai", &config), Err(TranslationError::Config(_))));
}

#[test]
fn test_createProvider_withOpenAiKey_shouldSupportContextAndStructure() {
    let mut config = Config::default();
    config.translators.insert(
        "openai".to_string(),
        TranslatorConfig {
            api_key: "sk-test".to_string(),
            ..TranslatorConfig::default()
        },
    );

    let provider = create_provider("openai", &config).unwrap();
    assert_eq!(provider.name(), "openai");
    assert!(provider.supports_context());
    assert!(provider.supports_structured());
}

#[test]
fn test_createProvider_withGoogle_shouldNotAdvertiseOptionalCapabilities() {
    let provider = create_provider("google", &Config::default()).unwrap();
    assert!(!provider.supports_context());
    assert!(!provider.supports_structured());
}

#[tokio::test]
async fn test_simple_translateTexts_shouldKeepOrder() {
    let provider = create_provider("simple", &Config::default()).unwrap();
    let texts = vec!["one".to_string(), "  ".to_string(), "three".to_string()];

    let translated = provider.translate_texts(&texts, "de").await.unwrap();
    assert_eq!(translated, vec!["[DE] one", "  ", "[DE] three"]);
}

#[tokio::test]
async fn test_passthrough_translateWithContext_shouldIgnoreContext() {
    let provider = create_provider("passthrough", &Config::default()).unwrap();
    let translated = provider
        .translate_with_context("[00:00:00,000-00:00:01,000] hi [CURRENT]", "hi", "fr", 0.0, 1.0)
        .await
        .unwrap();
    assert_eq!(translated, "hi");
}

#[tokio::test]
async fn test_structuredDefault_withoutSupport_shouldBeUnsupported() {
    let provider = create_provider("simple", &Config::default()).unwrap();
    let result = provider.translate_block_with_structure(&[], "fr").await;
    assert!(matches!(result, Err(TranslationError::Unsupported { .. })));
}

#[tokio::test]
async fn test_translateTexts_withFirstItemFailing_shouldKeepOriginalAndContinue() {
    let provider = MockProvider::fail_first("mock", 1);
    let texts = vec!["a".to_string(), "b".to_string()];

    let translated = provider.translate_texts(&texts, "fr").await.unwrap();
    assert_eq!(translated, vec!["a", "[fr] b"]);
}

#[tokio::test]
async fn test_translateTexts_withLaterItemFailing_shouldKeepOriginal() {
    let provider = MockProvider::new("mock", MockBehavior::Intermittent { fail_every: 2 });
    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

    let translated = provider.translate_texts(&texts, "fr").await.unwrap();
    assert_eq!(translated, vec!["[fr] a", "b", "[fr] c"]);
}

#[test]
fn test_extractTranslation_shouldJoinChunks() {
    let body = json!([[["Bonjour. ", "Hello. ", null], ["Comment ça va ?", "How are you?", null]], null, "en"]);
    assert_eq!(
        extract_translation(&body).unwrap(),
        Some("Bonjour. Comment ça va ?".to_string())
    );
    assert!(extract_translation(&json!({"error": 1})).is_err());
}

#[test]
fn test_parseEndpoint_shouldNormalizeAndReject() {
    assert_eq!(parse_endpoint("").unwrap(), "http://localhost:11434");
    assert_eq!(parse_endpoint("http://gpu-box:11434/").unwrap(), "http://gpu-box:11434");
    assert!(parse_endpoint("ftp://gpu-box").is_err());
    assert!(parse_endpoint("not a url").is_err());
}

#[tokio::test]
async fn test_googleTranslate_withHtmlPage_shouldBeRetryableApiError() {
    let (base_url, served) = serve_http(200, "text/html", "<html>captcha</html>").await.unwrap();
    let settings = TranslatorConfig {
        base_url,
        ..TranslatorConfig::default()
    };
    let translator = GoogleTranslator::new(&settings, TranslationCache::default()).unwrap();

    let error = translator.translate_text("Hello", "zh").await.unwrap_err();

    assert!(matches!(error, TranslationError::Api { .. }), "unexpected error: {:?}", error);
    assert!(error.is_retryable());
    assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_openAiTranslate_withEmptyCompletion_shouldKeepSourceText() {
    let body = r#"{"choices":[{"message":{"role":"assistant","content":"  "}}]}"#;
    let (base_url, _) = serve_http(200, "application/json", body).await.unwrap();
    let settings = TranslatorConfig {
        api_key: "sk-test".to_string(),
        base_url,
        ..TranslatorConfig::default()
    };
    let translator = OpenAiTranslator::new(&settings, TranslationCache::default()).unwrap();

    assert_eq!(translator.translate_text("Hello", "fr").await.unwrap(), "Hello");
    let contextual = translator
        .translate_with_context("[00:00:00,000-00:00:01,000] Hello [CURRENT]", "Hello", "fr", 0.0, 1.0)
        .await
        .unwrap();
    assert_eq!(contextual, "Hello");
}

#[tokio::test]
async fn test_ollamaTranslate_withEmptyGeneration_shouldKeepSourceText() {
    let (endpoint, _) = serve_http(200, "application/json", r#"{"response":"","done":true}"#)
        .await
        .unwrap();
    let settings = TranslatorConfig {
        endpoint,
        ..TranslatorConfig::default()
    };
    let translator = OllamaTranslator::new(&settings, TranslationCache::default()).unwrap();

    assert_eq!(translator.translate_text("Bonjour", "en").await.unwrap(), "Bonjour");
}

#[tokio::test]
async fn test_ollamaTranslate_withNonJsonBody_shouldBeRetryableApiError() {
    let (endpoint, _) = serve_http(200, "text/plain", "upstream warming up").await.unwrap();
    let settings = TranslatorConfig {
        endpoint,
        ..TranslatorConfig::default()
    };
    let translator = OllamaTranslator::new(&settings, TranslationCache::default()).unwrap();

    let error = translator.translate_text("Bonjour", "en").await.unwrap_err();
    assert!(matches!(error, TranslationError::Api { status_code: None, .. }));
    assert!(error.is_retryable());
}

fn baidu_settings(base_url: String) -> TranslatorConfig {
    TranslatorConfig {
        app_id: "2015063000000001".to_string(),
        secret_key: "12345678".to_string(),
        base_url,
        ..TranslatorConfig::default()
    }
}

#[tokio::test]
async fn test_baiduTranslate_withTransResult_shouldJoinLines() {
    let body = r#"{"from":"en","to":"zh","trans_result":[{"src":"Hello","dst":"你好"},{"src":"World","dst":"世界"}]}"#;
    let (base_url, served) = serve_http(200, "application/json", body).await.unwrap();
    let translator = BaiduTranslator::new(&baidu_settings(base_url), TranslationCache::default()).unwrap();

    assert_eq!(translator.translate_text("Hello\nWorld", "zh").await.unwrap(), "你好\n世界");
    // Second call is answered from the cache
    assert_eq!(translator.translate_text("Hello\nWorld", "zh").await.unwrap(), "你好\n世界");
    assert_eq!(served.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_baiduTranslate_withErrorCode_shouldBeRetryableApiError() {
    let body = r#"{"error_code":"54003","error_msg":"Invalid Access Limit"}"#;
    let (base_url, _) = serve_http(200, "application/json", body).await.unwrap();
    let translator = BaiduTranslator::new(&baidu_settings(base_url), TranslationCache::default()).unwrap();

    let error = translator.translate_text("Hello", "zh").await.unwrap_err();
    assert!(error.is_retryable());
    assert!(error.to_string().contains("54003"), "unexpected error: {}", error);
}

#[test]
fn test_createProvider_withBaiduWithoutCredentials_shouldBeConfigError() {
    let mut config = Config::default();
    config.translators.insert("baidu".to_string(), TranslatorConfig::default());

    assert!(matches!(create_provider("baidu", &config), Err(TranslationError::Config(_))));
}
