/*!
 * Tests for application configuration functionality
 */

use video2srt::app_config::{Config, LogLevel, TranslationMode, TranslatorConfig};

use crate::common::{create_temp_dir, create_test_file};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.general.default_translator, "google");
    assert_eq!(config.general.fallback_translator, "simple");
    assert_eq!(config.translation.mode, TranslationMode::Block);
    assert_eq!(config.translation.max_block_chars, 600);
    assert_eq!(config.translation.context_window, 10);
    assert!(config.translation.structured_prompt);
    assert!(!config.translation.use_ai_timestamps);
    assert_eq!(config.translator_manager.retry.max_retries, 3);
    assert_eq!(config.translator_manager.circuit_breaker.recovery_timeout, 300.0);
    assert_eq!(config.log_level, LogLevel::Info);

    let google = config.translator_config("google");
    assert!(google.enabled);
    assert_eq!(google.timeout, 15.0);
    assert_eq!(google.retry_count, 3);
    assert_eq!(google.max_requests_per_minute, 60);
}

#[test]
fn test_config_fromFile_withPartialJson_shouldFillDefaults() {
    let dir = create_temp_dir().unwrap();
    let path = create_test_file(
        dir.path(),
        "conf.json",
        r#"{
            "general": { "default_translator": "openai" },
            "translators": {
                "openai": { "api_key": "sk-test", "priority": 0 }
            },
            "translation": { "mode": "per_segment" }
        }"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.general.default_translator, "openai");
    assert_eq!(config.general.fallback_translator, "simple");
    assert_eq!(config.translation.mode, TranslationMode::PerSegment);
    assert_eq!(config.translation.max_gap_seconds, 3.0);

    let openai = config.translator_config("openai");
    assert_eq!(openai.api_key, "sk-test");
    assert_eq!(openai.priority, 0);
    assert_eq!(openai.timeout, 15.0);
}

#[test]
fn test_config_saveAndLoad_shouldPreserveValues() {
    let dir = create_temp_dir().unwrap();
    let path = dir.path().join("saved.json");

    let mut config = Config::default();
    config.translation.max_block_chars = 250;
    config.translators.insert(
        "ollama".to_string(),
        TranslatorConfig {
            endpoint: "http://gpu-box:11434".to_string(),
            model: "qwen2".to_string(),
            ..TranslatorConfig::default()
        },
    );
    config.save_to_file(&path).unwrap();

    let loaded = Config::from_file(&path).unwrap();
    assert_eq!(loaded.translation.max_block_chars, 250);
    assert_eq!(loaded.translator_config("ollama"), config.translator_config("ollama"));
}

#[test]
fn test_config_fromFile_withMissingFile_shouldFail() {
    let dir = create_temp_dir().unwrap();
    assert!(Config::from_file(dir.path().join("missing.json")).is_err());
}

#[test]
fn test_translatorConfig_validate_withBadValues_shouldReportEachProblem() {
    let settings = TranslatorConfig {
        timeout: 0.0,
        retry_count: -1,
        max_requests_per_minute: 0,
        ..TranslatorConfig::default()
    };

    assert_eq!(settings.validate().len(), 3);
    assert!(TranslatorConfig::default().validate().is_empty());
}

#[test]
fn test_translatorConfig_fromJson_withNegativeRetries_shouldParseAndFailValidation() {
    let settings: TranslatorConfig = serde_json::from_str(r#"{ "retry_count": -2 }"#).unwrap();
    assert_eq!(settings.retry_count, -2);
    assert!(!settings.validate().is_empty());
}

#[test]
fn test_config_validate_withZeroBlockChars_shouldFail() {
    let mut config = Config::default();
    config.translation.max_block_chars = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_translationMode_fromStr_shouldAcceptAliases() {
    assert_eq!("block".parse::<TranslationMode>().unwrap(), TranslationMode::Block);
    assert_eq!("segment".parse::<TranslationMode>().unwrap(), TranslationMode::PerSegment);
    assert!("sentence".parse::<TranslationMode>().is_err());
}
