/*!
 * Tests for language code utilities
 */

use video2srt::language_utils::{
    base_language_code, language_codes_match, language_display_name, normalize_to_part2t, validate_language_code,
};

#[test]
fn test_normalizeToPart2t_withVariousForms_shouldReturnThreeLetterCode() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("zh-CN").unwrap(), "zho");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("DEU").unwrap(), "deu");
    assert!(normalize_to_part2t("xx").is_err());
    assert!(normalize_to_part2t("").is_err());
}

#[test]
fn test_languageCodesMatch_acrossForms_shouldMatch() {
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("zh-TW", "chi"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("auto", "auto"));
}

#[test]
fn test_validateLanguageCode_withAuto_shouldDependOnFlag() {
    assert!(validate_language_code("auto", true).is_ok());
    assert!(validate_language_code("auto", false).is_err());
    assert!(validate_language_code("es", false).is_ok());
}

#[test]
fn test_languageDisplayName_shouldUseEnglishNames() {
    assert_eq!(language_display_name("zh"), "Chinese");
    assert_eq!(language_display_name("de"), "German");
    assert_eq!(language_display_name("auto"), "the source language");
    assert_eq!(language_display_name("klingon"), "klingon");
}

#[test]
fn test_baseLanguageCode_shouldLowercaseAndStripRegion() {
    assert_eq!(base_language_code(" PT-br "), "pt");
}
