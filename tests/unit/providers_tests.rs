/*!
 * Tests for speech synthesis providers
 */

use std::sync::Arc;

use redub::app_config::{TtsConfig, VoiceConfig};
use redub::errors::ProviderError;
use redub::providers::local_tts::LocalTtsClient;
use redub::providers::mock::{MockBehavior, MockSynthesizer};
use redub::providers::{normalize_text, SpeechSynthesizer, SynthesizerRegistry};

#[test]
fn test_normalizeText_withMarkup_shouldStripTags() {
    assert_eq!(normalize_text("<i>Tere</i> <font color=\"#ffff00\">hommikust</font>"), "Tere hommikust");
    assert_eq!(normalize_text("no tags"), "no tags");
    assert_eq!(normalize_text("a < b"), "a < b");
}

#[test]
fn test_localTts_buildRequest_shouldUseVoiceSettings() {
    let client = LocalTtsClient::new(&VoiceConfig::new("est"), 5).unwrap();

    let request = client.build_request("<b>Tere</b>");

    assert_eq!(request.text, "Tere");
    assert_eq!(request.speaker, "mari");
    assert_eq!(request.speed, 0.8);
    assert_eq!(client.endpoint(), "http://localhost:5000/text-to-speech/v2");
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["text"], "Tere");
    assert_eq!(body["speaker"], "mari");
    assert!(body["speed"].is_number());
}

/// Unreachable service surfaces as a provider error
#[tokio::test]
async fn test_localTts_withUnreachableService_shouldFail() {
    let mut voice = VoiceConfig::new("est");
    voice.endpoint = "http://127.0.0.1:9/text-to-speech/v2".to_string();
    let client = LocalTtsClient::new(&voice, 2).unwrap();

    let result = client.synthesize("Tere").await;

    assert!(matches!(
        result,
        Err(ProviderError::ConnectionError(_)) | Err(ProviderError::RequestFailed(_))
    ));
}

#[test]
fn test_mock_working_shouldRecordRequests() {
    let mock = MockSynthesizer::working();

    let audio = tokio_test::block_on(mock.synthesize("<i>Tere</i>")).unwrap();

    assert_eq!(audio, MockSynthesizer::audio_for("Tere"));
    assert_eq!(mock.request_count(), 1);
    assert_eq!(mock.requests(), vec!["Tere".to_string()]);
}

#[test]
fn test_mock_failFirst_shouldRecoverAfterFailures() {
    let mock = MockSynthesizer::new("est", MockBehavior::FailFirst { failures: 2 });

    let results: Vec<bool> = (0..3)
        .map(|_| tokio_test::block_on(mock.synthesize("x")).is_ok())
        .collect();

    assert_eq!(results, vec![false, false, true]);
}

#[test]
fn test_registry_forLanguage_shouldMatchEitherCodeSpelling() {
    let mut registry = SynthesizerRegistry::new();
    registry.register(Arc::new(MockSynthesizer::working()));
    registry.register(Arc::new(MockSynthesizer::new("de", MockBehavior::Working)));

    assert_eq!(registry.for_language("et").unwrap().language(), "est");
    assert_eq!(registry.for_language("ger").unwrap().language(), "de");
    assert!(matches!(
        registry.for_language("fin"),
        Err(ProviderError::NoVoiceForLanguage(lang)) if lang == "fin"
    ));
}

#[test]
fn test_registry_register_sameLanguage_shouldReplaceVoice() {
    let mut registry = SynthesizerRegistry::new();
    registry.register(Arc::new(MockSynthesizer::failing()));
    registry.register(Arc::new(MockSynthesizer::new("et", MockBehavior::Working)));

    assert_eq!(registry.languages(), vec!["et".to_string()]);
    let voice = registry.for_language("est").unwrap();
    assert!(tokio_test::block_on(voice.synthesize("x")).is_ok());
}

#[test]
fn test_registry_fromConfig_shouldBuildOneVoicePerEntry() {
    let mut config = TtsConfig::default();
    config.voices.push(VoiceConfig::new("fin"));

    let registry = SynthesizerRegistry::from_config(&config).unwrap();

    assert_eq!(registry.languages(), vec!["est".to_string(), "fin".to_string()]);
}
