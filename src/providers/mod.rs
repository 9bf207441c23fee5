/*!
 * Speech synthesis providers.
 *
 * Each provider speaks one language. The pipeline never knows which
 * implementation it talks to; it asks the registry for the voice of the
 * target language:
 * - `local_tts`: HTTP client for a local text-to-speech service
 * - `mock`: in-memory synthesizer for tests
 */

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;
use std::sync::Arc;

use crate::app_config::TtsConfig;
use crate::errors::ProviderError;
use crate::language_utils;

pub mod local_tts;
pub mod mock;

use local_tts::LocalTtsClient;

static MARKUP_TAG_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<[^>]+>").expect("markup regex is valid")
});

/// Common trait for all speech synthesizers
///
/// An implementation turns one cue's text into encoded audio bytes.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync + Debug {
    /// Language code spoken by this synthesizer
    fn language(&self) -> &str;

    /// Synthesize a single utterance
    ///
    /// # Arguments
    /// * `text` - Cue text, possibly containing markup tags
    ///
    /// # Returns
    /// * `Result<Bytes, ProviderError>` - Encoded audio or the failure
    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError>;
}

/// Strip HTML-like tags (`<i>`, `<font color=...>`) that must not be spoken
pub fn normalize_text(input: &str) -> String {
    MARKUP_TAG_REGEX.replace_all(input, "").into_owned()
}

/// Synthesizers available to the pipeline, keyed by language
#[derive(Debug, Default, Clone)]
pub struct SynthesizerRegistry {
    synthesizers: Vec<Arc<dyn SpeechSynthesizer>>,
}

impl SynthesizerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one HTTP synthesizer per configured voice
    pub fn from_config(config: &TtsConfig) -> Result<Self, ProviderError> {
        let mut registry = Self::new();
        for voice in &config.voices {
            registry.register(Arc::new(LocalTtsClient::new(voice, config.timeout_secs)?));
        }
        Ok(registry)
    }

    /// Add a synthesizer; a later registration for the same language wins
    pub fn register(&mut self, synthesizer: Arc<dyn SpeechSynthesizer>) {
        self.synthesizers
            .retain(|s| !language_utils::language_codes_match(s.language(), synthesizer.language()));
        self.synthesizers.push(synthesizer);
    }

    /// Synthesizer for a language
    pub fn for_language(&self, language: &str) -> Result<Arc<dyn SpeechSynthesizer>, ProviderError> {
        self.synthesizers
            .iter()
            .find(|s| language_utils::language_codes_match(s.language(), language))
            .cloned()
            .ok_or_else(|| ProviderError::NoVoiceForLanguage(language.to_string()))
    }

    pub fn languages(&self) -> Vec<String> {
        self.synthesizers.iter().map(|s| s.language().to_string()).collect()
    }
}
