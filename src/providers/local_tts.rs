use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app_config::VoiceConfig;
use crate::errors::ProviderError;
use crate::providers::{normalize_text, SpeechSynthesizer};

/// Client for a local text-to-speech HTTP service
///
/// The service takes a JSON body and answers with raw audio (WAV) bytes.
#[derive(Debug)]
pub struct LocalTtsClient {
    /// Language spoken by the configured speaker
    language: String,
    /// Full URL of the synthesis endpoint
    endpoint: String,
    /// Speaker name understood by the service
    speaker: String,
    /// Speaking rate
    speed: f32,
    /// HTTP client for making requests
    client: Client,
}

/// Synthesis request body
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SynthesisRequest {
    /// Text to speak, without markup
    pub text: String,
    /// Speaker name
    pub speaker: String,
    /// Speaking rate
    pub speed: f32,
}

impl LocalTtsClient {
    /// Create a client for one configured voice
    pub fn new(voice: &VoiceConfig, timeout_secs: u64) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            language: voice.language.clone(),
            endpoint: voice.endpoint.clone(),
            speaker: voice.speaker.clone(),
            speed: voice.speed,
            client,
        })
    }

    /// Request body for a cue text
    pub fn build_request(&self, text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: normalize_text(text),
            speaker: self.speaker.clone(),
            speed: self.speed,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechSynthesizer for LocalTtsClient {
    fn language(&self) -> &str {
        &self.language
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError> {
        let request = self.build_request(text);
        debug!("Synthesizing {} chars with speaker {}", request.text.len(), self.speaker);

        let response = self.client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::ConnectionError(e.to_string())
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read audio body: {}", e)))?;

        if audio.is_empty() {
            return Err(ProviderError::EmptyAudio(request.text));
        }

        Ok(audio)
    }
}
