/*!
 * Mock synthesizer for testing.
 *
 * - `MockSynthesizer::working()` - Always succeeds with a small fake WAV payload
 * - `MockSynthesizer::failing_first(n)` - Fails the first `n` calls, then succeeds
 * - `MockSynthesizer::failing()` - Always fails
 */

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{normalize_text, SpeechSynthesizer};

/// Behavior mode for the mock synthesizer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails the first N requests
    FailFirst { failures: usize },
    /// Always fails with an error
    Failing,
}

/// Mock synthesizer recording every request
#[derive(Debug)]
pub struct MockSynthesizer {
    language: String,
    behavior: MockBehavior,
    /// Request counter, shared so tests can read it after handing the mock over
    request_count: Arc<AtomicUsize>,
    /// Texts received, after markup stripping
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with the specified behavior
    pub fn new(language: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            language: language.into(),
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a working mock synthesizer for Estonian
    pub fn working() -> Self {
        Self::new("est", MockBehavior::Working)
    }

    /// Create a mock that fails the first `failures` requests
    pub fn failing_first(failures: usize) -> Self {
        Self::new("est", MockBehavior::FailFirst { failures })
    }

    /// Create a failing mock synthesizer
    pub fn failing() -> Self {
        Self::new("est", MockBehavior::Failing)
    }

    /// Number of synthesis calls made so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Shared handle on the request counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.request_count)
    }

    /// Texts received so far
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// Fake audio payload for a text
    pub fn audio_for(text: &str) -> Bytes {
        Bytes::from(format!("RIFF-mock-audio:{}", text))
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    fn language(&self) -> &str {
        &self.language
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, ProviderError> {
        let call = self.request_count.fetch_add(1, Ordering::SeqCst);
        let text = normalize_text(text);
        self.requests.lock().push(text.clone());

        let fail = match self.behavior {
            MockBehavior::Working => false,
            MockBehavior::FailFirst { failures } => call < failures,
            MockBehavior::Failing => true,
        };

        if fail {
            return Err(ProviderError::ConnectionError(format!(
                "mock connection refused (call {})",
                call + 1
            )));
        }

        Ok(Self::audio_for(&text))
    }
}
