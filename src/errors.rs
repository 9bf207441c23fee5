/*!
 * Error types for the redub application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when talking to a speech synthesis service
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when sending the request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error returned by the service itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The service answered with an empty audio body
    #[error("Speech service returned no audio for: {0}")]
    EmptyAudio(String),

    /// No voice is configured for the requested language
    #[error("No voice configured for language: {0}")]
    NoVoiceForLanguage(String),
}

/// Errors that can occur during subtitle processing
#[derive(Error, Debug)]
pub enum SubtitleError {
    /// The subtitle content could not be parsed
    #[error("Failed to parse subtitles: {0}")]
    Parse(String),

    /// The subtitle content did not contain any usable cue
    #[error("No valid subtitle cues found in {0}")]
    Empty(String),

    /// A cue violates the start < end invariant or has no text
    #[error("Invalid cue: {0}")]
    InvalidCue(String),
}

/// Errors raised by the external media tools (ffmpeg, ffprobe)
#[derive(Error, Debug)]
pub enum MediaToolError {
    /// The tool binary could not be started
    #[error("Failed to execute {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but reported a failure
    #[error("{tool} failed: {message}")]
    Failed { tool: String, message: String },

    /// The tool did not finish in time
    #[error("{tool} timed out after {secs} seconds")]
    Timeout { tool: String, secs: u64 },

    /// ffprobe output was not a duration
    #[error("Failed to parse probed duration: {0:?}")]
    InvalidProbeOutput(String),

    /// The finished output could not be moved into place
    #[error("Failed to finalize {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the timing engine
#[derive(Error, Debug)]
pub enum TimingError {
    /// No speed decision was supplied for a cue
    #[error("No speed decision for cue {0}")]
    MissingDecision(usize),

    /// A timing parameter is out of range
    #[error("Invalid timing configuration: {0}")]
    InvalidConfig(String),
}

/// Errors that abort the processing of a single media item
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A subtitle file has no matching video
    #[error("No video file found for subtitles: {0}")]
    MissingPairing(PathBuf),

    /// Synthesis kept failing for one cue
    #[error("Speech synthesis failed for cue {cue_index} after {attempts} attempts: {last_error}")]
    SynthesisExhausted {
        cue_index: usize,
        attempts: u32,
        last_error: ProviderError,
    },

    /// An artifact required by the requested run mode does not exist
    #[error("Required artifact is missing: {0}")]
    MissingArtifact(PathBuf),

    /// Error from the speech provider outside the retry loop
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from an external media tool
    #[error("Media tool error: {0}")]
    Media(#[from] MediaToolError),

    /// Error from subtitle processing
    #[error("Subtitle error: {0}")]
    Subtitle(#[from] SubtitleError),

    /// Error from the timing engine
    #[error("Timing error: {0}")]
    Timing(#[from] TimingError),

    /// Error from a file operation
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from the dubbing pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
