use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use url::Url;

use crate::errors::TimingError;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Language tag of the original subtitle and audio streams in the video
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language code of the dub (voice selection and output stream tags)
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Speech synthesis config
    #[serde(default)]
    pub tts: TtsConfig,

    /// Timing engine config
    #[serde(default)]
    pub timing: TimingConfig,

    /// External media tool config
    #[serde(default)]
    pub media: MediaConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Voice used to speak one language
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VoiceConfig {
    // @field: Language code the voice speaks
    pub language: String,

    // @field: Speech synthesis endpoint (HTTP POST)
    #[serde(default = "default_tts_endpoint")]
    pub endpoint: String,

    // @field: Speaker name understood by the service
    #[serde(default = "default_speaker")]
    pub speaker: String,

    // @field: Speaking rate requested from the service
    #[serde(default = "default_speech_speed")]
    pub speed: f32,
}

impl VoiceConfig {
    // @param language: Language code
    // @returns: Voice config with defaults for the local Estonian service
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            endpoint: default_tts_endpoint(),
            speaker: default_speaker(),
            speed: default_speech_speed(),
        }
    }
}

/// Speech synthesis configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TtsConfig {
    /// Number of retries after a failed synthesis call
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Configured voices, one per language
    #[serde(default = "default_voices")]
    pub voices: Vec<VoiceConfig>,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            retry_count: default_retry_count(),
            timeout_secs: default_timeout_secs(),
            voices: default_voices(),
        }
    }
}

/// Discrete offset search used to align the dub timeline with the reference
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ShiftSearchConfig {
    /// Lowest candidate offset in milliseconds
    #[serde(default = "default_min_offset_ms")]
    pub min_offset_ms: i64,

    /// Highest candidate offset in milliseconds (inclusive)
    #[serde(default = "default_max_offset_ms")]
    pub max_offset_ms: i64,

    /// Distance between candidate offsets
    #[serde(default = "default_offset_step_ms")]
    pub step_ms: i64,

    /// A shifted cue matches a reference cue when their starts differ by less than this
    #[serde(default = "default_match_window_ms")]
    pub match_window_ms: i64,

    /// Share of dub cues that must match before an offset is trusted
    #[serde(default = "default_min_hit_ratio")]
    pub min_hit_ratio: f64,
}

impl Default for ShiftSearchConfig {
    fn default() -> Self {
        Self {
            min_offset_ms: default_min_offset_ms(),
            max_offset_ms: default_max_offset_ms(),
            step_ms: default_offset_step_ms(),
            match_window_ms: default_match_window_ms(),
            min_hit_ratio: default_min_hit_ratio(),
        }
    }
}

/// Tempo compression of synthesized clips
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SpeedPlanConfig {
    /// Gap kept free before the next cue starts
    #[serde(default = "default_pause_delay_ms")]
    pub pause_delay_ms: u64,

    /// Increment of the tempo search
    #[serde(default = "default_tempo_step")]
    pub tempo_step: f64,

    /// Highest tempo factor; faster speech is considered unintelligible
    #[serde(default = "default_max_tempo")]
    pub max_tempo: f64,
}

impl Default for SpeedPlanConfig {
    fn default() -> Self {
        Self {
            pause_delay_ms: default_pause_delay_ms(),
            tempo_step: default_tempo_step(),
            max_tempo: default_max_tempo(),
        }
    }
}

/// Global mixing parameters
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MixConfig {
    /// Volume factor applied to the original audio stream
    #[serde(default = "default_original_attenuation")]
    pub original_attenuation: f64,

    /// Whether the summed tracks are auto-leveled
    #[serde(default)]
    pub normalize: bool,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            original_attenuation: default_original_attenuation(),
            normalize: false,
        }
    }
}

/// Timing engine configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TimingConfig {
    #[serde(default)]
    pub shift: ShiftSearchConfig,

    #[serde(default)]
    pub speed: SpeedPlanConfig,

    #[serde(default)]
    pub mix: MixConfig,
}

/// External media tool configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MediaConfig {
    /// ffmpeg executable
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    /// ffprobe executable
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: String,

    /// Timeout for a single tool invocation in seconds
    #[serde(default = "default_media_timeout_secs")]
    pub timeout_secs: u64,

    /// Video extensions tried, in order, when pairing a subtitle file
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,

    /// Extension of the translated subtitle files
    #[serde(default = "default_subtitle_extension")]
    pub subtitle_extension: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            timeout_secs: default_media_timeout_secs(),
            video_extensions: default_video_extensions(),
            subtitle_extension: default_subtitle_extension(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    // @returns: Matching filter for the log facade
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "eng".to_string()
}

fn default_target_language() -> String {
    "est".to_string()
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_tts_endpoint() -> String {
    "http://localhost:5000/text-to-speech/v2".to_string()
}

fn default_speaker() -> String {
    "mari".to_string()
}

fn default_speech_speed() -> f32 {
    0.8
}

fn default_voices() -> Vec<VoiceConfig> {
    vec![VoiceConfig::new("est")]
}

fn default_min_offset_ms() -> i64 {
    -2000
}

fn default_max_offset_ms() -> i64 {
    2000
}

fn default_offset_step_ms() -> i64 {
    50
}

fn default_match_window_ms() -> i64 {
    50
}

fn default_min_hit_ratio() -> f64 {
    0.1
}

fn default_pause_delay_ms() -> u64 {
    500
}

fn default_tempo_step() -> f64 {
    0.05
}

fn default_max_tempo() -> f64 {
    1.3
}

fn default_original_attenuation() -> f64 {
    0.4
}

fn default_ffmpeg_path() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe_path() -> String {
    "ffprobe".to_string()
}

fn default_media_timeout_secs() -> u64 {
    600 // mixing hundreds of inputs is slow
}

fn default_video_extensions() -> Vec<String> {
    vec!["mkv".to_string(), "mp4".to_string()]
}

fn default_subtitle_extension() -> String {
    "srt".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;
        let _target_name = crate::language_utils::get_language_name(&self.target_language)?;

        // A voice must exist for the dub language
        if self.voice_for(&self.target_language).is_none() {
            return Err(anyhow!(
                "No voice configured for target language '{}'",
                self.target_language
            ));
        }

        for voice in &self.tts.voices {
            Url::parse(&voice.endpoint)
                .map_err(|e| anyhow!("Invalid endpoint for voice '{}': {}", voice.language, e))?;
            if voice.speed <= 0.0 {
                return Err(anyhow!("Speech speed must be positive for voice '{}'", voice.language));
            }
        }

        self.timing.validate()?;

        if self.media.video_extensions.is_empty() {
            return Err(anyhow!("At least one video extension is required"));
        }

        Ok(())
    }

    /// Find the voice configured for a language
    pub fn voice_for(&self, language: &str) -> Option<&VoiceConfig> {
        self.tts
            .voices
            .iter()
            .find(|voice| crate::language_utils::language_codes_match(&voice.language, language))
    }
}

impl TimingConfig {
    /// Validate the timing parameters
    pub fn validate(&self) -> Result<(), TimingError> {
        let shift = &self.shift;
        if shift.step_ms <= 0 {
            return Err(TimingError::InvalidConfig(format!(
                "Shift search step must be positive, got {}", shift.step_ms
            )));
        }
        if shift.min_offset_ms > shift.max_offset_ms {
            return Err(TimingError::InvalidConfig(format!(
                "Shift search range is empty: {}..={}",
                shift.min_offset_ms, shift.max_offset_ms
            )));
        }
        if shift.match_window_ms <= 0 {
            return Err(TimingError::InvalidConfig(format!(
                "Match window must be positive, got {}", shift.match_window_ms
            )));
        }
        if !(0.0..=1.0).contains(&shift.min_hit_ratio) {
            return Err(TimingError::InvalidConfig(format!(
                "Minimum hit ratio must be within 0..=1, got {}", shift.min_hit_ratio
            )));
        }

        let speed = &self.speed;
        if speed.tempo_step <= 0.0 {
            return Err(TimingError::InvalidConfig(format!(
                "Tempo step must be positive, got {}", speed.tempo_step
            )));
        }
        if speed.max_tempo < 1.0 {
            return Err(TimingError::InvalidConfig(format!(
                "Maximum tempo must be at least 1.0, got {}", speed.max_tempo
            )));
        }

        if self.mix.original_attenuation < 0.0 {
            return Err(TimingError::InvalidConfig(format!(
                "Original track attenuation must not be negative, got {}",
                self.mix.original_attenuation
            )));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_language: default_target_language(),
            tts: TtsConfig::default(),
            timing: TimingConfig::default(),
            media: MediaConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
