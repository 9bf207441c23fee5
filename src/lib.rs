/*!
 * # redub
 *
 * Re-dubs videos from translated subtitles: every cue is spoken by a
 * text-to-speech voice, the clips are placed on the video's timeline and
 * mixed over the attenuated original audio, then muxed back with ffmpeg.
 *
 * ## Architecture
 *
 * - `timing`: the timing engine
 *   - `timing::shift`: constant offset between translated and original subtitles
 *   - `timing::speed`: per-clip tempo so speech ends before the next cue
 *   - `timing::mix`: mix plan and its ffmpeg filter graph
 * - `pipeline`: per-item state machine with on-disk resume
 * - `app_controller`: folder runs, summaries and the issues log
 * - `subtitle_processor`: cue timeline and SRT reading/writing
 * - `providers`: speech synthesizers selected by language
 * - `media_tools`: ffmpeg/ffprobe invocation
 * - `file_utils`: discovery and atomic file writes
 * - `app_config`: configuration management
 * - `language_utils`: ISO 639 language code utilities
 * - `errors`: custom error types for the application
 */

// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod media_tools;
pub mod pipeline;
pub mod providers;
pub mod subtitle_processor;
pub mod timing;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{Controller, RunSummary};
pub use errors::{AppError, MediaToolError, PipelineError, ProviderError, SubtitleError, TimingError};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part2t};
pub use pipeline::{DubPipeline, ItemLayout, ItemReport, RunMode, Stage};
pub use subtitle_processor::{Cue, CueTimeline};
