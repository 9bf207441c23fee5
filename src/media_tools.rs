/*!
 * External media tools.
 *
 * The pipeline only talks to the `MediaTool` trait. `FfmpegTool` drives the
 * ffmpeg and ffprobe binaries. Every output is first written next to its
 * destination with a `.partial` marker and renamed once the tool succeeded,
 * so an output file that exists is always complete.
 */

use async_trait::async_trait;
use log::{debug, error};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::app_config::MediaConfig;
use crate::errors::MediaToolError;
use crate::timing::{MixPlan, MIX_OUTPUT_LABEL};

/// Inputs of the mix step
#[derive(Debug, Clone, Copy)]
pub struct MixRequest<'a> {
    /// Original video, input 0 of the filter graph
    pub video: &'a Path,
    /// One clip per plan segment, in segment order
    pub clips: &'a [PathBuf],
    pub plan: &'a MixPlan,
    /// Language tag of the original audio stream
    pub source_language: &'a str,
    /// Composite audio to write
    pub output: &'a Path,
}

/// Inputs of the final mux
#[derive(Debug, Clone, Copy)]
pub struct MuxRequest<'a> {
    pub video: &'a Path,
    pub audio: &'a Path,
    pub subtitles: &'a Path,
    /// Language tag of the new audio and subtitle streams
    pub language: &'a str,
    pub output: &'a Path,
}

/// Operations the pipeline needs from an external media toolkit
#[async_trait]
pub trait MediaTool: Send + Sync + Debug {
    /// Extract the subtitle stream tagged with `language` into an SRT file
    async fn extract_subtitles(&self, video: &Path, language: &str, output: &Path) -> Result<(), MediaToolError>;

    /// Duration of a media file in whole milliseconds
    async fn probe_duration_ms(&self, media: &Path) -> Result<u64, MediaToolError>;

    /// Render the composite audio track described by a mix plan
    async fn mix_audio(&self, request: &MixRequest<'_>) -> Result<(), MediaToolError>;

    /// Combine video, composite audio and subtitles into the output container
    async fn mux(&self, request: &MuxRequest<'_>) -> Result<(), MediaToolError>;
}

/// ffmpeg/ffprobe backed media tool
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg_path: String,
    ffprobe_path: String,
    timeout: Duration,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self::new(&MediaConfig::default())
    }
}

impl FfmpegTool {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Arguments of the reference subtitle extraction
    pub fn extract_args(video: &Path, language: &str, output: &Path) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(video),
            "-map".to_string(),
            format!("0:m:language:{}", language),
            "-map".to_string(),
            "-0:v".to_string(),
            "-map".to_string(),
            "-0:a".to_string(),
            path_arg(output),
        ]
    }

    /// Arguments of the duration probe
    pub fn probe_args(media: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-show_entries".to_string(),
            "format=duration".to_string(),
            "-of".to_string(),
            "default=noprint_wrappers=1:nokey=1".to_string(),
            path_arg(media),
        ]
    }

    /// Arguments of the mix step, writing to `output`
    pub fn mix_args(request: &MixRequest<'_>, output: &Path) -> Vec<String> {
        let mut args = vec!["-y".to_string(), "-i".to_string(), path_arg(request.video)];
        for clip in request.clips {
            args.push("-i".to_string());
            args.push(path_arg(clip));
        }

        let original_stream = format!("0:m:language:{}", request.source_language);
        args.push("-filter_complex".to_string());
        args.push(request.plan.render_filter_graph(&original_stream));
        args.push("-map".to_string());
        args.push(format!("[{}]", MIX_OUTPUT_LABEL));
        args.push(path_arg(output));
        args
    }

    /// Arguments of the mux step, writing to `output`
    pub fn mux_args(request: &MuxRequest<'_>, output: &Path) -> Vec<String> {
        let language_tag = format!("language={}", request.language);
        vec![
            "-y".to_string(),
            "-i".to_string(),
            path_arg(request.video),
            "-i".to_string(),
            path_arg(request.audio),
            "-f".to_string(),
            "srt".to_string(),
            "-i".to_string(),
            path_arg(request.subtitles),
            "-map".to_string(),
            "1".to_string(),
            "-map".to_string(),
            "2".to_string(),
            "-map".to_string(),
            "0".to_string(),
            "-metadata:s:a:0".to_string(),
            language_tag.clone(),
            "-metadata:s:s:0".to_string(),
            language_tag,
            "-c".to_string(),
            "copy".to_string(),
            path_arg(output),
        ]
    }

    /// Run a tool to completion, bounded by the configured timeout
    async fn run(&self, program: &str, args: &[String]) -> Result<Output, MediaToolError> {
        debug!("Running {} {}", program, args.join(" "));

        let future = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output();

        let output = tokio::select! {
            result = future => {
                result.map_err(|source| MediaToolError::Spawn {
                    tool: program.to_string(),
                    source,
                })?
            },
            _ = tokio::time::sleep(self.timeout) => {
                return Err(MediaToolError::Timeout {
                    tool: program.to_string(),
                    secs: self.timeout.as_secs(),
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", program, filtered);
            return Err(MediaToolError::Failed {
                tool: program.to_string(),
                message: filtered,
            });
        }

        Ok(output)
    }

    /// Run ffmpeg into a `.partial` sibling of `output`, then move it into place
    async fn run_into(&self, output: &Path, args_for: impl FnOnce(&Path) -> Vec<String>) -> Result<(), MediaToolError> {
        let partial = partial_path(output);
        let args = args_for(&partial);

        if let Err(e) = self.run(&self.ffmpeg_path, &args).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }

        tokio::fs::rename(&partial, output)
            .await
            .map_err(|source| MediaToolError::Finalize {
                path: output.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn extract_subtitles(&self, video: &Path, language: &str, output: &Path) -> Result<(), MediaToolError> {
        self.run_into(output, |target| Self::extract_args(video, language, target)).await
    }

    async fn probe_duration_ms(&self, media: &Path) -> Result<u64, MediaToolError> {
        let output = self.run(&self.ffprobe_path, &Self::probe_args(media)).await?;
        parse_duration_ms(&String::from_utf8_lossy(&output.stdout))
    }

    async fn mix_audio(&self, request: &MixRequest<'_>) -> Result<(), MediaToolError> {
        self.run_into(request.output, |target| Self::mix_args(request, target)).await
    }

    async fn mux(&self, request: &MuxRequest<'_>) -> Result<(), MediaToolError> {
        self.run_into(request.output, |target| Self::mux_args(request, target)).await
    }
}

/// Parse ffprobe's decimal seconds into whole milliseconds, rounding down
pub fn parse_duration_ms(stdout: &str) -> Result<u64, MediaToolError> {
    let trimmed = stdout.trim();
    let seconds: f64 = trimmed
        .parse()
        .map_err(|_| MediaToolError::InvalidProbeOutput(trimmed.to_string()))?;

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(MediaToolError::InvalidProbeOutput(trimmed.to_string()));
    }

    Ok((seconds * 1000.0).floor() as u64)
}

/// `dir/name.ext` becomes `dir/name.partial.ext`, keeping the extension ffmpeg
/// uses to pick the output format
pub fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}.partial.{}", stem, ext.to_string_lossy()),
        None => format!("{}.partial", stem),
    };
    output.with_file_name(name)
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Keep only the meaningful lines of ffmpeg's stderr, dropping the version
/// banner, build configuration and stream listing
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    const NOISE_PREFIXES: [&str; 17] = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Chapter",
        "Stream #",
        "title",
        "BPS",
        "DURATION",
        "NUMBER_OF",
        "_STATISTICS",
        "Output #",
        "Stream mapping:",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with("Press [q]"))
        .filter(|line| !NOISE_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
