use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::{AppError, PipelineError};
use crate::file_utils::{FileManager, MediaItem};
use crate::media_tools::{FfmpegTool, MediaTool};
use crate::pipeline::{DubPipeline, ItemLayout, ItemReport, RunMode};
use crate::providers::SynthesizerRegistry;

// @module: Application controller for folder dubbing

// @const: Summary log written into the output folder
pub const ISSUES_LOG_FILE: &str = "redub.issues.log";

/// Counts and reports of one folder run
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    // @field: Items advanced by this run
    pub processed: usize,
    // @field: Items already at the requested stage
    pub skipped: usize,
    // @field: Items aborted by an error
    pub failed: usize,
    // @field: Subtitle files without a video
    pub missing_pairings: usize,
    // @field: One report per item that did not fail
    pub reports: Vec<ItemReport>,
    // @field: Video path and error message of each failed item
    pub failures: Vec<(PathBuf, String)>,
    // @field: Message of each subtitle file skipped for lack of a video
    pub pairing_issues: Vec<String>,
}

impl RunSummary {
    pub fn message(&self) -> String {
        format!(
            "Folder processing completed: {} processed, {} skipped, {} errors, {} missing pairings",
            self.processed, self.skipped, self.failed, self.missing_pairings
        )
    }
}

/// Main application controller for dubbing folders
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Voices by language
    registry: SynthesizerRegistry,
    // @field: External media toolkit
    media: Arc<dyn MediaTool>,
}

impl Controller {
    // @method: Create a controller backed by the HTTP voices and ffmpeg
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        let registry = SynthesizerRegistry::from_config(&config.tts)
            .map_err(|e| AppError::Config(e.to_string()))?;
        let media: Arc<dyn MediaTool> = Arc::new(FfmpegTool::new(&config.media));
        Ok(Self::with_components(config, registry, media))
    }

    // @method: Create a controller with explicit collaborators
    pub fn with_components(config: Config, registry: SynthesizerRegistry, media: Arc<dyn MediaTool>) -> Self {
        Self { config, registry, media }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dub every subtitle/video pair found under `input_dir` into `output_dir`.
    /// A failing item is reported and the run continues with the next one.
    pub async fn run_folder(&self, input_dir: &Path, output_dir: &Path, mode: RunMode) -> Result<RunSummary, AppError> {
        let start_time = std::time::Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(AppError::File(format!("Input directory does not exist: {:?}", input_dir)));
        }

        let discovery = FileManager::find_media_pairs(
            input_dir,
            &self.config.media.subtitle_extension,
            &self.config.media.video_extensions,
        )?;

        let mut summary = RunSummary::default();

        for subtitles_path in discovery
            .missing_pairings
            .iter()
            .filter(|p| !is_generated(p, input_dir, output_dir))
        {
            let issue = PipelineError::MissingPairing(subtitles_path.clone());
            error!("{}, skipping", issue);
            summary.missing_pairings += 1;
            summary.pairing_issues.push(issue.to_string());
        }

        let items: Vec<&MediaItem> = discovery
            .items
            .iter()
            .filter(|item| !is_generated(&item.subtitles_path, input_dir, output_dir))
            .collect();

        if items.is_empty() {
            warn!("No subtitle/video pairs found in {:?}", input_dir);
        }

        let multi_progress = MultiProgress::new();
        let pipeline = DubPipeline::new(&self.config, &self.registry, Arc::clone(&self.media))?
            .with_progress(multi_progress.clone());

        let folder_pb = multi_progress.add(ProgressBar::new(items.len() as u64));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(style.progress_chars("█▓▒░"));

        for item in items {
            let file_name = item
                .video_path
                .file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(format!("Processing: {}", file_name));

            let layout = ItemLayout::for_item(
                input_dir,
                output_dir,
                item,
                pipeline.source_language(),
                pipeline.target_language(),
            );

            match pipeline.process_item(&layout, mode).await {
                Ok(report) if report.was_complete() => {
                    info!("Skipping {}, already at stage {}", file_name, report.final_stage);
                    summary.skipped += 1;
                    summary.reports.push(report);
                }
                Ok(report) => {
                    if report.capped_cues > 0 {
                        info!("{}: {} cue(s) overlap the next cue even at the maximum tempo", file_name, report.capped_cues);
                    }
                    summary.processed += 1;
                    summary.reports.push(report);
                }
                Err(e) => {
                    error!("Error processing file {}: {}", file_name, e);
                    summary.failed += 1;
                    summary.failures.push((item.video_path.clone(), e.to_string()));
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("Folder processing complete");

        let message = summary.message();
        info!("{}", message);
        self.write_issues_log(output_dir, &summary, start_time.elapsed());

        Ok(summary)
    }

    /// Append the run summary, every failure and every missing pairing to the issues log
    fn write_issues_log(&self, output_dir: &Path, summary: &RunSummary, duration: std::time::Duration) {
        let log_path = output_dir.join(ISSUES_LOG_FILE);
        let mut lines = vec![format!("{} - Duration: {:.1}s", summary.message(), duration.as_secs_f64())];
        lines.extend(
            summary
                .failures
                .iter()
                .map(|(video, message)| format!("FAILED {}: {}", video.display(), message)),
        );
        lines.extend(summary.pairing_issues.iter().map(|message| format!("SKIPPED {}", message)));

        for line in lines {
            if let Err(e) = FileManager::append_to_log_file(&log_path, &line) {
                warn!("Failed to write folder logs to file: {}", e);
                return;
            }
        }
        info!("Folder processing logs written to {:?}", log_path);
    }
}

/// True for files produced by previous runs: work folders and, when the
/// output lives inside the input, everything below the output folder
fn is_generated(path: &Path, input_dir: &Path, output_dir: &Path) -> bool {
    if output_dir != input_dir && path.starts_with(output_dir) {
        return true;
    }

    path.strip_prefix(input_dir)
        .unwrap_or(path)
        .parent()
        .map(|dir| {
            dir.components().any(|c| matches!(c, Component::Normal(name) if name.to_string_lossy().starts_with("tmp_")))
        })
        .unwrap_or(false)
}
