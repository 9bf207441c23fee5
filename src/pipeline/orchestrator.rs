use bytes::Bytes;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

use crate::app_config::Config;
use crate::errors::PipelineError;
use crate::file_utils::FileManager;
use crate::media_tools::{MediaTool, MixRequest, MuxRequest};
use crate::pipeline::stages::{ItemLayout, RunMode, Stage};
use crate::providers::{SpeechSynthesizer, SynthesizerRegistry};
use crate::subtitle_processor::CueTimeline;
use crate::timing::{
    AlignmentResult, ClipTiming, MixPlanBuilder, ShiftEstimator, SpeedDecision, SpeedPlanner,
};

// @module: Per-item dubbing state machine

/// Outcome of processing one media item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    // @field: Input video of the item
    pub video_path: PathBuf,
    // @field: Stage found on disk when processing started
    pub resumed_at: Stage,
    // @field: Stage reached when processing stopped
    pub final_stage: Stage,
    // @field: Clips synthesized by this run, existing clips excluded
    pub synthesized_clips: usize,
    // @field: Offset applied to the subtitles, None when shift correction was resumed past
    pub applied_offset_ms: Option<i64>,
    // @field: Cues still longer than their budget at the tempo cap
    pub capped_cues: usize,
}

impl ItemReport {
    fn new(video_path: PathBuf, resumed_at: Stage) -> Self {
        Self {
            video_path,
            resumed_at,
            final_stage: resumed_at,
            synthesized_clips: 0,
            applied_offset_ms: None,
            capped_cues: 0,
        }
    }

    /// True when nothing was left to do for the item
    pub fn was_complete(&self) -> bool {
        self.resumed_at == self.final_stage
    }
}

/// Drives media items from discovery to the muxed output
#[derive(Debug)]
pub struct DubPipeline {
    // @field: Voice of the target language
    synthesizer: Arc<dyn SpeechSynthesizer>,
    // @field: ffmpeg/ffprobe or a test double
    media: Arc<dyn MediaTool>,
    estimator: ShiftEstimator,
    planner: SpeedPlanner,
    mix_builder: MixPlanBuilder,
    source_language: String,
    target_language: String,
    // @field: Retries after the first failed synthesis attempt
    retry_count: u32,
    // @field: Where per-item progress bars are attached, hidden when None
    multi_progress: Option<MultiProgress>,
}

impl DubPipeline {
    /// Create a pipeline speaking the configured target language
    pub fn new(
        config: &Config,
        registry: &SynthesizerRegistry,
        media: Arc<dyn MediaTool>,
    ) -> Result<Self, PipelineError> {
        let synthesizer = registry.for_language(&config.target_language)?;

        Ok(Self {
            synthesizer,
            media,
            estimator: ShiftEstimator::new(config.timing.shift.clone()),
            planner: SpeedPlanner::new(config.timing.speed.clone()),
            mix_builder: MixPlanBuilder::new(config.timing.mix.clone()),
            source_language: config.source_language.clone(),
            target_language: config.target_language.clone(),
            retry_count: config.tts.retry_count,
            multi_progress: None,
        })
    }

    /// Attach per-item progress bars to a shared progress display
    pub fn with_progress(mut self, multi_progress: MultiProgress) -> Self {
        self.multi_progress = Some(multi_progress);
        self
    }

    pub fn source_language(&self) -> &str {
        &self.source_language
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Advance one item from its persisted stage to the stage the run mode asks for
    pub async fn process_item(&self, layout: &ItemLayout, mode: RunMode) -> Result<ItemReport, PipelineError> {
        let resumed_at = layout.resume_stage();
        let mut report = ItemReport::new(layout.video_path.clone(), resumed_at);

        if mode == RunMode::MuxOnly && resumed_at < Stage::PlanBuilt {
            return Err(PipelineError::MissingArtifact(layout.composite_audio.clone()));
        }

        let target = mode.target_stage();
        if resumed_at >= target {
            debug!("Nothing to do for {:?}, already {}", layout.video_path, resumed_at);
            return Ok(report);
        }

        info!("Processing {:?} from stage {}", layout.video_path, resumed_at);

        let mut timeline: Option<CueTimeline> = None;
        let mut stage = resumed_at;
        while stage < target {
            match stage {
                Stage::Discovered => {
                    let alignment = self.correct_shift(layout).await?;
                    report.applied_offset_ms = Some(alignment.applied_offset_ms);
                }
                Stage::ShiftCorrected => {
                    timeline = Some(CueTimeline::read_srt(&layout.corrected_subtitles)?);
                }
                Stage::Synthesizing => {
                    let cues = loaded(&timeline, layout)?;
                    report.synthesized_clips = self.synthesize_clips(layout, cues).await?;
                }
                Stage::DurationsProbed => {
                    let cues = loaded(&timeline, layout)?;
                    report.capped_cues = self.plan_and_mix(layout, cues).await?;
                }
                Stage::PlanBuilt => self.mux(layout).await?,
                Stage::Muxed => break,
            }

            stage = stage.next().unwrap_or(Stage::Muxed);
            report.final_stage = stage;
            debug!("{:?} reached stage {}", layout.video_path, stage);
        }

        Ok(report)
    }

    /// Align the translated subtitles to the reference track and persist them
    async fn correct_shift(&self, layout: &ItemLayout) -> Result<AlignmentResult, PipelineError> {
        tokio::fs::create_dir_all(&layout.tmp_dir).await?;

        let dub = CueTimeline::read_srt(&layout.subtitles_path)?;
        let alignment = match self.load_reference(layout).await {
            Some(reference) => self.estimator.estimate(&reference, &dub),
            None => AlignmentResult::inconclusive(),
        };

        let corrected = dub.shifted(alignment.applied_offset_ms);
        corrected.write_srt(&layout.corrected_subtitles)?;

        info!(
            "Subtitles shifted by {}ms ({} cues)",
            alignment.applied_offset_ms,
            corrected.len()
        );
        Ok(alignment)
    }

    /// Reference timeline, extracted from the video when not already present
    async fn load_reference(&self, layout: &ItemLayout) -> Option<CueTimeline> {
        if !FileManager::file_exists(&layout.reference_subtitles) {
            if let Err(e) = self
                .media
                .extract_subtitles(&layout.video_path, &self.source_language, &layout.reference_subtitles)
                .await
            {
                warn!("No '{}' reference subtitles in {:?}: {}", self.source_language, layout.video_path, e);
                return None;
            }
        }

        match CueTimeline::read_srt(&layout.reference_subtitles) {
            Ok(reference) => Some(reference),
            Err(e) => {
                warn!("Unusable reference subtitles {:?}: {}", layout.reference_subtitles, e);
                None
            }
        }
    }

    /// Synthesize every cue that has no clip yet, in cue order
    async fn synthesize_clips(&self, layout: &ItemLayout, timeline: &CueTimeline) -> Result<usize, PipelineError> {
        let progress_bar = self.progress_bar(timeline.len() as u64);
        progress_bar.set_message("Synthesizing");

        let result = self.synthesize_missing(layout, timeline, &progress_bar).await;
        progress_bar.finish_and_clear();

        let synthesized = result?;
        info!("Synthesized {} of {} clips", synthesized, timeline.len());
        Ok(synthesized)
    }

    async fn synthesize_missing(
        &self,
        layout: &ItemLayout,
        timeline: &CueTimeline,
        progress_bar: &ProgressBar,
    ) -> Result<usize, PipelineError> {
        let mut synthesized = 0;

        for (cue_index, cue) in timeline.iter().enumerate() {
            let clip_path = layout.clip_path(cue);
            if FileManager::file_exists(&clip_path) {
                debug!("Clip for cue {} already exists", cue_index);
            } else {
                let audio = self.synthesize_with_retry(cue_index, &cue.text).await?;
                FileManager::write_atomic(&clip_path, &audio)?;
                synthesized += 1;
            }
            progress_bar.inc(1);
        }

        Ok(synthesized)
    }

    /// One attempt plus `retry_count` retries, without backoff
    async fn synthesize_with_retry(&self, cue_index: usize, text: &str) -> Result<Bytes, PipelineError> {
        let mut attempt: u32 = 1;
        loop {
            match self.synthesizer.synthesize(text).await {
                Ok(audio) => return Ok(audio),
                Err(e) if attempt > self.retry_count => {
                    return Err(PipelineError::SynthesisExhausted {
                        cue_index,
                        attempts: attempt,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!("Synthesis of cue {} failed (attempt {}): {}", cue_index, attempt, e);
                    attempt += 1;
                }
            }
        }
    }

    /// Probe clips, decide tempos, build the mix plan and render the composite audio.
    /// Returns the number of cues that overrun their budget even at the tempo cap.
    async fn plan_and_mix(&self, layout: &ItemLayout, timeline: &CueTimeline) -> Result<usize, PipelineError> {
        let mut clips = Vec::with_capacity(timeline.len());
        let mut decisions: Vec<SpeedDecision> = Vec::with_capacity(timeline.len());
        let mut capped_cues = 0;

        for (cue_index, cue) in timeline.iter().enumerate() {
            let clip_path = layout.clip_path(cue);
            let actual_duration_ms = self.media.probe_duration_ms(&clip_path).await?;

            let timing = ClipTiming {
                cue_index,
                start_ms: cue.start_ms,
                next_start_ms: timeline.next_start_ms(cue_index),
                actual_duration_ms,
            };
            let decision = self.planner.plan(&timing);
            if self.planner.still_overruns(&timing, &decision) {
                capped_cues += 1;
            }
            decisions.push(decision);
            clips.push(clip_path);
        }

        if capped_cues > 0 {
            debug!("{} cue(s) overrun their budget at the tempo cap", capped_cues);
        }

        let plan = self.mix_builder.build(timeline, &decisions)?;
        self.media
            .mix_audio(&MixRequest {
                video: &layout.video_path,
                clips: &clips,
                plan: &plan,
                source_language: &self.source_language,
                output: &layout.composite_audio,
            })
            .await?;

        info!("Composite audio written to {:?}", layout.composite_audio);
        Ok(capped_cues)
    }

    /// Combine video, composite audio and corrected subtitles
    async fn mux(&self, layout: &ItemLayout) -> Result<(), PipelineError> {
        for required in [&layout.composite_audio, &layout.corrected_subtitles] {
            if !FileManager::file_exists(required) {
                return Err(PipelineError::MissingArtifact(required.clone()));
            }
        }

        tokio::fs::create_dir_all(&layout.root).await?;
        self.media
            .mux(&MuxRequest {
                video: &layout.video_path,
                audio: &layout.composite_audio,
                subtitles: &layout.corrected_subtitles,
                language: &self.target_language,
                output: &layout.final_output,
            })
            .await?;

        info!("Dubbed video written to {:?}", layout.final_output);
        Ok(())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        let Some(multi_progress) = &self.multi_progress else {
            return ProgressBar::hidden();
        };

        let progress_bar = multi_progress.add(ProgressBar::new(len));
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cues ({percent}%) {msg} {eta}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}

fn loaded<'a>(timeline: &'a Option<CueTimeline>, layout: &ItemLayout) -> Result<&'a CueTimeline, PipelineError> {
    timeline
        .as_ref()
        .ok_or_else(|| PipelineError::MissingArtifact(layout.corrected_subtitles.clone()))
}
