use std::fmt;
use std::path::{Path, PathBuf};

use crate::file_utils::{FileManager, MediaItem};
use crate::subtitle_processor::Cue;

// @module: Item stages and the on-disk artifact layout

/// Processing stage of one media item, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Discovered,
    ShiftCorrected,
    Synthesizing,
    DurationsProbed,
    PlanBuilt,
    Muxed,
}

impl Stage {
    /// The stage that follows this one, None once muxed
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Discovered => Some(Stage::ShiftCorrected),
            Stage::ShiftCorrected => Some(Stage::Synthesizing),
            Stage::Synthesizing => Some(Stage::DurationsProbed),
            Stage::DurationsProbed => Some(Stage::PlanBuilt),
            Stage::PlanBuilt => Some(Stage::Muxed),
            Stage::Muxed => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovered => "discovered",
            Stage::ShiftCorrected => "shift-corrected",
            Stage::Synthesizing => "synthesizing",
            Stage::DurationsProbed => "durations-probed",
            Stage::PlanBuilt => "plan-built",
            Stage::Muxed => "muxed",
        };
        write!(f, "{}", name)
    }
}

/// How far a run takes each item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// All the way to the muxed container
    #[default]
    Full,
    /// Stop once the composite audio track exists
    AudioOnly,
    /// Only mux, the composite audio must already exist
    MuxOnly,
}

impl RunMode {
    pub fn target_stage(self) -> Stage {
        match self {
            RunMode::Full | RunMode::MuxOnly => Stage::Muxed,
            RunMode::AudioOnly => Stage::PlanBuilt,
        }
    }
}

/// Where every artifact of one media item lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemLayout {
    // @field: Input video
    pub video_path: PathBuf,
    // @field: Input translated subtitles, never modified
    pub subtitles_path: PathBuf,
    // @field: Output folder of the item
    pub root: PathBuf,
    // @field: Work folder for intermediate artifacts
    pub tmp_dir: PathBuf,
    // @field: Subtitles extracted from the video
    pub reference_subtitles: PathBuf,
    // @field: Translated subtitles after shift correction
    pub corrected_subtitles: PathBuf,
    // @field: Mixed audio track
    pub composite_audio: PathBuf,
    // @field: Muxed container
    pub final_output: PathBuf,
}

impl ItemLayout {
    /// Layout of an item, mirroring its input subfolder under `output_root`
    pub fn for_item(
        input_root: &Path,
        output_root: &Path,
        item: &MediaItem,
        source_language: &str,
        target_language: &str,
    ) -> Self {
        let relative_dir = item
            .subtitles_path
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root).ok())
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let root = output_root.join(relative_dir);

        let video_stem = item
            .video_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let tmp_dir = root.join(format!("tmp_{}", video_stem));

        let video_name = item
            .video_path
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_default();

        Self {
            video_path: item.video_path.clone(),
            subtitles_path: item.subtitles_path.clone(),
            reference_subtitles: tmp_dir.join(format!("original_subtitle_{}.srt", source_language)),
            corrected_subtitles: tmp_dir.join(format!("subtitles_{}.srt", target_language)),
            composite_audio: tmp_dir.join("audio-tts.mp3"),
            final_output: root.join(video_name),
            tmp_dir,
            root,
        }
    }

    /// Synthesized clip of a cue, named after its time window
    pub fn clip_path(&self, cue: &Cue) -> PathBuf {
        self.tmp_dir.join(format!("{}.wav", cue.window_name()))
    }

    /// Stage to resume from, judged by the latest artifact present
    pub fn resume_stage(&self) -> Stage {
        if FileManager::file_exists(&self.final_output) {
            Stage::Muxed
        } else if FileManager::file_exists(&self.composite_audio) {
            Stage::PlanBuilt
        } else if FileManager::file_exists(&self.corrected_subtitles) {
            Stage::ShiftCorrected
        } else {
            Stage::Discovered
        }
    }
}
