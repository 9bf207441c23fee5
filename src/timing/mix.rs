/*!
 * Mix plan: how the attenuated original audio and the dub clips are summed.
 *
 * Every clip is delayed to its cue start and optionally sped up. The plan is
 * rendered into an ffmpeg `filter_complex` graph where input 0 is the video
 * and input `i + 1` is the clip of cue `i`.
 */

use std::fmt::Write as _;

use crate::app_config::MixConfig;
use crate::errors::TimingError;
use crate::subtitle_processor::CueTimeline;
use crate::timing::speed::SpeedDecision;

/// Label of the mixed stream, consumed by `-map [mixout]`
pub const MIX_OUTPUT_LABEL: &str = "mixout";

const ORIGINAL_LABEL: &str = "original";

/// Placement of one dub clip in the mix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixSegment {
    pub cue_index: usize,
    /// Delay from the start of the composite track
    pub delay_ms: u64,
    /// Tempo stage, None when the clip plays at natural speed
    pub tempo_factor: Option<f64>,
}

/// Complete mixing specification for one media item
#[derive(Debug, Clone, PartialEq)]
pub struct MixPlan {
    pub segments: Vec<MixSegment>,
    pub original_attenuation: f64,
    pub normalize: bool,
}

impl MixPlan {
    /// Number of inputs summed by the final mix stage (original + clips)
    pub fn mix_inputs(&self) -> usize {
        self.segments.len() + 1
    }

    /// Render the ffmpeg filter graph.
    ///
    /// `original_stream` selects the original audio of input 0,
    /// e.g. `0:m:language:eng`.
    pub fn render_filter_graph(&self, original_stream: &str) -> String {
        let mut graph = format!(
            "[{}]volume={}[{}];",
            original_stream, self.original_attenuation, ORIGINAL_LABEL
        );

        for (i, segment) in self.segments.iter().enumerate() {
            let input = i + 1;
            let _ = write!(graph, "[{}]", input);
            if let Some(tempo) = segment.tempo_factor {
                let _ = write!(graph, "atempo={:.2},", tempo);
            }
            let _ = write!(graph, "adelay=delays={}:all=1[s{}];", segment.delay_ms, input);
        }

        for i in 0..self.segments.len() {
            let _ = write!(graph, "[s{}]", i + 1);
        }

        let _ = write!(
            graph,
            "[{}]amix=normalize={}:inputs={}[{}]",
            ORIGINAL_LABEL,
            self.normalize,
            self.mix_inputs(),
            MIX_OUTPUT_LABEL
        );

        graph
    }
}

/// Combines cue timings and speed decisions into a mix plan
#[derive(Debug, Clone)]
pub struct MixPlanBuilder {
    config: MixConfig,
}

impl Default for MixPlanBuilder {
    fn default() -> Self {
        Self::new(MixConfig::default())
    }
}

impl MixPlanBuilder {
    pub fn new(config: MixConfig) -> Self {
        Self { config }
    }

    /// One segment per cue in cue order, delayed by the cue start
    pub fn build(&self, cues: &CueTimeline, decisions: &[SpeedDecision]) -> Result<MixPlan, TimingError> {
        let segments = cues
            .iter()
            .enumerate()
            .map(|(cue_index, cue)| {
                let decision = decisions
                    .iter()
                    .find(|d| d.cue_index == cue_index)
                    .ok_or(TimingError::MissingDecision(cue_index))?;

                Ok(MixSegment {
                    cue_index,
                    delay_ms: cue.start_ms,
                    tempo_factor: (!decision.is_identity()).then_some(decision.tempo_factor),
                })
            })
            .collect::<Result<Vec<_>, TimingError>>()?;

        Ok(MixPlan {
            segments,
            original_attenuation: self.config.original_attenuation,
            normalize: self.config.normalize,
        })
    }
}
