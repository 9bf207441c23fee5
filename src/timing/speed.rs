/*!
 * Tempo planning for synthesized clips.
 *
 * A clip should finish `pause_delay_ms` before the next cue starts. When it
 * does not, it is sped up in fixed increments until it fits or the tempo
 * cap is reached. Clips still too long at the cap are kept as they are:
 * overlapping speech is preferred to unintelligible speech.
 */

use log::debug;

use crate::app_config::SpeedPlanConfig;

/// Timing facts about one synthesized clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipTiming {
    /// Position of the cue in its timeline
    pub cue_index: usize,
    /// Cue start in ms
    pub start_ms: u64,
    /// Start of the next cue, None for the last cue of the timeline
    pub next_start_ms: Option<u64>,
    /// Probed duration of the synthesized audio
    pub actual_duration_ms: u64,
}

/// Tempo chosen for one clip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedDecision {
    pub cue_index: usize,
    /// Playback speed multiplier, 1.0 means untouched
    pub tempo_factor: f64,
}

impl SpeedDecision {
    pub fn unchanged(cue_index: usize) -> Self {
        Self {
            cue_index,
            tempo_factor: 1.0,
        }
    }

    /// True when the clip is played at its natural speed
    pub fn is_identity(&self) -> bool {
        (self.tempo_factor - 1.0).abs() < f64::EPSILON
    }
}

/// Decides per-clip tempo factors
#[derive(Debug, Clone)]
pub struct SpeedPlanner {
    config: SpeedPlanConfig,
}

impl Default for SpeedPlanner {
    fn default() -> Self {
        Self::new(SpeedPlanConfig::default())
    }
}

impl SpeedPlanner {
    pub fn new(config: SpeedPlanConfig) -> Self {
        Self { config }
    }

    /// Time available to the clip, None when unbounded (last cue)
    pub fn budget_ms(&self, clip: &ClipTiming) -> Option<i64> {
        clip.next_start_ms.map(|next_start| {
            next_start as i64 - clip.start_ms as i64 - self.config.pause_delay_ms as i64
        })
    }

    /// Tempo factor for a clip
    pub fn plan(&self, clip: &ClipTiming) -> SpeedDecision {
        let Some(budget_ms) = self.budget_ms(clip) else {
            return SpeedDecision::unchanged(clip.cue_index);
        };

        if fits(clip.actual_duration_ms, budget_ms, 100) {
            return SpeedDecision::unchanged(clip.cue_index);
        }

        let max_tempo = self.config.max_tempo.max(1.0);
        let step = self.config.tempo_step;
        // number of increments needed to reach the cap
        let max_steps = if step > 0.0 {
            ((max_tempo - 1.0) / step).ceil() as u32
        } else {
            0
        };

        let mut tempo_factor = max_tempo;
        for k in 0..=max_steps {
            let multiplier = round_to_hundredths(1.0 + f64::from(k) * step);
            if fits(clip.actual_duration_ms, budget_ms, hundredths(multiplier)) || multiplier >= max_tempo {
                tempo_factor = multiplier.min(max_tempo);
                break;
            }
        }

        if !fits(clip.actual_duration_ms, budget_ms, hundredths(tempo_factor)) {
            debug!(
                "Cue {} still overruns its {}ms budget at tempo {:.2} ({}ms clip)",
                clip.cue_index, budget_ms, tempo_factor, clip.actual_duration_ms
            );
        }

        SpeedDecision {
            cue_index: clip.cue_index,
            tempo_factor,
        }
    }

    /// True when the clip is still longer than its budget at the chosen tempo.
    /// Only happens at the tempo cap.
    pub fn still_overruns(&self, clip: &ClipTiming, decision: &SpeedDecision) -> bool {
        match self.budget_ms(clip) {
            Some(budget_ms) => !fits(clip.actual_duration_ms, budget_ms, hundredths(decision.tempo_factor)),
            None => false,
        }
    }
}

/// `actual / (tempo_hundredths / 100) < budget`, evaluated on integers
fn fits(actual_ms: u64, budget_ms: i64, tempo_hundredths: i64) -> bool {
    i128::from(actual_ms) * 100 < i128::from(budget_ms) * i128::from(tempo_hundredths)
}

fn hundredths(factor: f64) -> i64 {
    (factor * 100.0).round() as i64
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
