/*!
 * Shift estimation between a dub timeline and a reference timeline.
 *
 * Translated subtitles are often authored against a different cut or
 * encode than the video, which shows up as a constant offset. The
 * estimator tries every offset of a discrete grid and keeps the one that
 * lines up the most cue starts.
 */

use log::{debug, info, trace};

use crate::app_config::ShiftSearchConfig;
use crate::subtitle_processor::CueTimeline;

/// One evaluated offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCandidate {
    /// Offset added to every dub cue start
    pub offset_ms: i64,
    /// Number of dub cues that land next to a reference cue
    pub hit_count: usize,
}

/// Outcome of a shift estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentResult {
    /// Offset to apply to the dub timeline; zero when nothing qualified
    pub applied_offset_ms: i64,
    /// The winning candidate, None when the estimation was inconclusive
    pub best: Option<ShiftCandidate>,
}

impl AlignmentResult {
    /// No candidate cleared the hit threshold
    pub fn inconclusive() -> Self {
        Self {
            applied_offset_ms: 0,
            best: None,
        }
    }

    pub fn is_inconclusive(&self) -> bool {
        self.best.is_none()
    }
}

/// Grid search for the offset aligning two timelines
#[derive(Debug, Clone)]
pub struct ShiftEstimator {
    config: ShiftSearchConfig,
}

impl Default for ShiftEstimator {
    fn default() -> Self {
        Self::new(ShiftSearchConfig::default())
    }
}

impl ShiftEstimator {
    pub fn new(config: ShiftSearchConfig) -> Self {
        Self { config }
    }

    /// Candidate offsets in ascending order, both grid ends included
    pub fn candidates(&self) -> impl Iterator<Item = i64> + '_ {
        let step = self.config.step_ms.max(1) as usize;
        (self.config.min_offset_ms..=self.config.max_offset_ms).step_by(step)
    }

    /// Count dub cues whose shifted start lies strictly within the match window
    /// of at least one reference cue start.
    pub fn hit_count(&self, reference: &CueTimeline, dub: &CueTimeline, offset_ms: i64) -> usize {
        let window = self.config.match_window_ms;
        let reference_starts: Vec<i64> = reference.iter().map(|cue| cue.start_ms as i64).collect();

        dub.iter()
            .filter(|cue| {
                let shifted = cue.start_ms as i64 + offset_ms;
                // reference starts are sorted: find the first one past the lower bound
                let first = reference_starts.partition_point(|&start| start <= shifted - window);
                reference_starts
                    .get(first)
                    .is_some_and(|&start| start < shifted + window)
            })
            .count()
    }

    /// Find the best offset.
    ///
    /// Candidates are scanned from the lowest offset upwards and a candidate
    /// only replaces the current best when it has strictly more hits, so ties
    /// resolve to the lowest offset. A candidate must also match more than
    /// `min_hit_ratio` of the dub cues to be trusted.
    pub fn estimate(&self, reference: &CueTimeline, dub: &CueTimeline) -> AlignmentResult {
        let threshold = self.config.min_hit_ratio * dub.len() as f64;
        let mut best: Option<ShiftCandidate> = None;

        for offset_ms in self.candidates() {
            let hit_count = self.hit_count(reference, dub, offset_ms);
            trace!("At shift {} it's {} of {}", offset_ms, hit_count, dub.len());

            let best_hits = best.map_or(0, |b| b.hit_count);
            if hit_count > best_hits && hit_count as f64 > threshold {
                best = Some(ShiftCandidate { offset_ms, hit_count });
            }
        }

        match best {
            Some(candidate) => {
                debug!(
                    "Best shift is {}ms ({} of {} cues matched)",
                    candidate.offset_ms, candidate.hit_count, dub.len()
                );
                AlignmentResult {
                    applied_offset_ms: candidate.offset_ms,
                    best: Some(candidate),
                }
            }
            None => {
                info!("No shift matched enough cues, leaving subtitle shift at 0");
                AlignmentResult::inconclusive()
            }
        }
    }
}
