/*!
 * Timing and mix-plan engine.
 *
 * Pure functions over cue timelines that decide how the dub is placed:
 * - `shift`: estimates the constant offset between the dub and reference timelines
 * - `speed`: decides how much each synthesized clip must be sped up
 * - `mix`: turns per-cue delays and tempos into an ffmpeg filter graph
 *
 * None of these modules perform I/O; all parameters come from `TimingConfig`.
 */

pub mod shift;
pub mod speed;
pub mod mix;

pub use shift::{AlignmentResult, ShiftCandidate, ShiftEstimator};
pub use speed::{ClipTiming, SpeedDecision, SpeedPlanner};
pub use mix::{MixPlan, MixPlanBuilder, MixSegment, MIX_OUTPUT_LABEL};
