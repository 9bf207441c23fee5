/*!
 * Dubbing pipeline.
 *
 * Each media item moves through
 * `Discovered → ShiftCorrected → Synthesizing → DurationsProbed → PlanBuilt → Muxed`.
 * The stage to resume from is read back from the artifacts on disk, so an
 * interrupted run picks up where it stopped and a finished item costs nothing.
 *
 * - `stages`: stage enum, run modes and the artifact layout
 * - `orchestrator`: the state machine driving one item
 */

pub mod orchestrator;
pub mod stages;

pub use orchestrator::{DubPipeline, ItemReport};
pub use stages::{ItemLayout, RunMode, Stage};
