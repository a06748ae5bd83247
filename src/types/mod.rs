//! Core types for FormFit

mod angles;
mod evaluation;
mod exercise;
mod landmark;
mod output;
mod state;

pub use angles::{display_name, keys, AngleSet};
pub use evaluation::{EvaluationResult, PhaseScore};
pub use exercise::{
    AngleRange, Comparison, ExerciseDefinition, ExerciseSummary, MistakeRule, PhaseDefinition,
    RepCounterSpec,
};
pub use landmark::{index, Landmark, LandmarkFrame, TimedFrame};
pub use output::{EngineEvent, FeedbackRecord, FrameOutcome, SessionSummary};
pub use state::{FormStatus, RepPhase};
